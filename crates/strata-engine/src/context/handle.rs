use std::fmt;
use std::num::{NonZeroU32, NonZeroUsize};

use raw_window_handle::RawWindowHandle;

use crate::id::ObjectId;

/// Identifier of a render context (one per window or offscreen target).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ContextId(NonZeroU32);

impl ContextId {
    #[inline]
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl From<ObjectId> for ContextId {
    fn from(id: ObjectId) -> Self {
        Self(id.non_zero())
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque backend context handle (HGLRC, GLXContext, ...).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct NativeContext(NonZeroUsize);

impl NativeContext {
    #[inline]
    pub const fn from_raw(raw: usize) -> Option<Self> {
        match NonZeroUsize::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[inline]
    pub const fn raw(self) -> usize {
        self.0.get()
    }
}

/// Opaque per-window drawing surface handle (HDC, X11 drawable, ...).
///
/// Stable for the surface's lifetime; never zero.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SurfaceHandle(NonZeroUsize);

impl SurfaceHandle {
    #[inline]
    pub const fn from_raw(raw: usize) -> Option<Self> {
        match NonZeroUsize::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Extracts the native window handle from a `raw-window-handle` value.
    ///
    /// Returns `None` for platforms without a pointer-sized window handle.
    pub fn from_window_handle(handle: RawWindowHandle) -> Option<Self> {
        let raw = match handle {
            RawWindowHandle::Win32(h) => h.hwnd.get() as usize,
            RawWindowHandle::Xlib(h) => h.window as usize,
            RawWindowHandle::Xcb(h) => h.window.get() as usize,
            RawWindowHandle::Wayland(h) => h.surface.as_ptr() as usize,
            RawWindowHandle::AppKit(h) => h.ns_view.as_ptr() as usize,
            _ => return None,
        };
        Self::from_raw(raw)
    }

    #[inline]
    pub const fn raw(self) -> usize {
        self.0.get()
    }
}

/// Swap interval policy for a context.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum VSyncMode {
    /// Presentation waits for the display refresh.
    #[default]
    On,
    /// Presentation is immediate; tearing is possible.
    Off,
}

impl VSyncMode {
    /// Swap interval passed to the backend.
    #[inline]
    pub fn interval(self) -> i32 {
        match self {
            VSyncMode::On => 1,
            VSyncMode::Off => 0,
        }
    }
}

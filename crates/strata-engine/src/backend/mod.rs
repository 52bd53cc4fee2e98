//! Graphics backend seam.
//!
//! The runtime never talks to a concrete API. It needs:
//! - stable non-zero handles for programs, buffers and textures
//! - a queryable/settable "current context"
//! - a drainable error queue
//!
//! [`HeadlessBackend`] implements the contract in memory for tests, tools and
//! CI hosts without a display.

mod error_code;
mod headless;

use std::fmt;
use std::num::NonZeroU32;

use crate::context::{NativeContext, SurfaceHandle};
use crate::coords::Rect;
use crate::graphics::{ShaderStage, TextureFormat};

pub use error_code::{describe_errors, drain_errors, ErrorCode};
pub use headless::{DrawRecord, HeadlessBackend};

/// Backend object name (program, shader stage, buffer, vertex array, texture).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct GpuHandle(NonZeroU32);

impl GpuHandle {
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

impl fmt::Display for GpuHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vertex array + vertex buffer + index buffer of one mesh.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MeshHandles {
    pub vao: GpuHandle,
    pub vbo: GpuHandle,
    pub ebo: GpuHandle,
}

/// Single float attribute inside an interleaved vertex.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    pub location: u32,
    /// Number of `f32` components.
    pub components: u32,
    /// Byte offset inside the vertex.
    pub offset: u32,
}

/// Interleaved vertex layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: &'static [VertexAttribute],
}

/// Texture allocation parameters.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureDesc {
    /// Expected length of the pixel slice passed to `create_texture`.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Uniform value pushed to a program.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Uniform {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(glam::Vec2),
    Vec3(glam::Vec3),
    Vec4(glam::Vec4),
    Mat2(glam::Mat2),
    Mat3(glam::Mat3),
    Mat4(glam::Mat4),
}

/// Opaque call surface of a stateful, context-bound graphics API.
///
/// Fallible creation calls return the backend's own message; callers wrap it
/// in a [`CoreError`](crate::error::CoreError). Deleting an unknown handle is
/// not a panic: backends report it through [`poll_error`](Self::poll_error).
pub trait GraphicsBackend {
    /// Resolves mandatory function pointers. `Err` names the first missing one.
    fn load_entry_points(&mut self) -> Result<(), String>;

    // ── contexts ──────────────────────────────────────────────────────────

    fn current_context(&self) -> Option<NativeContext>;
    fn make_current(&mut self, surface: SurfaceHandle, context: NativeContext) -> bool;
    fn swap_buffers(&mut self, surface: SurfaceHandle);
    fn supports_swap_interval(&self) -> bool;
    fn set_swap_interval(&mut self, interval: i32);

    // ── programs ──────────────────────────────────────────────────────────

    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<GpuHandle, String>;
    fn delete_stage(&mut self, stage: GpuHandle);
    fn link_program(&mut self, stages: &[GpuHandle]) -> Result<GpuHandle, String>;
    fn delete_program(&mut self, program: GpuHandle);
    fn use_program(&mut self, program: GpuHandle);
    fn set_uniform(&mut self, program: GpuHandle, name: &str, value: Uniform);

    // ── textures ──────────────────────────────────────────────────────────

    fn create_texture(&mut self, desc: TextureDesc, pixels: &[u8]) -> Result<GpuHandle, String>;
    fn delete_texture(&mut self, texture: GpuHandle);
    fn bind_texture(&mut self, unit: u32, texture: Option<GpuHandle>);

    // ── geometry ──────────────────────────────────────────────────────────

    fn create_mesh(
        &mut self,
        layout: &VertexLayout,
        vertices: &[u8],
        indices: &[u32],
    ) -> Result<MeshHandles, String>;
    fn delete_mesh(&mut self, mesh: MeshHandles);
    fn draw_indexed(&mut self, mesh: MeshHandles, index_count: u32);

    // ── fixed-function state ──────────────────────────────────────────────

    fn set_blend(&mut self, enabled: bool);
    fn set_depth_write(&mut self, enabled: bool);
    /// Restricts drawing to `rect` (logical pixels). `None` disables scissoring.
    fn set_scissor(&mut self, rect: Option<Rect>);

    // ── diagnostics ───────────────────────────────────────────────────────

    /// Pops one pending error flag.
    fn poll_error(&mut self) -> Option<ErrorCode>;
}

use std::fmt;

use crate::backend::{GpuHandle, GraphicsBackend, TextureDesc};
use crate::context::ContextId;
use crate::coords::Vec2;
use crate::error::{CoreError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureFormat {
    /// Single channel, sampled as coverage (glyph bitmaps).
    R8,
    Rgb8,
    Rgba8,
    Rgba16F,
    Rgba32F,
    Srgb8A8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::Rgb8 => 3,
            TextureFormat::Rgba8 | TextureFormat::Srgb8A8 => 4,
            TextureFormat::Rgba16F => 8,
            TextureFormat::Rgba32F => 16,
        }
    }

    /// Whether sampling can produce partially transparent texels.
    pub fn has_alpha(self) -> bool {
        !matches!(self, TextureFormat::Rgb8)
    }

    /// Byte offset and stride of an 8-bit alpha channel, if there is one.
    fn alpha_channel(self) -> Option<(usize, usize)> {
        match self {
            TextureFormat::R8 => Some((0, 1)),
            TextureFormat::Rgba8 | TextureFormat::Srgb8A8 => Some((3, 4)),
            _ => None,
        }
    }
}

/// Borrowed pixel upload.
#[derive(Debug, Copy, Clone)]
pub struct TextureData<'a> {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Tightly packed rows, top row first.
    pub pixels: &'a [u8],
}

impl TextureData<'_> {
    pub fn desc(&self) -> TextureDesc {
        TextureDesc {
            width: self.width,
            height: self.height,
            format: self.format,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::InvalidTexture(format!(
                "size {}x{} has no pixels",
                self.width, self.height
            )));
        }
        let expected = self.desc().byte_len();
        if self.pixels.len() != expected {
            return Err(CoreError::InvalidTexture(format!(
                "{}x{} {:?} needs {expected} bytes, got {}",
                self.width,
                self.height,
                self.format,
                self.pixels.len()
            )));
        }
        Ok(())
    }
}

/// CPU copy of a texture's alpha channel, used for per-pixel hit testing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl AlphaMask {
    /// Extracts the alpha channel. `None` for formats without 8-bit alpha.
    pub fn from_data(data: &TextureData<'_>) -> Option<Self> {
        let (offset, stride) = data.format.alpha_channel()?;
        let alpha = data
            .pixels
            .iter()
            .skip(offset)
            .step_by(stride)
            .copied()
            .collect();
        Some(Self {
            width: data.width,
            height: data.height,
            alpha,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.alpha.get((y * self.width + x) as usize).copied()
    }

    /// Samples at normalized coordinates (`0..1`, top-left origin).
    pub fn sample(&self, uv: Vec2) -> Option<u8> {
        if !(0.0..1.0).contains(&uv.x) || !(0.0..1.0).contains(&uv.y) {
            return None;
        }
        let x = (uv.x * self.width as f32) as u32;
        let y = (uv.y * self.height as f32) as u32;
        self.alpha_at(x.min(self.width - 1), y.min(self.height - 1))
    }
}

/// Backend texture plus its description.
pub struct Texture {
    name: String,
    context: ContextId,
    handle: Option<GpuHandle>,
    desc: TextureDesc,
    alpha: Option<AlphaMask>,
}

impl Texture {
    pub(crate) fn new(
        name: String,
        context: ContextId,
        handle: GpuHandle,
        desc: TextureDesc,
        alpha: Option<AlphaMask>,
    ) -> Self {
        Self {
            name,
            context,
            handle: Some(handle),
            desc,
            alpha,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn handle(&self) -> Option<GpuHandle> {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn format(&self) -> TextureFormat {
        self.desc.format
    }

    pub fn has_alpha(&self) -> bool {
        self.desc.format.has_alpha()
    }

    pub fn alpha_mask(&self) -> Option<&AlphaMask> {
        self.alpha.as_ref()
    }

    pub(crate) fn release<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(handle) = self.handle.take() {
            backend.delete_texture(handle);
        }
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("handle", &self.handle)
            .field("desc", &self.desc)
            .finish()
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::error!(
                target: "texture",
                "texture '{}' dropped while still owning handle {handle}; remove it through Graphics",
                self.name
            );
        }
    }
}

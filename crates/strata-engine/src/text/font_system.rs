use std::fmt;

use crate::backend::GraphicsBackend;
use crate::coords::Vec2;
use crate::error::{CoreError, Result};
use crate::graphics::Graphics;
use crate::id::{validate_name, ObjectId};
use crate::registry::Registry;

use super::glyph::{Glyph, GlyphSource};

/// Parsed font rasterized at a fixed pixel size.
pub struct Font {
    name: String,
    px: f32,
    inner: fontdue::Font,
}

impl Font {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn px(&self) -> f32 {
        self.px
    }

    pub fn glyph_count(&self) -> u32 {
        u32::from(self.inner.glyph_count())
    }

    /// Glyph index for `ch`. Zero is the font's "missing glyph".
    pub fn glyph_index(&self, ch: char) -> u32 {
        u32::from(self.inner.lookup_glyph_index(ch))
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("name", &self.name)
            .field("px", &self.px)
            .field("glyphs", &self.inner.glyph_count())
            .finish()
    }
}

/// Owns loaded fonts.
///
/// Fonts are immutable after loading and are identified by ids from the
/// shared [`Graphics`] counter, so a font id never collides with a widget or
/// texture id.
#[derive(Debug)]
pub struct FontSystem {
    fonts: Registry<Font>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self {
            fonts: Registry::new("font"),
        }
    }

    /// Parses a TrueType or OpenType font for rasterizing at `px` pixels.
    pub fn load_font<B: GraphicsBackend>(
        &mut self,
        gfx: &mut Graphics<B>,
        name: &str,
        bytes: &[u8],
        px: f32,
    ) -> Result<ObjectId> {
        validate_name(name)?;
        if !(px.is_finite() && px > 0.0) {
            log::error!(target: "font", "cannot load '{name}' at invalid size {px}");
            return Err(CoreError::FontLoad(format!("invalid pixel size {px}")));
        }

        let inner = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| {
                log::error!(target: "font", "cannot parse '{name}': {e}");
                CoreError::FontLoad(e.to_owned())
            })?;

        let id = gfx.next_id()?;
        self.fonts.add(
            id,
            Font {
                name: name.to_owned(),
                px,
                inner,
            },
        )?;
        log::debug!(target: "font", "loaded font '{name}' ({id}) at {px}px");
        Ok(id)
    }

    pub fn font(&self, id: ObjectId) -> Option<&Font> {
        self.fonts.get(id)
    }

    pub fn remove_font(&mut self, id: ObjectId) -> Result<()> {
        self.fonts.remove(id)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphSource for FontSystem {
    fn has_font(&self, font: ObjectId) -> bool {
        self.fonts.contains(font)
    }

    fn glyph(&self, font: ObjectId, index: u32) -> Result<Glyph> {
        let f = self.fonts.lookup(font)?;
        let glyph_index = u16::try_from(index)
            .ok()
            .filter(|&i| i < f.inner.glyph_count())
            .ok_or_else(|| {
                log::error!(target: "font", "glyph {index} is out of range for '{}'", f.name);
                CoreError::GlyphOutOfRange { font, index }
            })?;

        let (metrics, mut pixels) = f.inner.rasterize_indexed(glyph_index, f.px);
        let (mut width, mut height) = (metrics.width as u32, metrics.height as u32);
        // Blank glyphs (space) still need an uploadable texel.
        if width == 0 || height == 0 {
            width = 1;
            height = 1;
            pixels = vec![0];
        }

        let left = metrics.xmin as f32;
        let right = left + metrics.width as f32;
        let bottom = -(metrics.ymin as f32);
        let top = bottom - metrics.height as f32;

        Ok(Glyph {
            width,
            height,
            pixels,
            vertices: [
                Vec2::new(left, top),
                Vec2::new(right, top),
                Vec2::new(right, bottom),
                Vec2::new(left, bottom),
            ],
            uvs: [
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            advance: metrics.advance_width,
        })
    }
}

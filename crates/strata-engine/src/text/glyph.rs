use crate::coords::Vec2;
use crate::error::Result;
use crate::graphics::QUAD_INDICES;
use crate::id::ObjectId;

/// One rasterized glyph, ready to upload as an R8 texture on a quad.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub width: u32,
    pub height: u32,
    /// Coverage bytes, `width * height`, top row first.
    pub pixels: Vec<u8>,
    /// Quad corners relative to the pen position on the baseline, y down.
    /// Order: TL, TR, BR, BL.
    pub vertices: [Vec2; 4],
    /// Texture coordinates matching `vertices`.
    pub uvs: [Vec2; 4],
    /// Horizontal pen advance in pixels.
    pub advance: f32,
}

impl Glyph {
    /// Center of the quad relative to the pen position.
    pub fn center(&self) -> Vec2 {
        (self.vertices[0] + self.vertices[2]) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.vertices[2] - self.vertices[0]
    }
}

/// Read-only source of glyph bitmaps keyed by font id and glyph index.
pub trait GlyphSource {
    fn has_font(&self, font: ObjectId) -> bool;

    fn glyph(&self, font: ObjectId, index: u32) -> Result<Glyph>;

    /// Triangle indices over the four glyph vertices.
    fn quad_indices(&self) -> [u32; 6] {
        QUAD_INDICES
    }
}

//! Glyph provider seam and the fontdue-backed font system.

mod font_system;
mod glyph;

pub use font_system::{Font, FontSystem};
pub use glyph::{Glyph, GlyphSource};

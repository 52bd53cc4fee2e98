//! Coordinate and geometry types.
//!
//! Canonical 2D space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! [`Viewport::projection`] maps this space to clip space.

mod color;
mod rect;
mod vec2;
mod viewport;

pub use color::Rgb;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;

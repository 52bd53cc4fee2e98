use glam::Mat4;

use super::Vec2;

/// Drawable area in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    pub fn size(self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(self) -> Vec2 {
        self.size() * 0.5
    }

    /// Orthographic projection from logical pixels (top-left origin, y down)
    /// to clip space.
    pub fn projection(self) -> Mat4 {
        Mat4::orthographic_rh_gl(0.0, self.width, self.height, 0.0, -1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn projection_maps_corners_to_clip_space() {
        let p = Viewport::new(800.0, 600.0).projection();
        let tl = p.transform_point3(Vec3::new(0.0, 0.0, 0.0));
        let br = p.transform_point3(Vec3::new(800.0, 600.0, 0.0));
        assert!((tl.truncate() - glam::Vec2::new(-1.0, 1.0)).length() < 1e-5);
        assert!((br.truncate() - glam::Vec2::new(1.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn validity() {
        assert!(Viewport::new(1.0, 1.0).is_valid());
        assert!(!Viewport::new(0.0, 1.0).is_valid());
        assert!(!Viewport::new(f32::INFINITY, 1.0).is_valid());
    }
}

use glam::{Mat4, Quat, Vec3};

use strata_engine::coords::{Rect, Vec2};

/// Position, rotation (degrees, clockwise on screen) and size.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TransformPart {
    /// Center in logical pixels.
    pub position: Vec2,
    pub rotation: f32,
    pub size: Vec2,
}

impl TransformPart {
    pub const IDENTITY: TransformPart = TransformPart {
        position: Vec2::zero(),
        rotation: 0.0,
        size: Vec2::zero(),
    };

    pub const fn new(position: Vec2, rotation: f32, size: Vec2) -> Self {
        Self { position, rotation, size }
    }

    /// Component-wise sum.
    pub fn offset_by(self, other: TransformPart) -> Self {
        Self {
            position: self.position + other.position,
            rotation: self.rotation + other.rotation,
            size: self.size + other.size,
        }
    }

    /// Places `child` (expressed relative to `self`) in `self`'s space.
    ///
    /// The child's offset turns with the parent's rotation; size is not
    /// inherited.
    pub fn compose(self, child: TransformPart) -> Self {
        Self {
            position: self.position + child.position.rotated(self.rotation),
            rotation: self.rotation + child.rotation,
            size: child.size,
        }
    }

    /// Unit quad to logical pixels: scale, rotate, translate.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::new(self.size.x, self.size.y, 1.0),
            Quat::from_rotation_z(self.rotation.to_radians()),
            Vec3::new(self.position.x, self.position.y, 0.0),
        )
    }

    /// Corners of the rotated box: TL, TR, BR, BL.
    pub fn corners(&self) -> [Vec2; 4] {
        let h = self.size * 0.5;
        [
            Vec2::new(-h.x, -h.y),
            Vec2::new(h.x, -h.y),
            Vec2::new(h.x, h.y),
            Vec2::new(-h.x, h.y),
        ]
        .map(|c| self.position + c.rotated(self.rotation))
    }

    /// Axis-aligned bounds of the rotated box.
    pub fn aabb(&self) -> Rect {
        if self.rotation == 0.0 {
            return Rect::from_center_size(self.position, self.size);
        }
        Rect::bounding(&self.corners()).unwrap_or_default()
    }

    /// Maps a point to texture coordinates of the box (`0..1` inside).
    pub fn to_uv(&self, p: Vec2) -> Option<Vec2> {
        if self.size.x == 0.0 || self.size.y == 0.0 {
            return None;
        }
        let local = (p - self.position).rotated(-self.rotation);
        Some(Vec2::new(local.x / self.size.x + 0.5, local.y / self.size.y + 0.5))
    }
}

/// A widget's transform.
///
/// `world` is the placement the caller sets; `local` is an extra offset on
/// top of it that is reset whenever the widget changes parent. Both are
/// relative to the parent's combined transform when there is one.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Transform2D {
    pub world: TransformPart,
    pub local: TransformPart,
}

impl Transform2D {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            world: TransformPart::new(position, 0.0, size),
            local: TransformPart::IDENTITY,
        }
    }

    /// World plus local, before any parent is applied.
    pub fn own(&self) -> TransformPart {
        self.world.offset_by(self.local)
    }

    pub fn reset_local(&mut self) {
        self.local = TransformPart::IDENTITY;
    }
}

use glam::{Mat4, Vec3};

use crate::context::ContextId;
use crate::coords::Vec2;

const PITCH_LIMIT: f32 = 89.0;

/// Construction parameters for a [`Camera`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraDesc {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Units per second for [`Camera::advance`].
    pub speed: f32,
    pub position: Vec3,
    /// Degrees. -90 looks down -Z.
    pub yaw: f32,
    /// Degrees, clamped to ±89.
    pub pitch: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraDesc {
    fn default() -> Self {
        Self {
            fov: 45.0,
            speed: 2.5,
            position: Vec3::new(0.0, 0.0, 3.0),
            yaw: -90.0,
            pitch: 0.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Perspective fly camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    context: ContextId,
    fov: f32,
    speed: f32,
    position: Vec3,
    yaw: f32,
    pitch: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    pub(crate) fn new(context: ContextId, desc: CameraDesc) -> Self {
        Self {
            context,
            fov: desc.fov,
            speed: desc.speed,
            position: desc.position,
            yaw: desc.yaw,
            pitch: desc.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            aspect: 16.0 / 9.0,
            near: desc.near,
            far: desc.far,
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.clamp(1.0, 179.0);
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Unit view direction.
    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.front().cross(Vec3::Y).normalize()
    }

    /// Applies a pointer delta, in degrees per pixel times `sensitivity`.
    ///
    /// Pointer y grows downward, so moving the pointer up pitches up.
    pub fn rotate(&mut self, delta: Vec2, sensitivity: f32) {
        self.yaw += delta.x * sensitivity;
        self.pitch = (self.pitch - delta.y * sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Moves along `direction` (camera space: x right, y up, z forward).
    pub fn advance(&mut self, direction: Vec3, dt: f32) {
        let step = self.speed * dt;
        self.position += self.right() * direction.x * step;
        self.position += Vec3::Y * direction.y * step;
        self.position += self.front() * direction.z * step;
    }

    /// Updates the aspect ratio from a framebuffer size. Zero heights are ignored.
    pub fn set_aspect_from_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!(target: "camera", "ignoring degenerate framebuffer size {width}x{height}");
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

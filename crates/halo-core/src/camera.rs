//! Perspective cameras for background and icon contexts.
//!
//! These types intentionally avoid referencing platform-specific APIs. The web
//! frontend consumes them to fill its per-frame camera uniform.

use glam::{Mat4, Vec3};

use crate::config::CameraParams;

/// Which kind of render context a camera (and its surface) belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextKind {
    /// Full-viewport background scene.
    Background,
    /// Small per-card (or expanded modal) icon.
    Icon,
}

impl ContextKind {
    pub fn camera_params(self) -> CameraParams {
        match self {
            ContextKind::Background => CameraParams::background(),
            ContextKind::Icon => CameraParams::icon(),
        }
    }
}

/// Simple right-handed camera description with perspective projection.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(params: &CameraParams, aspect: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, params.eye_z),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: sanitize_aspect(aspect),
            fovy_radians: params.fov_deg.to_radians(),
            znear: params.near,
            zfar: params.far,
        }
    }

    pub fn for_kind(kind: ContextKind, aspect: f32) -> Self {
        Self::new(&kind.camera_params(), aspect)
    }

    /// Update the aspect ratio in place (the projection is derived lazily).
    #[inline]
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = sanitize_aspect(aspect);
    }

    /// Compute the clip-space projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }
    /// Compute the view matrix that transforms world to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[inline]
fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

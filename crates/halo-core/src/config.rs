//! Parameter sets for scenes, cameras and motion.
//!
//! Defaults come from [`crate::constants`]; callers override individual
//! fields when they need a different look (or a smaller scene in tests).

use crate::constants::*;

#[derive(Clone, Debug, PartialEq)]
pub struct CameraParams {
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    pub eye_z: f32,
}

impl CameraParams {
    pub fn background() -> Self {
        Self {
            fov_deg: BACKGROUND_FOV_DEG,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            eye_z: BACKGROUND_CAMERA_Z,
        }
    }

    pub fn icon() -> Self {
        Self {
            fov_deg: ICON_FOV_DEG,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            eye_z: ICON_CAMERA_Z,
        }
    }
}

/// Background scene parameters.
///
/// `seed` fixes the particle layout; `None` draws a fresh layout from entropy.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundParams {
    pub particle_count: usize,
    pub cube_side: f32,
    pub particle_size: f32,
    pub particle_opacity: f32,
    pub knot_opacity: f32,
    pub icosahedron_opacity: f32,
    pub seed: Option<u64>,
}

impl Default for BackgroundParams {
    fn default() -> Self {
        Self {
            particle_count: PARTICLE_COUNT,
            cube_side: PARTICLE_CUBE_SIDE,
            particle_size: PARTICLE_SIZE,
            particle_opacity: PARTICLE_OPACITY,
            knot_opacity: KNOT_OPACITY,
            icosahedron_opacity: ICOSAHEDRON_OPACITY,
            seed: None,
        }
    }
}

impl BackgroundParams {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IconParams {
    pub opacity: f32,
    pub emissive: f32,
    pub css_size: f32,
}

impl Default for IconParams {
    fn default() -> Self {
        Self {
            opacity: ICON_OPACITY,
            emissive: ICON_EMISSIVE,
            css_size: ICON_CSS_SIZE,
        }
    }
}

//! Per-tick transform rules for the background and icon rigs.

use glam::Vec3;

use crate::constants::*;
use crate::error::SceneError;
use crate::input::InputState;
use crate::scene::{BackgroundRig, IconRig, NodeId, SceneGraph, SceneRig, Transform};

/// Motion coefficients of an instance. Switching only changes the icon spin rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnimationProfile {
    #[default]
    Ambient,
    Expanded,
}

impl AnimationProfile {
    /// Y-spin added per frame, in radians.
    #[inline]
    pub fn spin_per_frame(self) -> f32 {
        match self {
            AnimationProfile::Ambient => AMBIENT_SPIN_PER_FRAME,
            AnimationProfile::Expanded => EXPANDED_SPIN_PER_FRAME,
        }
    }
}

/// Motion state carried across ticks (survives profile switches).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionState {
    /// Accumulated icon spin around Y.
    pub spin_phase: f32,
    /// Per-instance phase offset for the float bob, in seconds.
    pub float_offset: f32,
    pub frames: u64,
}

impl MotionState {
    pub fn with_float_offset(float_offset: f32) -> Self {
        Self {
            float_offset,
            ..Self::default()
        }
    }
}

/// Apply one tick of motion. Nothing is written if any result is non-finite.
pub fn apply(
    scene: &mut SceneGraph,
    rig: &SceneRig,
    input: &InputState,
    profile: AnimationProfile,
    state: &mut MotionState,
) -> Result<(), SceneError> {
    match rig {
        SceneRig::Background(rig) => apply_background(scene, rig, input),
        SceneRig::Icon(rig) => apply_icon(scene, rig, input, profile, state),
    }?;
    state.frames += 1;
    Ok(())
}

fn apply_background(
    scene: &mut SceneGraph,
    rig: &BackgroundRig,
    input: &InputState,
) -> Result<(), SceneError> {
    let t = input.elapsed;
    let (sx, sy) = (input.smoothed_x, input.smoothed_y);

    let mut particles = scene.node(rig.particles).transform;
    particles.rotation.y = t * PARTICLE_SPIN_RATE + sx;
    particles.rotation.x = sy + input.smoothed_scroll;

    let mut knot = scene.node(rig.knot).transform;
    knot.rotation.x = t * KNOT_SPIN_X_RATE;
    knot.rotation.y = t * KNOT_SPIN_Y_RATE;
    knot.position.y = (t * KNOT_BOB_FREQ).sin() * KNOT_BOB_AMPLITUDE;
    knot.position.x = KNOT_BASE_X + sx * KNOT_POINTER_BIAS;

    let mut ico = scene.node(rig.icosahedron).transform;
    ico.rotation.y = t * ICOSAHEDRON_SPIN_RATE;
    ico.position.y =
        ICOSAHEDRON_POSITION[1] + (t * ICOSAHEDRON_BOB_FREQ).cos() * ICOSAHEDRON_BOB_AMPLITUDE;

    commit(
        scene,
        &[
            (rig.particles, particles),
            (rig.knot, knot),
            (rig.icosahedron, ico),
        ],
    )
}

fn apply_icon(
    scene: &mut SceneGraph,
    rig: &IconRig,
    input: &InputState,
    profile: AnimationProfile,
    state: &mut MotionState,
) -> Result<(), SceneError> {
    let t = input.elapsed;
    let spin_phase = state.spin_phase + profile.spin_per_frame();
    let float_t = t + state.float_offset;
    let mut mesh = scene.node(rig.mesh).transform;
    mesh.rotation =
        icon_wobble(t) + icon_float_rotation(float_t) + Vec3::new(0.0, spin_phase, 0.0);
    mesh.position.y = icon_float(float_t);
    commit(scene, &[(rig.mesh, mesh)])?;
    state.spin_phase = spin_phase;
    Ok(())
}

/// Small continuous wobble on all three axes.
#[inline]
pub fn icon_wobble(t: f32) -> Vec3 {
    Vec3::new(
        (t / 4.0).cos() * ICON_WOBBLE_AMPLITUDE,
        (t / 4.0).sin() * ICON_WOBBLE_AMPLITUDE,
        (t / 2.0).sin() * ICON_WOBBLE_AMPLITUDE,
    )
}

/// Vertical float bob in `[-range, range] * intensity`.
#[inline]
pub fn icon_float(t: f32) -> f32 {
    (t / 4.0 * ICON_FLOAT_SPEED).sin() * ICON_FLOAT_RANGE * ICON_FLOAT_INTENSITY
}

/// Rotation sway that rides along with the float bob.
#[inline]
pub fn icon_float_rotation(t: f32) -> Vec3 {
    let phase = t / 4.0 * ICON_FLOAT_SPEED;
    Vec3::new(phase.cos() / 8.0, phase.sin() / 8.0, phase.sin() / 20.0)
        * ICON_FLOAT_ROTATION_INTENSITY
}

fn commit(scene: &mut SceneGraph, updates: &[(NodeId, Transform)]) -> Result<(), SceneError> {
    if let Some((id, _)) = updates.iter().find(|(_, t)| !t.is_finite()) {
        return Err(SceneError::NonFiniteTransform(*id));
    }
    for (id, t) in updates {
        *scene.transform_mut(*id) = *t;
    }
    Ok(())
}

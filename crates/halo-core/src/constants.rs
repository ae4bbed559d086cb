//! Scene, motion and scheduling tuning constants.
//!
//! These constants express intended look and feel (e.g. smoothing factor,
//! spin rates, particle density) and keep magic numbers out of the code.

// Device surface
pub const MAX_PIXEL_DENSITY: f32 = 2.0; // hard cap on devicePixelRatio for every context

// Cameras
pub const BACKGROUND_FOV_DEG: f32 = 75.0;
pub const ICON_FOV_DEG: f32 = 45.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
pub const BACKGROUND_CAMERA_Z: f32 = 8.0;
pub const ICON_CAMERA_Z: f32 = 2.5;

// Background particle field ("ambient dust")
pub const PARTICLE_COUNT: usize = 4000;
pub const PARTICLE_CUBE_SIDE: f32 = 25.0;
pub const PARTICLE_OPACITY: f32 = 0.15;
pub const PARTICLE_SIZE: f32 = 0.012;

// Background torus knot
pub const KNOT_RADIUS: f32 = 1.5;
pub const KNOT_TUBE: f32 = 0.4;
pub const KNOT_TUBULAR_SEGMENTS: u32 = 200;
pub const KNOT_RADIAL_SEGMENTS: u32 = 32;
pub const KNOT_OPACITY: f32 = 0.05;
pub const KNOT_BASE_X: f32 = 4.0;

// Background icosahedron
pub const ICOSAHEDRON_RADIUS: f32 = 1.2;
pub const ICOSAHEDRON_DETAIL: u32 = 1;
pub const ICOSAHEDRON_OPACITY: f32 = 0.1;
pub const ICOSAHEDRON_POSITION: [f32; 3] = [-5.0, -2.0, -2.0];

// Background light
pub const BACKGROUND_LIGHT_POSITION: [f32; 3] = [2.0, 3.0, 4.0];
pub const BACKGROUND_LIGHT_INTENSITY: f32 = 1.0;

// Icons
pub const ICON_OPACITY: f32 = 0.4;
pub const ICON_EMISSIVE: f32 = 0.2; // #333333
pub const ICON_AMBIENT_INTENSITY: f32 = 1.5;
pub const ICON_POINT_LIGHT_POSITION: [f32; 3] = [10.0, 10.0, 10.0];
pub const ICON_SPOT_LIGHT_POSITION: [f32; 3] = [-10.0, 10.0, 10.0];
pub const ICON_LIGHT_INTENSITY: f32 = 2.0;
pub const ICON_SPOT_ANGLE: f32 = 0.15;
pub const ICON_SPOT_PENUMBRA: f32 = 1.0;
pub const ICON_CSS_SIZE: f32 = 120.0; // default card icon edge in CSS px

// Pointer coupling
pub const POINTER_SMOOTHING: f32 = 0.1; // smoothed += (target - smoothed) * α, once per tick
pub const POINTER_TO_ROTATION: f32 = 0.001; // CSS px offset from centre -> radians
pub const SCROLL_TO_ROTATION: f32 = 0.0001; // CSS px of scroll -> particle tilt

// Background motion
pub const PARTICLE_SPIN_RATE: f32 = 0.05;
pub const KNOT_SPIN_X_RATE: f32 = 0.2;
pub const KNOT_SPIN_Y_RATE: f32 = 0.15;
pub const KNOT_BOB_FREQ: f32 = 0.5;
pub const KNOT_BOB_AMPLITUDE: f32 = 1.0;
pub const KNOT_POINTER_BIAS: f32 = 2.0;
pub const ICOSAHEDRON_SPIN_RATE: f32 = 0.1;
pub const ICOSAHEDRON_BOB_FREQ: f32 = 0.3;
pub const ICOSAHEDRON_BOB_AMPLITUDE: f32 = 0.5;

// Icon motion
pub const AMBIENT_SPIN_PER_FRAME: f32 = 0.005;
pub const EXPANDED_SPIN_PER_FRAME: f32 = 0.01;
pub const ICON_WOBBLE_AMPLITUDE: f32 = 0.25;
pub const ICON_FLOAT_SPEED: f32 = 2.0;
pub const ICON_FLOAT_INTENSITY: f32 = 1.0;
pub const ICON_FLOAT_RANGE: f32 = 0.1;
// Float group sway scale
pub const ICON_FLOAT_ROTATION_INTENSITY: f32 = 1.0;

// Scheduling
pub const FRAME_BUDGET_WARN_MS: f64 = 8.0; // half a 60 Hz frame for a single instance
pub const SLOW_TICK_LOG_INTERVAL: u64 = 120; // frames between repeated slow-tick warnings

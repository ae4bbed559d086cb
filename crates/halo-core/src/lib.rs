pub mod camera;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod input;
pub mod lifecycle;
pub mod motion;
pub mod mounts;
pub mod render;
pub mod scene;
pub mod scheduler;
pub mod viewport;

pub use camera::{Camera, ContextKind};
pub use config::{BackgroundParams, CameraParams, IconParams};
pub use error::{RenderError, SceneError};
pub use geometry::{Geometry, GeometryKind, Mesh, SkillIcon};
pub use input::{InputState, PointerTracker};
pub use lifecycle::{InstanceHandle, InstanceInfo, MountId, MountSpec, SceneSpec, Stage};
pub use motion::{AnimationProfile, MotionState};
pub use mounts::{MountOutcome, MountTable};
pub use render::{ContextId, ContextLedger, ContextOptions, RenderContext, RenderSurface};
pub use scene::{
    build_background, build_icon, BlendMode, Drawable, Light, Material, NodeId, SceneGraph,
    SceneRig, SceneVariant, Transform,
};
pub use scheduler::{FrameCallback, FrameHost, FrameId, FrameTarget, Scheduler, SchedulerState};
pub use viewport::{ListenerId, SurfaceSize, ViewportAdapter, ViewportState};

use thiserror::Error;

use crate::scene::NodeId;

/// Failures reported by the device/surface layer of a render context.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    #[error("surface lost; it will be reconfigured on the next frame")]
    SurfaceLost,
    #[error("surface out of memory")]
    OutOfMemory,
    #[error("backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    /// The host did not provide a surface to mount into.
    #[error("mount point {0} has no drawable surface")]
    MissingSurface(u64),
    #[error("scheduler is already running")]
    AlreadyRunning,
    /// A motion rule produced NaN or infinity for a node transform.
    #[error("non-finite transform computed for node {0:?}")]
    NonFiniteTransform(NodeId),
    #[error("instance is being torn down")]
    InstanceBusy,
    #[error(transparent)]
    Render(#[from] RenderError),
}

//! Scene-facing provider seam

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use void_core::ProgressSink;

use crate::error::ResourceResult;
use crate::handle::{SceneHandle, SceneLoadMode};

/// The part of a resource provider a scene orchestrator depends on
#[async_trait]
pub trait SceneProvider: Send + Sync {
    /// Acquire a scene
    async fn load_scene(
        &self,
        key: &str,
        mode: SceneLoadMode,
        activate_on_load: bool,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> ResourceResult<SceneHandle>;

    /// Release a scene; a handle that is no longer valid is a no-op
    async fn unload_scene(&self, handle: &SceneHandle, cancel: &CancellationToken) -> ResourceResult<()>;

    /// Number of scenes loaded in the host
    fn loaded_scene_count(&self) -> usize;

    /// Check if `handle` still refers to a loaded scene
    fn is_scene_loaded(&self, handle: &SceneHandle) -> bool;

    /// Release every cached asset and tracked instance
    fn clear(&self);
}

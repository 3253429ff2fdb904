//! Host engine boundary
//!
//! The host resolves opaque keys to objects and scenes and counts references
//! natively. Everything here is implemented by the embedding engine.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use void_core::ProgressSink;

use crate::error::HostError;
use crate::handle::{InstanceId, SceneId, SceneLoadMode};

/// A host object; downcast by the typed provider API
pub type AssetObject = Arc<dyn Any + Send + Sync>;

/// Resource subsystem of the host engine
///
/// Every successful `load_asset`/`load_asset_blocking` takes one host
/// reference that is given back with `release_asset`.
#[async_trait]
pub trait ResourceHost: Send + Sync {
    /// Load an object by key
    async fn load_asset(&self, key: &str, cancel: CancellationToken) -> Result<AssetObject, HostError>;

    /// Load an object by key, blocking the calling thread
    fn load_asset_blocking(&self, key: &str) -> Result<AssetObject, HostError>;

    /// Give back one reference taken by a load
    fn release_asset(&self, key: &str);

    /// Spawn an instance of the object at `key`
    async fn instantiate(&self, key: &str, cancel: CancellationToken) -> Result<InstanceId, HostError>;

    /// Destroy a spawned instance
    fn release_instance(&self, instance: InstanceId);

    /// Load a scene; reports fractional progress while loading
    async fn load_scene(
        &self,
        key: &str,
        mode: SceneLoadMode,
        activate_on_load: bool,
        progress: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> Result<SceneId, HostError>;

    /// Unload a previously loaded scene
    async fn unload_scene(&self, scene: SceneId, cancel: CancellationToken) -> Result<(), HostError>;

    /// Number of scenes currently loaded, including ones this crate never saw
    fn loaded_scene_count(&self) -> usize;
}

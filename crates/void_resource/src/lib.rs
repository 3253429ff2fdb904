//! # Void Resource
//!
//! Asset and scene acquisition on top of a host engine.
//!
//! The host engine resolves symbolic keys to objects and scenes; this crate
//! adds what the host does not:
//! - One in-flight acquisition per key, shared by every concurrent caller
//! - Failed acquisitions are never served from cache
//! - Cancellation per caller: the underlying load is only aborted when the
//!   last interested caller gives up
//! - Tracked scenes and spawned instances, released in bulk on teardown
//!
//! ## Usage
//!
//! ```ignore
//! let provider = ResourceProvider::new(host);
//!
//! let texture: Arc<Texture> = provider.load_asset("ui/loading", &cancel).await?;
//! let scene = provider
//!     .load_scene("forest", SceneLoadMode::Additive, true, &NullProgress, &cancel)
//!     .await?;
//! ```

pub mod error;
pub mod handle;
pub mod host;
pub mod memory;
pub mod provider;
pub mod scene;

pub use error::{HostError, ResourceError, ResourceResult};
pub use handle::{InstanceId, SceneHandle, SceneId, SceneLoadMode};
pub use host::{AssetObject, ResourceHost};
pub use memory::MemoryHost;
pub use provider::{PreloadReport, ResourceProvider, ResourceStats};
pub use scene::SceneProvider;

pub mod prelude {
    pub use crate::error::{ResourceError, ResourceResult};
    pub use crate::handle::{SceneHandle, SceneLoadMode};
    pub use crate::host::ResourceHost;
    pub use crate::provider::ResourceProvider;
    pub use crate::scene::SceneProvider;
}

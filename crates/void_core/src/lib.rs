//! # void_core - Void Stage Core
//!
//! Zero-dependency primitives shared by the scene lifecycle crates:
//! - **Ids**: cheap, thread-safe identifiers for scenes, instances and subscribers
//! - **Progress**: the [`ProgressSink`] seam that lets resource-level progress
//!   flow into loading trackers without either side knowing about the other

pub mod id;
pub mod progress;

pub use id::*;
pub use progress::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::id::{Id, IdGenerator};
    pub use crate::progress::{NullProgress, ProgressSink};
}

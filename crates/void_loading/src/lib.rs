//! Void Loading - Loading State Tracking
//!
//! Tracks how many loading operations are in flight so a UI overlay can be
//! shown while anything is loading in the foreground.
//!
//! # Features
//!
//! - Nested, overlapping scopes (foreground and background)
//! - Counters that never go negative, whatever the release order
//! - Shared progress/description fed by [`ProgressReporter`]s
//! - Named phases for diagnostics
//! - Lifecycle events on a [`void_event::EventBus`]
//!
//! # Example
//!
//! ```ignore
//! use void_loading::prelude::*;
//!
//! let tracker = LoadingTracker::new(events.clone());
//! let scope = tracker.begin("Loading level", LoadingMode::Foreground);
//! tracker.report_progress(0.5, Some("Streaming textures"));
//! drop(scope); // overlay may hide now
//! ```

pub mod events;
pub mod reporter;
pub mod state;
pub mod tracker;

pub mod prelude {
    pub use crate::events::{LoadingCompleted, LoadingFailed, LoadingStarted, LoadingStateChanged};
    pub use crate::reporter::ProgressReporter;
    pub use crate::state::{LoadingMode, LoadingState};
    pub use crate::tracker::{LoadingScope, LoadingTracker};
}

pub use prelude::*;

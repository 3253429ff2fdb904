//! # Void Scene
//!
//! Scene lifecycle orchestration.
//!
//! [`SceneOrchestrator`] ties together the loading tracker, a scene provider,
//! a transition strategy and the [`SceneReadyRegistry`] into one switch
//! operation that is cancellable at every suspension point and always closes
//! its loading scope.
//!
//! ## Usage
//!
//! ```ignore
//! let orchestrator = SceneOrchestrator::new(tracker, provider, transition, ready.clone());
//!
//! // Inside the freshly loaded scene
//! let signal = Arc::new(ReadySignal::new());
//! ready.register(signal.clone());
//! // ... once the first frame is presentable
//! signal.mark_ready();
//!
//! orchestrator.switch_to("forest", &cancel).await?;
//! ```

pub mod error;
pub mod events;
pub mod orchestrator;
pub mod rendezvous;
pub mod state;

pub use error::{SceneError, SceneResult};
pub use events::{SceneStateChanged, SceneTransitionEvent, TransitionCompleted, TransitionStarted};
pub use orchestrator::SceneOrchestrator;
pub use rendezvous::{ReadySignal, SceneReadyHandler, SceneReadyRegistry};
pub use state::SwitchState;

pub mod prelude {
    pub use crate::error::{SceneError, SceneResult};
    pub use crate::events::{SceneTransitionEvent, TransitionCompleted, TransitionStarted};
    pub use crate::orchestrator::SceneOrchestrator;
    pub use crate::rendezvous::{ReadySignal, SceneReadyHandler, SceneReadyRegistry};
    pub use crate::state::SwitchState;
}

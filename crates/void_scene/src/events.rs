//! Events fired by the scene orchestrator

use crate::state::SwitchState;

/// The scenes involved in one switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneTransitionEvent {
    /// Scene being left; `None` on the first switch
    pub from: Option<String>,
    /// Scene being entered
    pub to: String,
}

/// Fired after unloading, right before the out-transition plays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionStarted(pub SceneTransitionEvent);

/// Fired once the in-transition has finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionCompleted(pub SceneTransitionEvent);

/// The orchestrator moved to another state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStateChanged(pub SwitchState);

//! Events fired by the loading tracker

use crate::state::LoadingState;

/// The active operation count went from zero to one
#[derive(Debug, Clone)]
pub struct LoadingStarted {
    /// Description of the operation that started the loading period
    pub description: String,
}

/// The active operation count returned to zero
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadingCompleted;

/// Any state-affecting call; carries the recomputed snapshot
#[derive(Debug, Clone)]
pub struct LoadingStateChanged(pub LoadingState);

/// An error was reported by a loading operation
#[derive(Debug, Clone)]
pub struct LoadingFailed {
    pub message: String,
}

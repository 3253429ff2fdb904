//! Scene switch states

use std::fmt;

/// Where a scene switch currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SwitchState {
    #[default]
    Idle,
    Unloading,
    TransitioningOut,
    LoadingResources,
    WaitingForReady,
    Succeeded,
    TransitioningIn,
    Failed,
}

impl SwitchState {
    /// Check if a switch is running
    pub fn is_busy(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Check if the loading scope is open in this state
    pub fn holds_loading_scope(&self) -> bool {
        matches!(
            self,
            Self::Unloading | Self::TransitioningOut | Self::LoadingResources | Self::WaitingForReady
        )
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Unloading => "unloading",
            Self::TransitioningOut => "transitioning out",
            Self::LoadingResources => "loading resources",
            Self::WaitingForReady => "waiting for ready",
            Self::Succeeded => "succeeded",
            Self::TransitioningIn => "transitioning in",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

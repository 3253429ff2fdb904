//! Loading state snapshot

/// Whether an operation should surface the blocking overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadingMode {
    /// User is waiting on it: show the overlay
    Foreground,
    /// Warm-up work: count it, but keep the overlay hidden
    Background,
}

impl LoadingMode {
    /// Check if this mode shows the overlay
    pub fn is_foreground(&self) -> bool {
        matches!(self, Self::Foreground)
    }
}

/// Derived view of the tracker
///
/// Recomputed from the operation counters on every state-affecting call;
/// never mutated independently.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadingState {
    /// At least one operation is active
    pub is_loading: bool,
    /// At least one foreground operation is active
    pub should_show_overlay: bool,
    /// Last reported progress (0.0 - 1.0)
    pub progress: f32,
    /// Last reported description
    pub description: String,
    /// Number of active operations
    pub active_operation_count: usize,
    /// Most recently begun phase that is still open
    pub current_phase: Option<String>,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self {
            is_loading: false,
            should_show_overlay: false,
            progress: 0.0,
            description: String::new(),
            active_operation_count: 0,
            current_phase: None,
        }
    }
}

impl LoadingState {
    /// Check if the tracker is idle
    pub fn is_idle(&self) -> bool {
        !self.is_loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let state = LoadingState::default();
        assert!(state.is_idle());
        assert!(!state.should_show_overlay);
        assert_eq!(state.progress, 0.0);
        assert!(state.current_phase.is_none());
    }

    #[test]
    fn test_mode() {
        assert!(LoadingMode::Foreground.is_foreground());
        assert!(!LoadingMode::Background.is_foreground());
    }
}

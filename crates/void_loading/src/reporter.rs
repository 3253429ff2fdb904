//! Progress reporter bridging provider progress into a tracker

use std::sync::Arc;

use void_core::ProgressSink;

use crate::tracker::LoadingTracker;

/// Forwards progress to a [`LoadingTracker`] and an optional linked sink
///
/// Handed to resource acquisitions so their fractional progress shows up in
/// the loading overlay.
#[derive(Clone)]
pub struct ProgressReporter {
    tracker: LoadingTracker,
    description: Option<String>,
    linked: Option<Arc<dyn ProgressSink>>,
}

impl ProgressReporter {
    pub(crate) fn new(
        tracker: LoadingTracker,
        description: Option<String>,
        linked: Option<Arc<dyn ProgressSink>>,
    ) -> Self {
        Self {
            tracker,
            description,
            linked,
        }
    }

    /// Description attached to every report
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl ProgressSink for ProgressReporter {
    fn report(&self, progress: f32) {
        self.tracker.report_progress(progress, self.description.as_deref());
        if let Some(linked) = &self.linked {
            linked.report(progress);
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("description", &self.description)
            .field("linked", &self.linked.is_some())
            .finish()
    }
}

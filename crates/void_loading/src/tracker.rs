//! Loading tracker and scopes
//!
//! The tracker owns two counters: every active operation, and the subset
//! that runs in the foreground. Counters only move through
//! [`LoadingTracker::begin`] and the release of the returned
//! [`LoadingScope`], so the overlay can never be left on by a forgotten
//! decrement.

use std::fmt::Display;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use void_core::ProgressSink;
use void_event::EventBus;

use crate::events::{LoadingCompleted, LoadingFailed, LoadingStarted, LoadingStateChanged};
use crate::reporter::ProgressReporter;
use crate::state::{LoadingMode, LoadingState};

/// Fields written by reporters; last writer wins
#[derive(Default)]
struct SharedFields {
    progress: f32,
    description: String,
    /// Open phases in begin order
    phases: Vec<(String, Instant)>,
    last_error: Option<String>,
}

impl SharedFields {
    fn reset(&mut self) {
        self.progress = 0.0;
        self.description.clear();
        self.phases.clear();
        self.last_error = None;
    }
}

struct TrackerInner {
    active: AtomicUsize,
    foreground: AtomicUsize,
    shared: Mutex<SharedFields>,
    events: Arc<EventBus>,
}

/// Tracks nested loading operations
///
/// Cheap to clone; clones share the same counters. Safe to use from
/// unrelated call chains at the same time (a background preload alongside a
/// foreground scene switch).
#[derive(Clone)]
pub struct LoadingTracker {
    inner: Arc<TrackerInner>,
}

impl LoadingTracker {
    /// Create a tracker that fires its events on `events`
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                active: AtomicUsize::new(0),
                foreground: AtomicUsize::new(0),
                shared: Mutex::new(SharedFields::default()),
                events,
            }),
        }
    }

    /// The event bus this tracker fires on
    pub fn events(&self) -> &Arc<EventBus> {
        &self.inner.events
    }

    /// Open a loading scope
    ///
    /// The scope holds one increment of the active counter (and of the
    /// foreground counter for [`LoadingMode::Foreground`]) until it is
    /// released or dropped.
    pub fn begin(&self, description: impl Into<String>, mode: LoadingMode) -> LoadingScope {
        let description = description.into();

        let previous = {
            let mut shared = self.inner.shared.lock();
            let previous = self.inner.active.fetch_add(1, Ordering::AcqRel);
            if mode.is_foreground() {
                self.inner.foreground.fetch_add(1, Ordering::AcqRel);
            }

            // A new loading period starts from a clean slate
            if previous == 0 {
                shared.reset();
            }
            if !description.is_empty() {
                shared.description = description.clone();
            }
            previous
        };

        log::debug!(
            "Loading scope opened: '{}' ({:?}, active={})",
            description,
            mode,
            previous + 1
        );

        if previous == 0 {
            self.inner.events.emit(LoadingStarted {
                description: description.clone(),
            });
        }
        self.notify_changed();

        LoadingScope {
            tracker: self.clone(),
            description,
            mode,
            released: false,
        }
    }

    /// Report progress for the current loading period
    ///
    /// The value is clamped to `[0, 1]`. Reports arriving while nothing is
    /// loading are dropped so they cannot leak into a later operation.
    pub fn report_progress(&self, value: f32, description: Option<&str>) {
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };

        {
            let mut shared = self.inner.shared.lock();
            if self.inner.active.load(Ordering::Acquire) == 0 {
                log::trace!("Dropping progress report {:.2} while idle", value);
                return;
            }
            shared.progress = value;
            if let Some(description) = description {
                shared.description = description.to_string();
            }
        }

        self.notify_changed();
    }

    /// Open a named diagnostic phase
    ///
    /// Beginning a phase that is already open restarts it. Phases begun while
    /// nothing is loading are dropped.
    pub fn begin_phase(&self, name: &str) {
        {
            let mut shared = self.inner.shared.lock();
            if self.inner.active.load(Ordering::Acquire) == 0 {
                log::trace!("Dropping phase '{}' while idle", name);
                return;
            }
            shared.phases.retain(|(open, _)| open != name);
            shared.phases.push((name.to_string(), Instant::now()));
        }
        log::debug!("Loading phase '{}' started", name);
        self.notify_changed();
    }

    /// Close a named diagnostic phase
    ///
    /// Closing a phase that is not open is ignored.
    pub fn end_phase(&self, name: &str) {
        let started = {
            let mut shared = self.inner.shared.lock();
            let position = shared.phases.iter().position(|(open, _)| open == name);
            position.map(|index| shared.phases.remove(index).1)
        };

        match started {
            Some(started) => {
                log::debug!(
                    "Loading phase '{}' finished in {:.1}ms",
                    name,
                    started.elapsed().as_secs_f64() * 1000.0
                );
                self.notify_changed();
            }
            None => log::debug!("Loading phase '{}' was not open", name),
        }
    }

    /// Names of the open phases, oldest first
    pub fn active_phases(&self) -> Vec<String> {
        self.inner
            .shared
            .lock()
            .phases
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Create a sink that forwards progress into this tracker
    ///
    /// Every report is also forwarded to `linked`, if given.
    pub fn progress_reporter(
        &self,
        description: Option<String>,
        linked: Option<Arc<dyn ProgressSink>>,
    ) -> ProgressReporter {
        ProgressReporter::new(self.clone(), description, linked)
    }

    /// Record an error and forward it to subscribers
    ///
    /// Counters are untouched: the failing operation still owns its scope.
    pub fn report_error<E: Display + ?Sized>(&self, error: &E) {
        let message = error.to_string();
        log::warn!("Loading error reported: {}", message);

        self.inner.shared.lock().last_error = Some(message.clone());
        self.inner.events.emit(LoadingFailed { message });
        self.notify_changed();
    }

    /// Most recent error reported during the current loading period
    pub fn last_error(&self) -> Option<String> {
        self.inner.shared.lock().last_error.clone()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> LoadingState {
        let shared = self.inner.shared.lock();
        let active = self.inner.active.load(Ordering::Acquire);
        let foreground = self.inner.foreground.load(Ordering::Acquire);

        LoadingState {
            is_loading: active > 0,
            should_show_overlay: foreground > 0,
            progress: shared.progress,
            description: shared.description.clone(),
            active_operation_count: active,
            current_phase: shared.phases.last().map(|(name, _)| name.clone()),
        }
    }

    /// Check if any operation is active
    pub fn is_loading(&self) -> bool {
        self.active_count() > 0
    }

    /// Check if the overlay should be visible
    pub fn should_show_overlay(&self) -> bool {
        self.foreground_count() > 0
    }

    /// Number of active operations
    pub fn active_count(&self) -> usize {
        self.inner.active.load(Ordering::Acquire)
    }

    /// Number of active foreground operations
    pub fn foreground_count(&self) -> usize {
        self.inner.foreground.load(Ordering::Acquire)
    }

    fn end(&self, description: &str, mode: LoadingMode) {
        let previous = decrement(&self.inner.active);
        if mode.is_foreground() && decrement(&self.inner.foreground) == 0 {
            log::warn!("Foreground loading counter was already zero releasing '{}'", description);
        }

        if previous == 0 {
            log::warn!("Loading counter was already zero releasing '{}'", description);
        }

        {
            let mut shared = self.inner.shared.lock();
            if self.inner.active.load(Ordering::Acquire) == 0 {
                shared.reset();
            }
        }

        log::debug!(
            "Loading scope closed: '{}' (active={})",
            description,
            previous.saturating_sub(1)
        );

        if previous == 1 {
            self.inner.events.emit(LoadingCompleted);
        }
        self.notify_changed();
    }

    fn notify_changed(&self) {
        self.inner.events.emit(LoadingStateChanged(self.state()));
    }
}

impl std::fmt::Debug for LoadingTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingTracker")
            .field("active", &self.active_count())
            .field("foreground", &self.foreground_count())
            .finish()
    }
}

/// Decrement clamped at zero; returns the previous value
fn decrement(counter: &AtomicUsize) -> usize {
    match counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| Some(v.saturating_sub(1))) {
        Ok(previous) | Err(previous) => previous,
    }
}

/// One active loading operation
///
/// Released exactly once: explicitly with [`release`](Self::release) or on
/// drop, whichever comes first.
#[must_use = "dropping a LoadingScope ends the loading operation immediately"]
pub struct LoadingScope {
    tracker: LoadingTracker,
    description: String,
    mode: LoadingMode,
    released: bool,
}

impl LoadingScope {
    /// Description given to [`LoadingTracker::begin`]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Mode the scope was opened with
    pub fn mode(&self) -> LoadingMode {
        self.mode
    }

    /// End the operation now
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.tracker.end(&self.description, self.mode);
        }
    }
}

impl Drop for LoadingScope {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl std::fmt::Debug for LoadingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingScope")
            .field("description", &self.description)
            .field("mode", &self.mode)
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> LoadingTracker {
        LoadingTracker::new(Arc::new(EventBus::new()))
    }

    #[test]
    fn test_begin_and_release() {
        let tracker = tracker();
        let scope = tracker.begin("Loading", LoadingMode::Foreground);

        assert!(tracker.is_loading());
        assert!(tracker.should_show_overlay());
        assert_eq!(tracker.state().description, "Loading");

        scope.release();
        assert!(!tracker.is_loading());
        assert!(!tracker.should_show_overlay());
    }

    #[test]
    fn test_background_hides_overlay() {
        let tracker = tracker();
        let _scope = tracker.begin("Warm cache", LoadingMode::Background);

        let state = tracker.state();
        assert!(state.is_loading);
        assert!(!state.should_show_overlay);
        assert_eq!(state.active_operation_count, 1);
    }

    #[test]
    fn test_decrement_clamps() {
        let counter = AtomicUsize::new(0);
        assert_eq!(decrement(&counter), 0);
        assert_eq!(counter.load(Ordering::Acquire), 0);

        counter.store(2, Ordering::Release);
        assert_eq!(decrement(&counter), 2);
        assert_eq!(counter.load(Ordering::Acquire), 1);
    }

    #[test]
    fn test_progress_is_clamped() {
        let tracker = tracker();
        let _scope = tracker.begin("Loading", LoadingMode::Foreground);

        tracker.report_progress(1.5, None);
        assert_eq!(tracker.state().progress, 1.0);

        tracker.report_progress(-0.5, Some("Unpacking"));
        let state = tracker.state();
        assert_eq!(state.progress, 0.0);
        assert_eq!(state.description, "Unpacking");

        tracker.report_progress(f32::NAN, None);
        assert_eq!(tracker.state().progress, 0.0);
    }

    #[test]
    fn test_progress_ignored_while_idle() {
        let tracker = tracker();
        tracker.report_progress(0.7, Some("Late"));

        let state = tracker.state();
        assert_eq!(state.progress, 0.0);
        assert!(state.description.is_empty());
    }

    #[test]
    fn test_auto_reset_after_last_scope() {
        let tracker = tracker();
        let scope = tracker.begin("Level", LoadingMode::Foreground);
        tracker.begin_phase("textures");
        tracker.report_progress(0.8, Some("Textures"));
        tracker.report_error(&"disk hiccup");

        scope.release();

        assert_eq!(tracker.state(), LoadingState::default());
        assert!(tracker.last_error().is_none());
        assert!(tracker.active_phases().is_empty());
    }

    #[test]
    fn test_phases() {
        let tracker = tracker();
        let _scope = tracker.begin("Level", LoadingMode::Foreground);

        tracker.begin_phase("unload");
        tracker.begin_phase("load");
        assert_eq!(tracker.state().current_phase.as_deref(), Some("load"));

        // Re-beginning moves the phase to the top
        tracker.begin_phase("unload");
        assert_eq!(tracker.active_phases(), vec!["load", "unload"]);

        tracker.end_phase("unload");
        assert_eq!(tracker.state().current_phase.as_deref(), Some("load"));

        tracker.end_phase("missing");
        tracker.end_phase("load");
        assert!(tracker.state().current_phase.is_none());
    }

    #[test]
    fn test_report_error_keeps_counters() {
        let tracker = tracker();
        let _scope = tracker.begin("Level", LoadingMode::Foreground);

        tracker.report_error(&"scene not found");

        assert_eq!(tracker.active_count(), 1);
        assert_eq!(tracker.last_error().as_deref(), Some("scene not found"));
    }
}

//! Scene orchestrator
//!
//! Sequences one scene switch:
//!
//! 1. Open a foreground loading scope and unload the current scene
//! 2. Fire [`TransitionStarted`] and play the out-transition
//! 3. Load the target scene, feeding progress into the tracker
//! 4. Await the registered ready handler, if any
//! 5. Close the loading scope
//! 6. Play the in-transition and fire [`TransitionCompleted`]
//!
//! Steps 1 to 4 run inside the scope. Any failure there closes the scope and
//! is returned to the caller; the reveal never starts before the scope has
//! closed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use void_event::EventBus;
use void_loading::{LoadingMode, LoadingTracker};
use void_resource::{SceneHandle, SceneLoadMode, SceneProvider};
use void_transition::TransitionStrategy;

use crate::error::{SceneError, SceneResult};
use crate::events::{SceneStateChanged, SceneTransitionEvent, TransitionCompleted, TransitionStarted};
use crate::rendezvous::SceneReadyRegistry;
use crate::state::SwitchState;

const PHASE_UNLOAD: &str = "unload";
const PHASE_LOAD: &str = "load_scene";
const PHASE_READY: &str = "wait_ready";

/// Runs scene switches
pub struct SceneOrchestrator {
    tracker: LoadingTracker,
    provider: Arc<dyn SceneProvider>,
    transition: Arc<dyn TransitionStrategy>,
    ready: Arc<SceneReadyRegistry>,
    events: Arc<EventBus>,
    current: Mutex<Option<SceneHandle>>,
    state: Mutex<SwitchState>,
    switching: AtomicBool,
    target: Mutex<Option<String>>,
}

impl SceneOrchestrator {
    /// Assemble an orchestrator
    ///
    /// Events go to the tracker's event bus.
    pub fn new(
        tracker: LoadingTracker,
        provider: Arc<dyn SceneProvider>,
        transition: Arc<dyn TransitionStrategy>,
        ready: Arc<SceneReadyRegistry>,
    ) -> Self {
        let events = tracker.events().clone();
        log::debug!("Scene orchestrator using {} transition", transition.mode());

        Self {
            tracker,
            provider,
            transition,
            ready,
            events,
            current: Mutex::new(None),
            state: Mutex::new(SwitchState::Idle),
            switching: AtomicBool::new(false),
            target: Mutex::new(None),
        }
    }

    /// Switch to the scene at `key`
    ///
    /// Cancelling `cancel` aborts the switch at its next suspension point and
    /// returns [`SceneError::Cancelled`]. Switches must not overlap; a second
    /// call while one is running fails with [`SceneError::SwitchInProgress`].
    pub async fn switch_to(&self, key: &str, cancel: &CancellationToken) -> SceneResult<()> {
        let _guard = SwitchGuard::acquire(self, key)?;

        let from = self.current_scene();
        let description = format!("Loading {}", key);
        let event = SceneTransitionEvent {
            from: from.clone(),
            to: key.to_string(),
        };
        log::info!("Switching scene: {} -> {}", from.as_deref().unwrap_or("<none>"), key);

        let scope = self.tracker.begin(description.clone(), LoadingMode::Foreground);
        let mut played_out = false;
        let result = self
            .run_switch(key, from.as_deref(), &description, &event, cancel, &mut played_out)
            .await;

        if let Err(e) = &result {
            if e.is_cancelled() {
                log::info!("Scene switch to '{}' cancelled", key);
            } else {
                log::error!("Scene switch to '{}' failed: {}", key, e);
                self.tracker.report_error(e);
            }
        }
        scope.release();

        if let Err(e) = result {
            self.set_state(SwitchState::Failed);
            if played_out {
                self.transition.reset();
            }
            return Err(e);
        }

        self.set_state(SwitchState::Succeeded);
        self.set_state(SwitchState::TransitioningIn);
        self.transition.play_in(key, &description, cancel).await;
        self.events.emit(TransitionCompleted(event));

        log::info!("Now in scene '{}'", key);
        Ok(())
    }

    /// Switch to the current scene again
    pub async fn reload_current(&self, cancel: &CancellationToken) -> SceneResult<()> {
        let key = self.current_scene().ok_or(SceneError::NoCurrentScene)?;
        self.switch_to(&key, cancel).await
    }

    /// Unload the current scene and release everything the provider holds
    ///
    /// The provider is cleared even if the unload fails.
    pub async fn shutdown(&self) -> SceneResult<()> {
        let current = self.current.lock().take();
        let result = match current {
            Some(handle) => {
                log::info!("Unloading scene {} for shutdown", handle);
                self.provider
                    .unload_scene(&handle, &CancellationToken::new())
                    .await
                    .map_err(|e| SceneError::from_resource(handle.key(), e))
            }
            None => Ok(()),
        };

        if let Err(e) = &result {
            log::warn!("Shutdown unload failed: {}", e);
        }
        self.provider.clear();
        result
    }

    /// Key of the current scene
    pub fn current_scene(&self) -> Option<String> {
        self.current.lock().as_ref().map(|handle| handle.key().to_string())
    }

    /// Handle of the current scene
    pub fn current_handle(&self) -> Option<SceneHandle> {
        self.current.lock().clone()
    }

    /// Phase of the running switch, `Idle` between switches
    pub fn state(&self) -> SwitchState {
        *self.state.lock()
    }

    /// Check if a switch is running
    pub fn is_switching(&self) -> bool {
        self.switching.load(Ordering::Acquire)
    }

    /// Registry the loaded scene announces readiness through
    pub fn ready_registry(&self) -> &Arc<SceneReadyRegistry> {
        &self.ready
    }

    /// Tracker holding the switch's loading scope
    pub fn tracker(&self) -> &LoadingTracker {
        &self.tracker
    }

    /// Strategy played around every switch
    pub fn transition(&self) -> &Arc<dyn TransitionStrategy> {
        &self.transition
    }

    async fn run_switch(
        &self,
        key: &str,
        from: Option<&str>,
        description: &str,
        event: &SceneTransitionEvent,
        cancel: &CancellationToken,
        played_out: &mut bool,
    ) -> SceneResult<()> {
        ensure_active(key, cancel)?;

        self.set_state(SwitchState::Unloading);
        self.tracker.begin_phase(PHASE_UNLOAD);
        let mode = self.unload_current(cancel).await;
        self.tracker.end_phase(PHASE_UNLOAD);
        let mode = mode?;

        self.events.emit(TransitionStarted(event.clone()));
        self.set_state(SwitchState::TransitioningOut);
        *played_out = true;
        self.transition.play_out(from, key, description, cancel).await;
        ensure_active(key, cancel)?;

        self.set_state(SwitchState::LoadingResources);
        self.tracker.begin_phase(PHASE_LOAD);
        let progress = self.tracker.progress_reporter(Some(description.to_string()), None);
        let loaded = self.provider.load_scene(key, mode, true, &progress, cancel).await;
        self.tracker.end_phase(PHASE_LOAD);
        let handle = loaded.map_err(|e| SceneError::from_resource(key, e))?;
        log::debug!("Loaded scene {} ({:?})", handle, mode);
        *self.current.lock() = Some(handle);

        self.set_state(SwitchState::WaitingForReady);
        if let Some(handler) = self.ready.current() {
            self.tracker.begin_phase(PHASE_READY);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                _ = handler.wait_until_ready(cancel) => {}
            }
            self.tracker.end_phase(PHASE_READY);
            ensure_active(key, cancel)?;
        }

        Ok(())
    }

    /// Unload the current scene and pick the load mode for the next one
    async fn unload_current(&self, cancel: &CancellationToken) -> SceneResult<SceneLoadMode> {
        let current = self.current.lock().clone();
        let Some(handle) = current else {
            return Ok(SceneLoadMode::Additive);
        };

        if !self.provider.is_scene_loaded(&handle) {
            log::debug!("Current scene {} is already gone", handle);
            *self.current.lock() = None;
            return Ok(SceneLoadMode::Additive);
        }

        if self.provider.loaded_scene_count() <= 1 {
            log::info!(
                "Scene '{}' is the only loaded scene; keeping it until the next one replaces it",
                handle.key()
            );
            return Ok(SceneLoadMode::Single);
        }

        self.provider
            .unload_scene(&handle, cancel)
            .await
            .map_err(|e| SceneError::from_resource(handle.key(), e))?;
        *self.current.lock() = None;
        Ok(SceneLoadMode::Additive)
    }

    fn set_state(&self, state: SwitchState) {
        {
            let mut current = self.state.lock();
            if *current == state {
                return;
            }
            *current = state;
        }
        log::trace!("Scene orchestrator: {}", state);
        self.events.emit(SceneStateChanged(state));
    }
}

impl std::fmt::Debug for SceneOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneOrchestrator")
            .field("state", &self.state())
            .field("current", &self.current_scene())
            .field("transition", &self.transition.mode())
            .finish()
    }
}

fn ensure_active(key: &str, cancel: &CancellationToken) -> SceneResult<()> {
    if cancel.is_cancelled() {
        Err(SceneError::Cancelled(key.to_string()))
    } else {
        Ok(())
    }
}

/// Marks a switch as running; returns the orchestrator to idle when dropped
struct SwitchGuard<'a> {
    orchestrator: &'a SceneOrchestrator,
}

impl<'a> SwitchGuard<'a> {
    fn acquire(orchestrator: &'a SceneOrchestrator, key: &str) -> SceneResult<Self> {
        if orchestrator
            .switching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let active = orchestrator.target.lock().clone().unwrap_or_default();
            log::warn!("Rejected switch to '{}' while switching to '{}'", key, active);
            return Err(SceneError::SwitchInProgress {
                requested: key.to_string(),
                active,
            });
        }

        *orchestrator.target.lock() = Some(key.to_string());
        Ok(Self { orchestrator })
    }
}

impl Drop for SwitchGuard<'_> {
    fn drop(&mut self) {
        self.orchestrator.set_state(SwitchState::Idle);
        *self.orchestrator.target.lock() = None;
        self.orchestrator.switching.store(false, Ordering::Release);
    }
}

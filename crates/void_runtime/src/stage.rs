//! Stage assembly
//!
//! The composition root: builds the host, provider, tracker, transitions and
//! orchestrator exactly once, then drives a scene tour through them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use void_event::EventBus;
use void_loading::{LoadingCompleted, LoadingFailed, LoadingMode, LoadingStarted, LoadingStateChanged, LoadingTracker};
use void_resource::{MemoryHost, PreloadReport, ResourceHost, ResourceProvider};
use void_scene::{
    SceneError, SceneOrchestrator, SceneReadyHandler, SceneReadyRegistry, SceneResult,
    TransitionCompleted, TransitionStarted,
};
use void_transition::{OverlayLayer, TransitionContext, TransitionSelector};

use crate::stage_config::StageConfig;

/// Scenes the demo host knows about
const DEMO_SCENES: &[&str] = &["menu", "forest", "castle", "credits"];
/// Assets the demo host knows about
const DEMO_ASSETS: &[&str] = &["ui/loading_spinner", "audio/theme", "prefab/crate"];
/// Scene that is resident before the first switch
const BOOT_SCENE: &str = "boot";

/// Time a freshly loaded scene takes before it is presentable
const SCENE_WARMUP: Duration = Duration::from_millis(250);

/// Readiness of a freshly loaded demo scene
///
/// The warmup starts when the orchestrator begins waiting, which is after the
/// scene finished loading.
struct SceneWarmup {
    scene: String,
    duration: Duration,
}

#[async_trait]
impl SceneReadyHandler for SceneWarmup {
    async fn wait_until_ready(&self, cancel: &CancellationToken) {
        log::debug!("Warming up '{}'", self.scene);
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.duration) => {
                log::debug!("'{}' is ready", self.scene);
            }
        }
    }
}

/// The assembled application
pub struct Stage {
    config: StageConfig,
    events: Arc<EventBus>,
    tracker: LoadingTracker,
    host: Arc<MemoryHost>,
    provider: Arc<ResourceProvider>,
    overlay: Arc<OverlayLayer>,
    ready: Arc<SceneReadyRegistry>,
    orchestrator: SceneOrchestrator,
}

impl Stage {
    /// Assemble the stage on the in-memory demo host
    pub fn assemble(config: StageConfig) -> Self {
        Self::assemble_with_host(config, Self::demo_host(Duration::from_millis(400)))
    }

    /// Assemble the stage on `host`
    pub fn assemble_with_host(config: StageConfig, host: MemoryHost) -> Self {
        let events = Arc::new(EventBus::new());
        let tracker = LoadingTracker::new(events.clone());
        let host = Arc::new(host);
        let provider = Arc::new(ResourceProvider::new(host.clone()));

        let transition_config = &config.transition;
        let overlay = Arc::new(OverlayLayer::new(transition_config.sorting_order));
        let context = TransitionContext::realtime(overlay.clone(), transition_config.frame_interval());
        let selector = TransitionSelector::standard(context, transition_config);
        let transition = selector.resolve(transition_config);

        let ready = Arc::new(SceneReadyRegistry::new());
        let orchestrator = SceneOrchestrator::new(tracker.clone(), provider.clone(), transition, ready.clone());

        let stage = Self {
            config,
            events,
            tracker,
            host,
            provider,
            overlay,
            ready,
            orchestrator,
        };
        stage.watch_events();
        stage
    }

    fn demo_host(latency: Duration) -> MemoryHost {
        let mut host = MemoryHost::new(latency / 3).with_resident_scene(BOOT_SCENE);
        for scene in DEMO_SCENES {
            host = host.with_scene_latency(*scene, latency);
        }
        for asset in DEMO_ASSETS {
            // Payload stands in for whatever the host would decode
            host = host.with_asset(*asset, asset.to_string());
        }
        host
    }

    fn watch_events(&self) {
        self.events.subscribe::<LoadingStarted, _>(|e| {
            log::info!("Loading: {}", e.description);
        });
        self.events.subscribe::<LoadingCompleted, _>(|_| {
            log::info!("Loading finished");
        });
        self.events.subscribe::<LoadingStateChanged, _>(|LoadingStateChanged(state)| {
            if state.is_loading {
                log::debug!(
                    "Overlay {} | {:>3.0}% | {} ({} active{})",
                    if state.should_show_overlay { "shown " } else { "hidden" },
                    state.progress * 100.0,
                    state.description,
                    state.active_operation_count,
                    state
                        .current_phase
                        .as_deref()
                        .map(|phase| format!(", phase {}", phase))
                        .unwrap_or_default()
                );
            }
        });
        self.events.subscribe::<LoadingFailed, _>(|e| {
            log::warn!("Loading failed: {}", e.message);
        });
        self.events.subscribe::<TransitionStarted, _>(|TransitionStarted(e)| {
            log::info!("Transition started: {} -> {}", e.from.as_deref().unwrap_or("<none>"), e.to);
        });
        self.events.subscribe::<TransitionCompleted, _>(|TransitionCompleted(e)| {
            log::info!("Transition completed: {} -> {}", e.from.as_deref().unwrap_or("<none>"), e.to);
        });
    }

    /// Enter the initial scene, visit the tour, then shut down
    ///
    /// Cancellation stops the tour at the next suspension point; the stage
    /// still shuts down cleanly.
    pub async fn run(&self, cancel: &CancellationToken) -> SceneResult<()> {
        let initial = self.config.stage.initial_scene.clone();

        let (entered, preloaded) = tokio::join!(self.visit(&initial, cancel), self.preload(cancel));
        log::info!(
            "Preloaded {} asset(s), {} already cached, {} failed",
            preloaded.loaded,
            preloaded.skipped,
            preloaded.failed
        );

        let mut result = entered;
        if result.is_ok() {
            for scene in &self.config.stage.tour {
                if cancel.is_cancelled() {
                    break;
                }
                result = self.visit(scene, cancel).await;
                if let Err(e) = &result {
                    if !e.is_cancelled() {
                        log::error!("Tour stopped at '{}'", scene);
                    }
                    break;
                }
            }
        }

        if let Err(e) = self.orchestrator.shutdown().await {
            log::warn!("Shutdown incomplete: {}", e);
        }
        log::info!(
            "Stage finished: {} scene(s) resident, {} overlay frame(s) presented",
            self.host.loaded_scene_count(),
            self.overlay.frame_count()
        );

        match result {
            Err(SceneError::Cancelled(_)) => Ok(()),
            other => other,
        }
    }

    /// Switch to `key`, holding the reveal until the new scene has warmed up
    async fn visit(&self, key: &str, cancel: &CancellationToken) -> SceneResult<()> {
        let handler: Arc<dyn SceneReadyHandler> = Arc::new(SceneWarmup {
            scene: key.to_string(),
            duration: SCENE_WARMUP,
        });
        self.ready.register(handler.clone());

        let result = self.orchestrator.switch_to(key, cancel).await;
        self.ready.unregister(&handler);
        result
    }

    /// Warm the configured assets under a background loading scope
    async fn preload(&self, cancel: &CancellationToken) -> PreloadReport {
        if self.config.stage.preload.is_empty() {
            return PreloadReport::default();
        }

        let scope = self.tracker.begin("Preloading assets", LoadingMode::Background);
        let report = self.provider.preload(&self.config.stage.preload, cancel).await;
        scope.release();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_transition::TransitionMode;

    fn config(tour: &[&str]) -> StageConfig {
        let mut config = StageConfig::default();
        config.stage.initial_scene = "menu".to_string();
        config.stage.tour = tour.iter().map(|s| s.to_string()).collect();
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_tour_visits_every_scene() {
        let stage = Stage::assemble(config(&["forest", "castle"]));

        stage.run(&CancellationToken::new()).await.unwrap();

        for scene in ["menu", "forest", "castle"] {
            assert_eq!(stage.host.scene_load_calls(scene), 1);
        }
        assert_eq!(stage.host.scene_unload_calls("menu"), 1);
        assert_eq!(stage.host.scene_unload_calls("forest"), 1);
        assert_eq!(stage.host.scene_unload_calls("castle"), 1);
        assert_eq!(stage.host.loaded_scene_count(), 1);
        assert_eq!(stage.provider.cached_count(), 0);
        assert!(stage.overlay.current().is_resting());
        assert!(stage.overlay.peak_alpha() > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visit_holds_loading_until_warmed_up() {
        let mut config = config(&[]);
        config.transition.enable_transition = false;
        let stage = Stage::assemble(config);

        let phases = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen = phases.clone();
        stage.events.subscribe::<LoadingStateChanged, _>(move |LoadingStateChanged(state)| {
            if let Some(phase) = &state.current_phase {
                seen.lock().push(phase.clone());
            }
        });

        let started = tokio::time::Instant::now();
        stage.visit("menu", &CancellationToken::new()).await.unwrap();

        // Load latency, then the full warmup on top
        assert!(started.elapsed() >= Duration::from_millis(400) + SCENE_WARMUP);
        assert!(phases.lock().iter().any(|phase| phase == "wait_ready"));
        assert!(!stage.tracker.is_loading());
        assert!(stage.ready.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_runs_alongside_first_switch() {
        let stage = Stage::assemble(config(&[]));

        stage.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(stage.host.asset_load_calls("ui/loading_spinner"), 1);
        assert_eq!(stage.host.asset_release_calls("ui/loading_spinner"), 1);
        assert_eq!(stage.host.asset_load_calls("prefab/crate"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_scene_stops_tour() {
        let stage = Stage::assemble(config(&["dungeon", "castle"]));

        let result = stage.run(&CancellationToken::new()).await;

        assert!(matches!(result, Err(SceneError::Resource(_))));
        assert_eq!(stage.host.scene_load_calls("castle"), 0);
        assert_eq!(stage.host.loaded_scene_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_tour_shuts_down_cleanly() {
        let stage = Stage::assemble(config(&["forest", "castle", "credits"]));
        let cancel = CancellationToken::new();

        let (result, _) = tokio::join!(stage.run(&cancel), async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            cancel.cancel();
        });

        assert!(result.is_ok());
        assert_eq!(stage.host.scene_load_calls("credits"), 0);
        assert_eq!(stage.host.loaded_scene_count(), 1);
        assert!(!stage.orchestrator.tracker().is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_transitions_present_nothing() {
        let mut config = config(&["forest"]);
        config.transition.enable_transition = false;
        config.transition.mode = TransitionMode::Cinematic;
        let stage = Stage::assemble(config);

        stage.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(stage.overlay.frame_count(), 0);
        assert_eq!(stage.orchestrator.transition().mode(), TransitionMode::None);
    }
}

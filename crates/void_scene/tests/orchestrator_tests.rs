//! Integration tests for void_scene

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use void_event::EventBus;
use void_loading::{LoadingCompleted, LoadingFailed, LoadingStarted, LoadingStateChanged, LoadingTracker};
use void_resource::{MemoryHost, ResourceError, ResourceProvider};
use void_scene::*;
use void_transition::{
    OverlayLayer, TransitionConfig, TransitionContext, TransitionMode, TransitionSelector,
    TransitionStrategy,
};

type Recorder = Arc<Mutex<Vec<String>>>;

/// Transition that records when it runs and whether loading was still active
struct RecordingTransition {
    log: Recorder,
    tracker: LoadingTracker,
}

#[async_trait]
impl TransitionStrategy for RecordingTransition {
    fn mode(&self) -> TransitionMode {
        TransitionMode::Fade
    }

    async fn play_out(&self, from: Option<&str>, to: &str, _description: &str, _cancel: &CancellationToken) {
        self.log
            .lock()
            .push(format!("play_out:{}->{}", from.unwrap_or("none"), to));
    }

    async fn play_in(&self, to: &str, _description: &str, _cancel: &CancellationToken) {
        self.log
            .lock()
            .push(format!("play_in:{} loading={}", to, self.tracker.is_loading()));
    }

    fn reset(&self) {
        self.log.lock().push("reset".to_string());
    }
}

/// Ready handler that takes a fixed time to resolve
struct SlowReady {
    delay: Duration,
    tracker: LoadingTracker,
    loading_while_waiting: Mutex<Option<bool>>,
}

#[async_trait]
impl SceneReadyHandler for SlowReady {
    async fn wait_until_ready(&self, _cancel: &CancellationToken) {
        *self.loading_while_waiting.lock() = Some(self.tracker.is_loading());
        tokio::time::sleep(self.delay).await;
    }
}

struct Stage {
    tracker: LoadingTracker,
    host: Arc<MemoryHost>,
    provider: Arc<ResourceProvider>,
    ready: Arc<SceneReadyRegistry>,
    log: Recorder,
    orchestrator: SceneOrchestrator,
}

fn default_host() -> MemoryHost {
    MemoryHost::new(Duration::from_millis(100))
        .with_resident_scene("boot")
        .with_scene("forest")
        .with_scene("castle")
        .with_asset("ui/icon", 1u32)
}

fn stage_with(host: MemoryHost, transition: Option<Arc<dyn TransitionStrategy>>) -> Stage {
    let events = Arc::new(EventBus::new());
    let tracker = LoadingTracker::new(events.clone());
    let host = Arc::new(host);
    let provider = Arc::new(ResourceProvider::new(host.clone()));
    let ready = Arc::new(SceneReadyRegistry::new());
    let log: Recorder = Arc::new(Mutex::new(Vec::new()));

    let transition: Arc<dyn TransitionStrategy> = match transition {
        Some(transition) => transition,
        None => Arc::new(RecordingTransition {
            log: log.clone(),
            tracker: tracker.clone(),
        }),
    };

    let recorder = log.clone();
    events.subscribe::<LoadingStarted, _>(move |_| recorder.lock().push("scope_open".to_string()));
    let recorder = log.clone();
    events.subscribe::<LoadingCompleted, _>(move |_| recorder.lock().push("scope_closed".to_string()));
    let recorder = log.clone();
    events.subscribe::<TransitionStarted, _>(move |TransitionStarted(e)| {
        recorder
            .lock()
            .push(format!("started:{}->{}", e.from.as_deref().unwrap_or("none"), e.to));
    });
    let recorder = log.clone();
    events.subscribe::<TransitionCompleted, _>(move |TransitionCompleted(e)| {
        recorder
            .lock()
            .push(format!("completed:{}->{}", e.from.as_deref().unwrap_or("none"), e.to));
    });

    let orchestrator = SceneOrchestrator::new(tracker.clone(), provider.clone(), transition, ready.clone());

    Stage {
        tracker,
        host,
        provider,
        ready,
        log,
        orchestrator,
    }
}

fn stage() -> Stage {
    stage_with(default_host(), None)
}

fn loaded_keys(host: &MemoryHost) -> Vec<String> {
    host.loaded_scenes().into_iter().map(|s| s.key).collect()
}

#[tokio::test(start_paused = true)]
async fn test_switch_event_order() {
    let stage = stage();
    let cancel = CancellationToken::new();

    stage.orchestrator.switch_to("forest", &cancel).await.unwrap();

    assert_eq!(
        *stage.log.lock(),
        vec![
            "scope_open",
            "started:none->forest",
            "play_out:none->forest",
            "scope_closed",
            "play_in:forest loading=false",
            "completed:none->forest",
        ]
    );
    assert_eq!(stage.orchestrator.current_scene().as_deref(), Some("forest"));
    assert_eq!(stage.orchestrator.state(), SwitchState::Idle);
    assert_eq!(loaded_keys(&stage.host), vec!["boot", "forest"]);
}

#[tokio::test(start_paused = true)]
async fn test_second_switch_unloads_previous_scene() {
    let stage = stage();
    let cancel = CancellationToken::new();

    stage.orchestrator.switch_to("forest", &cancel).await.unwrap();
    stage.log.lock().clear();
    stage.orchestrator.switch_to("castle", &cancel).await.unwrap();

    assert_eq!(
        *stage.log.lock(),
        vec![
            "scope_open",
            "started:forest->castle",
            "play_out:forest->castle",
            "scope_closed",
            "play_in:castle loading=false",
            "completed:forest->castle",
        ]
    );
    assert_eq!(stage.host.scene_unload_calls("forest"), 1);
    assert_eq!(loaded_keys(&stage.host), vec!["boot", "castle"]);
}

#[tokio::test(start_paused = true)]
async fn test_only_scene_is_replaced_not_unloaded() {
    let host = MemoryHost::new(Duration::from_millis(100))
        .with_scene("forest")
        .with_scene("castle");
    let stage = stage_with(host, None);
    let cancel = CancellationToken::new();

    stage.orchestrator.switch_to("forest", &cancel).await.unwrap();
    stage.orchestrator.switch_to("castle", &cancel).await.unwrap();

    assert_eq!(stage.host.scene_unload_calls("forest"), 0);
    assert_eq!(loaded_keys(&stage.host), vec!["castle"]);
    assert_eq!(stage.orchestrator.current_scene().as_deref(), Some("castle"));
}

#[tokio::test(start_paused = true)]
async fn test_state_changes() {
    let stage = stage();
    let states = Arc::new(Mutex::new(Vec::new()));
    let recorder = states.clone();
    stage
        .tracker
        .events()
        .subscribe::<SceneStateChanged, _>(move |SceneStateChanged(state)| recorder.lock().push(*state));

    stage
        .orchestrator
        .switch_to("forest", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        *states.lock(),
        vec![
            SwitchState::Unloading,
            SwitchState::TransitioningOut,
            SwitchState::LoadingResources,
            SwitchState::WaitingForReady,
            SwitchState::Succeeded,
            SwitchState::TransitioningIn,
            SwitchState::Idle,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_ready_handler_keeps_scope_open() {
    let stage = stage();
    let opened = Arc::new(Mutex::new(None));
    let closed = Arc::new(Mutex::new(None));

    let slot = opened.clone();
    stage
        .tracker
        .events()
        .subscribe::<LoadingStarted, _>(move |_| *slot.lock() = Some(Instant::now()));
    let slot = closed.clone();
    stage
        .tracker
        .events()
        .subscribe::<LoadingCompleted, _>(move |_| *slot.lock() = Some(Instant::now()));

    let handler = Arc::new(SlowReady {
        delay: Duration::from_secs(2),
        tracker: stage.tracker.clone(),
        loading_while_waiting: Mutex::new(None),
    });
    stage.ready.register(handler.clone());

    stage
        .orchestrator
        .switch_to("forest", &CancellationToken::new())
        .await
        .unwrap();

    let opened = (*opened.lock()).unwrap();
    let closed = (*closed.lock()).unwrap();
    assert!(closed - opened >= Duration::from_secs(2) + Duration::from_millis(100));
    assert_eq!(*handler.loading_while_waiting.lock(), Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_ready_signal_resolves_switch() {
    let stage = stage();
    let signal = Arc::new(ReadySignal::new());
    stage.ready.register(signal.clone());

    let marker = signal.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        marker.mark_ready();
    });

    let start = Instant::now();
    stage
        .orchestrator
        .switch_to("forest", &CancellationToken::new())
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_secs(1));
    assert!(!stage.tracker.is_loading());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_load_closes_scope() {
    let host = default_host().with_scene_latency("forest", Duration::from_secs(1));
    let stage = stage_with(host, None);
    let cancel = CancellationToken::new();

    let (result, _) = tokio::join!(stage.orchestrator.switch_to("forest", &cancel), async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(stage.tracker.is_loading());
        assert_eq!(stage.orchestrator.state(), SwitchState::LoadingResources);
        cancel.cancel();
    });

    assert_eq!(result, Err(SceneError::Cancelled("forest".to_string())));
    assert!(!stage.tracker.is_loading());
    assert_eq!(stage.tracker.active_count(), 0);
    assert_eq!(stage.tracker.foreground_count(), 0);
    assert_eq!(stage.provider.cached_count(), 0);
    assert_eq!(stage.provider.stats().failed_loads, 0);
    assert_eq!(stage.orchestrator.current_scene(), None);
    assert_eq!(stage.orchestrator.state(), SwitchState::Idle);
    assert_eq!(loaded_keys(&stage.host), vec!["boot"]);

    let log = stage.log.lock();
    assert!(log.contains(&"scope_closed".to_string()));
    assert!(log.contains(&"reset".to_string()));
    assert!(!log.iter().any(|entry| entry.starts_with("completed")));
}

#[tokio::test(start_paused = true)]
async fn test_failed_load_is_returned_and_scope_closed() {
    let stage = stage();
    let failures = Arc::new(Mutex::new(Vec::new()));
    let recorder = failures.clone();
    stage
        .tracker
        .events()
        .subscribe::<LoadingFailed, _>(move |e| recorder.lock().push(e.message.clone()));
    stage.host.fail_next_loads("forest", 1);
    let cancel = CancellationToken::new();

    let result = stage.orchestrator.switch_to("forest", &cancel).await;

    assert!(matches!(
        result,
        Err(SceneError::Resource(ResourceError::LoadFailed { .. }))
    ));
    assert!(!stage.tracker.is_loading());
    assert_eq!(failures.lock().len(), 1);
    assert!(stage.log.lock().contains(&"reset".to_string()));
    assert_eq!(stage.orchestrator.current_scene(), None);

    stage.orchestrator.switch_to("forest", &cancel).await.unwrap();
    assert_eq!(stage.orchestrator.current_scene().as_deref(), Some("forest"));
}

#[tokio::test(start_paused = true)]
async fn test_missing_scene() {
    let stage = stage();

    let result = stage
        .orchestrator
        .switch_to("dungeon", &CancellationToken::new())
        .await;

    assert_eq!(
        result,
        Err(SceneError::Resource(ResourceError::NotFound("dungeon".to_string())))
    );
    assert!(!stage.tracker.is_loading());
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_switch_is_rejected() {
    let stage = stage();
    let cancel = CancellationToken::new();

    let (first, second) = tokio::join!(stage.orchestrator.switch_to("forest", &cancel), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        stage.orchestrator.switch_to("castle", &cancel).await
    });

    assert!(first.is_ok());
    assert_eq!(
        second,
        Err(SceneError::SwitchInProgress {
            requested: "castle".to_string(),
            active: "forest".to_string(),
        })
    );
    assert_eq!(stage.orchestrator.current_scene().as_deref(), Some("forest"));
    assert!(!stage.orchestrator.is_switching());
}

#[tokio::test(start_paused = true)]
async fn test_reload_current() {
    let stage = stage();
    let cancel = CancellationToken::new();

    assert_eq!(
        stage.orchestrator.reload_current(&cancel).await,
        Err(SceneError::NoCurrentScene)
    );

    stage.orchestrator.switch_to("forest", &cancel).await.unwrap();
    stage.orchestrator.reload_current(&cancel).await.unwrap();

    assert_eq!(stage.host.scene_load_calls("forest"), 2);
    assert_eq!(stage.host.scene_unload_calls("forest"), 1);
    assert_eq!(loaded_keys(&stage.host), vec!["boot", "forest"]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_releases_everything() {
    let stage = stage();
    let cancel = CancellationToken::new();

    stage.orchestrator.switch_to("forest", &cancel).await.unwrap();
    stage.provider.load_asset::<u32>("ui/icon", &cancel).await.unwrap();

    stage.orchestrator.shutdown().await.unwrap();

    assert_eq!(stage.orchestrator.current_scene(), None);
    assert_eq!(stage.provider.cached_count(), 0);
    assert_eq!(stage.host.asset_release_calls("ui/icon"), 1);
    assert_eq!(loaded_keys(&stage.host), vec!["boot"]);
}

#[tokio::test(start_paused = true)]
async fn test_fade_switch_leaves_overlay_resting() {
    let config = TransitionConfig {
        mode: TransitionMode::Fade,
        ..Default::default()
    };
    let layer = Arc::new(OverlayLayer::new(config.sorting_order));
    let selector = TransitionSelector::standard(
        TransitionContext::realtime(layer.clone(), config.frame_interval()),
        &config,
    );
    let stage = stage_with(default_host(), Some(selector.resolve(&config)));

    let progress = Arc::new(Mutex::new(0.0f32));
    let recorder = progress.clone();
    stage
        .tracker
        .events()
        .subscribe::<LoadingStateChanged, _>(move |LoadingStateChanged(state)| {
            let mut max = recorder.lock();
            *max = max.max(state.progress);
        });

    stage
        .orchestrator
        .switch_to("forest", &CancellationToken::new())
        .await
        .unwrap();

    assert!(layer.current().is_resting());
    assert_eq!(layer.peak_alpha(), 1.0);
    assert_eq!(*progress.lock(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_fade_out_skips_load() {
    let config = TransitionConfig::default();
    let layer = Arc::new(OverlayLayer::new(config.sorting_order));
    let selector = TransitionSelector::standard(
        TransitionContext::realtime(layer.clone(), config.frame_interval()),
        &config,
    );
    let stage = stage_with(default_host(), Some(selector.resolve(&config)));
    let cancel = CancellationToken::new();

    let (result, _) = tokio::join!(stage.orchestrator.switch_to("forest", &cancel), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(stage.host.scene_load_calls("forest"), 0);
    assert!(layer.current().is_resting());
    assert!(!stage.tracker.is_loading());
}

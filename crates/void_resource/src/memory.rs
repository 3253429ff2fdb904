//! In-memory host engine
//!
//! A [`ResourceHost`] backed by tables registered up front. Used by the
//! runtime demo and by tests: it simulates latency, counts every call and can
//! be told to fail.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use void_core::{IdGenerator, ProgressSink};

use crate::error::HostError;
use crate::handle::{InstanceId, SceneId, SceneLoadMode};
use crate::host::{AssetObject, ResourceHost};

/// Number of progress steps a simulated scene load reports
const SCENE_LOAD_STEPS: u32 = 4;

#[derive(Clone)]
struct SceneEntry {
    latency: Duration,
}

/// Call counters
#[derive(Debug, Clone, Default)]
struct Counters {
    asset_loads: HashMap<String, usize>,
    asset_releases: HashMap<String, usize>,
    scene_loads: HashMap<String, usize>,
    scene_unloads: HashMap<String, usize>,
    released_instances: usize,
}

/// A loaded scene as the host sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedScene {
    pub id: SceneId,
    pub key: String,
    pub active: bool,
}

/// In-memory host engine
pub struct MemoryHost {
    assets: Mutex<HashMap<String, AssetObject>>,
    scenes: Mutex<HashMap<String, SceneEntry>>,
    failures: Mutex<HashMap<String, usize>>,
    loaded: Mutex<Vec<LoadedScene>>,
    instances: Mutex<HashMap<InstanceId, String>>,
    counters: Mutex<Counters>,
    ids: IdGenerator,
    latency: Duration,
}

impl MemoryHost {
    /// Create an empty host; loads take `latency`
    pub fn new(latency: Duration) -> Self {
        Self {
            assets: Mutex::new(HashMap::new()),
            scenes: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            loaded: Mutex::new(Vec::new()),
            instances: Mutex::new(HashMap::new()),
            counters: Mutex::new(Counters::default()),
            ids: IdGenerator::new(),
            latency,
        }
    }

    /// Register an asset
    pub fn with_asset<T: Send + Sync + 'static>(self, key: impl Into<String>, value: T) -> Self {
        self.assets.lock().insert(key.into(), Arc::new(value));
        self
    }

    /// Register a scene that loads with the host's default latency
    pub fn with_scene(self, key: impl Into<String>) -> Self {
        let latency = self.latency;
        self.with_scene_latency(key, latency)
    }

    /// Register a scene with its own load latency
    pub fn with_scene_latency(self, key: impl Into<String>, latency: Duration) -> Self {
        self.scenes.lock().insert(key.into(), SceneEntry { latency });
        self
    }

    /// Start with `key` already loaded and active, as a bootstrap scene would be
    pub fn with_resident_scene(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.scenes.lock().entry(key.clone()).or_insert(SceneEntry {
            latency: self.latency,
        });
        self.loaded.lock().push(LoadedScene {
            id: SceneId(self.ids.next()),
            key,
            active: true,
        });
        self
    }

    /// Make the next `count` loads of `key` (asset or scene) fail
    pub fn fail_next_loads(&self, key: impl Into<String>, count: usize) {
        self.failures.lock().insert(key.into(), count);
    }

    /// Number of host acquisitions started for `key`
    pub fn asset_load_calls(&self, key: &str) -> usize {
        self.counters.lock().asset_loads.get(key).copied().unwrap_or(0)
    }

    /// Number of references given back for `key`
    pub fn asset_release_calls(&self, key: &str) -> usize {
        self.counters.lock().asset_releases.get(key).copied().unwrap_or(0)
    }

    /// Number of scene loads started for `key`
    pub fn scene_load_calls(&self, key: &str) -> usize {
        self.counters.lock().scene_loads.get(key).copied().unwrap_or(0)
    }

    /// Number of completed unloads of scenes loaded from `key`
    pub fn scene_unload_calls(&self, key: &str) -> usize {
        self.counters.lock().scene_unloads.get(key).copied().unwrap_or(0)
    }

    /// Number of destroyed instances
    pub fn released_instance_count(&self) -> usize {
        self.counters.lock().released_instances
    }

    /// Scenes currently loaded, in load order
    pub fn loaded_scenes(&self) -> Vec<LoadedScene> {
        self.loaded.lock().clone()
    }

    /// Number of live spawned instances
    pub fn live_instance_count(&self) -> usize {
        self.instances.lock().len()
    }

    fn take_failure(&self, key: &str) -> bool {
        let mut failures = self.failures.lock();
        match failures.get_mut(key) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn lookup_asset(&self, key: &str) -> Result<AssetObject, HostError> {
        *self
            .counters
            .lock()
            .asset_loads
            .entry(key.to_string())
            .or_default() += 1;

        if self.take_failure(key) {
            return Err(HostError::Failed(format!("simulated failure loading '{}'", key)));
        }
        self.assets
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| HostError::NotFound(key.to_string()))
    }
}

/// Sleep for `duration` unless `cancel` fires first
async fn simulate(duration: Duration, cancel: &CancellationToken) -> Result<(), HostError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(HostError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

#[async_trait]
impl ResourceHost for MemoryHost {
    async fn load_asset(&self, key: &str, cancel: CancellationToken) -> Result<AssetObject, HostError> {
        let lookup = self.lookup_asset(key);
        simulate(self.latency, &cancel).await?;
        lookup
    }

    fn load_asset_blocking(&self, key: &str) -> Result<AssetObject, HostError> {
        self.lookup_asset(key)
    }

    fn release_asset(&self, key: &str) {
        *self
            .counters
            .lock()
            .asset_releases
            .entry(key.to_string())
            .or_default() += 1;
    }

    async fn instantiate(&self, key: &str, cancel: CancellationToken) -> Result<InstanceId, HostError> {
        if !self.assets.lock().contains_key(key) {
            return Err(HostError::NotFound(key.to_string()));
        }
        simulate(self.latency, &cancel).await?;

        let instance = InstanceId(self.ids.next());
        self.instances.lock().insert(instance, key.to_string());
        Ok(instance)
    }

    fn release_instance(&self, instance: InstanceId) {
        if self.instances.lock().remove(&instance).is_some() {
            self.counters.lock().released_instances += 1;
        }
    }

    async fn load_scene(
        &self,
        key: &str,
        mode: SceneLoadMode,
        activate_on_load: bool,
        progress: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> Result<SceneId, HostError> {
        *self
            .counters
            .lock()
            .scene_loads
            .entry(key.to_string())
            .or_default() += 1;

        let entry = self.scenes.lock().get(key).cloned();
        let entry = entry.ok_or_else(|| HostError::NotFound(key.to_string()))?;
        if self.take_failure(key) {
            return Err(HostError::Failed(format!("simulated failure loading scene '{}'", key)));
        }

        let step = entry.latency / SCENE_LOAD_STEPS;
        for i in 1..=SCENE_LOAD_STEPS {
            simulate(step, &cancel).await?;
            progress.report(i as f32 / SCENE_LOAD_STEPS as f32);
        }

        let id = SceneId(self.ids.next());
        let mut loaded = self.loaded.lock();
        if mode == SceneLoadMode::Single {
            loaded.clear();
        }
        if activate_on_load {
            for scene in loaded.iter_mut() {
                scene.active = false;
            }
        }
        loaded.push(LoadedScene {
            id,
            key: key.to_string(),
            active: activate_on_load,
        });

        Ok(id)
    }

    async fn unload_scene(&self, scene: SceneId, cancel: CancellationToken) -> Result<(), HostError> {
        simulate(self.latency, &cancel).await?;

        let mut loaded = self.loaded.lock();
        let position = loaded
            .iter()
            .position(|s| s.id == scene)
            .ok_or_else(|| HostError::NotFound(scene.to_string()))?;
        let removed = loaded.remove(position);
        drop(loaded);

        *self
            .counters
            .lock()
            .scene_unloads
            .entry(removed.key)
            .or_default() += 1;
        Ok(())
    }

    fn loaded_scene_count(&self) -> usize {
        self.loaded.lock().len()
    }
}

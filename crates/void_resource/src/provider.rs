//! Resource provider
//!
//! Wraps a [`ResourceHost`] with a per-key acquisition cache. Each cache
//! entry holds one shared in-flight (or completed) load; callers join it
//! instead of starting their own, and the entry owns exactly one host
//! reference once the load succeeds.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use void_core::ProgressSink;

use crate::error::{ResourceError, ResourceResult};
use crate::handle::{InstanceId, SceneHandle, SceneId, SceneLoadMode};
use crate::host::{AssetObject, ResourceHost};
use crate::scene::SceneProvider;

type LoadOutput = Result<AssetObject, ResourceError>;
type SharedLoad = Shared<BoxFuture<'static, LoadOutput>>;

/// Cache entry for one key
struct CacheEntry {
    /// Distinguishes this entry from a later one for the same key
    generation: u64,
    load: SharedLoad,
    /// Callers currently awaiting `load`
    waiters: usize,
    /// Set once any caller observed success
    ready: bool,
    /// Aborts the host operation
    cancel: CancellationToken,
}

impl CacheEntry {
    fn is_loaded(&self) -> bool {
        self.ready || matches!(self.load.peek(), Some(Ok(_)))
    }
}

/// How a waiter left an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Failed,
    Cancelled,
}

/// Resource loading statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceStats {
    /// Requests served by an existing entry
    pub cache_hits: u64,
    /// Requests that started a new entry
    pub cache_misses: u64,
    /// Acquisitions started on the host
    pub host_acquisitions: u64,
    /// Acquisitions that failed
    pub failed_loads: u64,
    /// Acquisitions aborted because every caller cancelled
    pub cancelled_loads: u64,
    /// Cache entries released back to the host
    pub released: u64,
}

/// Result of a [`ResourceProvider::preload`] pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadReport {
    /// Keys acquired by this pass
    pub loaded: usize,
    /// Keys already cached
    pub skipped: usize,
    /// Keys whose acquisition failed
    pub failed: usize,
    /// The pass stopped early on cancellation
    pub cancelled: bool,
}

/// Cached, cancellable resource acquisition
pub struct ResourceProvider {
    host: Arc<dyn ResourceHost>,
    cache: Mutex<HashMap<String, CacheEntry>>,
    scenes: Mutex<HashMap<SceneId, SceneHandle>>,
    instances: Mutex<HashMap<InstanceId, String>>,
    generations: AtomicU64,
    stats: Mutex<ResourceStats>,
}

impl ResourceProvider {
    /// Create a provider over `host`
    pub fn new(host: Arc<dyn ResourceHost>) -> Self {
        Self {
            host,
            cache: Mutex::new(HashMap::new()),
            scenes: Mutex::new(HashMap::new()),
            instances: Mutex::new(HashMap::new()),
            generations: AtomicU64::new(1),
            stats: Mutex::new(ResourceStats::default()),
        }
    }

    /// The wrapped host
    pub fn host(&self) -> &Arc<dyn ResourceHost> {
        &self.host
    }

    /// Load a typed asset
    ///
    /// Concurrent calls for the same key share one host acquisition.
    pub async fn load_asset<T: Any + Send + Sync>(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> ResourceResult<Arc<T>> {
        let object = self.load_asset_object(key, cancel).await?;
        downcast(key, object)
    }

    /// Load an asset without downcasting it
    ///
    /// Cancelling `cancel` abandons this caller's wait. The host acquisition
    /// itself is aborted and evicted only if no other caller is still waiting.
    pub async fn load_asset_object(&self, key: &str, cancel: &CancellationToken) -> LoadOutput {
        if cancel.is_cancelled() {
            return Err(ResourceError::Cancelled(key.to_string()));
        }

        let (generation, load) = self.join_or_start(key);
        let waiter = Waiter::new(self, key, generation);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ResourceError::Cancelled(key.to_string())),
            result = load => result,
        };

        waiter.finish(&result);
        result
    }

    /// Load a typed asset, blocking the calling thread
    ///
    /// Follows the same caching rules as [`load_asset`](Self::load_asset).
    /// Joining an acquisition that is in flight blocks until it completes, so
    /// this must not be called from a thread the host needs to make progress.
    pub fn load_asset_sync<T: Any + Send + Sync>(&self, key: &str) -> ResourceResult<Arc<T>> {
        let joined = {
            let mut cache = self.cache.lock();
            match cache.get_mut(key) {
                Some(entry) => {
                    entry.waiters += 1;
                    self.stats.lock().cache_hits += 1;
                    Some((entry.generation, entry.load.clone()))
                }
                None => None,
            }
        };

        let object = match joined {
            Some((generation, load)) => {
                let waiter = Waiter::new(self, key, generation);
                let result = pollster::block_on(load);
                waiter.finish(&result);
                result?
            }
            None => self.load_blocking_uncached(key)?,
        };

        downcast(key, object)
    }

    /// Warm the cache one key at a time
    ///
    /// Best effort: failures are logged and skipped, keys already cached are
    /// skipped, and the pass stops at the first cancellation.
    pub async fn preload<S: AsRef<str> + Sync>(&self, keys: &[S], cancel: &CancellationToken) -> PreloadReport {
        let mut report = PreloadReport::default();

        for key in keys {
            let key = key.as_ref();
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            if self.is_cached(key) {
                report.skipped += 1;
                continue;
            }

            match self.load_asset_object(key, cancel).await {
                Ok(_) => report.loaded += 1,
                Err(e) if e.is_cancelled() => {
                    report.cancelled = true;
                    break;
                }
                Err(e) => {
                    log::warn!("Preload of '{}' failed: {}", key, e);
                    report.failed += 1;
                }
            }
        }

        log::debug!(
            "Preload finished: {} loaded, {} skipped, {} failed{}",
            report.loaded,
            report.skipped,
            report.failed,
            if report.cancelled { " (cancelled)" } else { "" }
        );
        report
    }

    /// Spawn a tracked instance
    pub async fn instantiate(&self, key: &str, cancel: &CancellationToken) -> ResourceResult<InstanceId> {
        if cancel.is_cancelled() {
            return Err(ResourceError::Cancelled(key.to_string()));
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ResourceError::Cancelled(key.to_string())),
            result = self.host.instantiate(key, cancel.child_token()) => {
                result.map_err(|e| ResourceError::from_host(key, e))
            }
        };

        let instance = result?;
        self.instances.lock().insert(instance, key.to_string());
        log::debug!("Spawned {} from '{}'", instance, key);
        Ok(instance)
    }

    /// Destroy a tracked instance
    ///
    /// Returns `false` for instances this provider does not track.
    pub fn release_instance(&self, instance: InstanceId) -> bool {
        if self.instances.lock().remove(&instance).is_none() {
            log::debug!("Ignoring release of untracked {}", instance);
            return false;
        }
        self.host.release_instance(instance);
        true
    }

    /// Release the cache entry for `key`
    ///
    /// A completed entry gives its host reference back; an in-flight one is
    /// aborted. Returns `false` if nothing was cached.
    pub fn release(&self, key: &str) -> bool {
        let entry = self.cache.lock().remove(key);
        match entry {
            Some(entry) => {
                self.release_entry(key, entry);
                true
            }
            None => {
                log::debug!("Ignoring release of uncached '{}'", key);
                false
            }
        }
    }

    /// Check if `key` has a cache entry (in flight or completed)
    pub fn is_cached(&self, key: &str) -> bool {
        self.cache.lock().contains_key(key)
    }

    /// Number of cache entries
    pub fn cached_count(&self) -> usize {
        self.cache.lock().len()
    }

    /// Number of tracked instances
    pub fn instance_count(&self) -> usize {
        self.instances.lock().len()
    }

    /// Loading statistics
    pub fn stats(&self) -> ResourceStats {
        self.stats.lock().clone()
    }

    fn join_or_start(&self, key: &str) -> (u64, SharedLoad) {
        let mut cache = self.cache.lock();

        if let Some(entry) = cache.get_mut(key) {
            entry.waiters += 1;
            self.stats.lock().cache_hits += 1;
            log::trace!("Joining cached acquisition of '{}' ({} waiting)", key, entry.waiters);
            return (entry.generation, entry.load.clone());
        }

        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();

        let host = self.host.clone();
        let owned_key = key.to_string();
        let token = cancel.clone();
        let load = async move {
            host.load_asset(&owned_key, token)
                .await
                .map_err(|e| ResourceError::from_host(&owned_key, e))
        }
        .boxed()
        .shared();

        cache.insert(
            key.to_string(),
            CacheEntry {
                generation,
                load: load.clone(),
                waiters: 1,
                ready: false,
                cancel,
            },
        );

        let mut stats = self.stats.lock();
        stats.cache_misses += 1;
        stats.host_acquisitions += 1;
        log::debug!("Started acquisition of '{}'", key);

        (generation, load)
    }

    fn load_blocking_uncached(&self, key: &str) -> LoadOutput {
        {
            let mut stats = self.stats.lock();
            stats.cache_misses += 1;
            stats.host_acquisitions += 1;
        }

        let object = match self.host.load_asset_blocking(key) {
            Ok(object) => object,
            Err(e) => {
                self.stats.lock().failed_loads += 1;
                let error = ResourceError::from_host(key, e);
                log::warn!("Blocking acquisition failed: {}", error);
                return Err(error);
            }
        };

        let mut cache = self.cache.lock();
        if cache.contains_key(key) {
            // Another caller cached the key meanwhile; give our reference back
            drop(cache);
            self.host.release_asset(key);
            return Ok(object);
        }

        let ready: SharedLoad = future::ready(Ok(object.clone())).boxed().shared();
        cache.insert(
            key.to_string(),
            CacheEntry {
                generation: self.generations.fetch_add(1, Ordering::Relaxed),
                load: ready,
                waiters: 0,
                ready: true,
                cancel: CancellationToken::new(),
            },
        );
        Ok(object)
    }

    /// Called once per waiter when it stops waiting
    fn leave(&self, key: &str, generation: u64, outcome: Outcome) {
        let mut cache = self.cache.lock();
        let Some(entry) = cache.get_mut(key) else {
            return;
        };
        if entry.generation != generation {
            return;
        }

        entry.waiters = entry.waiters.saturating_sub(1);
        let evict = match outcome {
            Outcome::Completed => {
                entry.ready = true;
                false
            }
            Outcome::Failed => true,
            Outcome::Cancelled => entry.waiters == 0 && !entry.is_loaded(),
        };

        if !evict {
            return;
        }

        if let Some(entry) = cache.remove(key) {
            entry.cancel.cancel();
            let mut stats = self.stats.lock();
            match outcome {
                Outcome::Failed => {
                    stats.failed_loads += 1;
                    log::debug!("Evicted failed acquisition of '{}'", key);
                }
                _ => {
                    stats.cancelled_loads += 1;
                    log::debug!("Aborted acquisition of '{}': no callers left", key);
                }
            }
        }
    }

    fn release_entry(&self, key: &str, entry: CacheEntry) {
        if entry.is_loaded() {
            self.host.release_asset(key);
            self.stats.lock().released += 1;
            log::debug!("Released '{}'", key);
        } else {
            entry.cancel.cancel();
            log::debug!("Aborted in-flight acquisition of '{}' on release", key);
        }
    }
}

#[async_trait]
impl SceneProvider for ResourceProvider {
    async fn load_scene(
        &self,
        key: &str,
        mode: SceneLoadMode,
        activate_on_load: bool,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> ResourceResult<SceneHandle> {
        if cancel.is_cancelled() {
            return Err(ResourceError::Cancelled(key.to_string()));
        }

        log::debug!("Loading scene '{}' ({:?}, activate={})", key, mode, activate_on_load);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ResourceError::Cancelled(key.to_string())),
            result = self.host.load_scene(key, mode, activate_on_load, progress, cancel.child_token()) => {
                result.map_err(|e| ResourceError::from_host(key, e))
            }
        };

        let id = result?;
        progress.report(1.0);

        let handle = SceneHandle::new(id, key, mode);
        let mut scenes = self.scenes.lock();
        if mode == SceneLoadMode::Single && !scenes.is_empty() {
            // The host replaced every other scene
            log::debug!("Single load of '{}' invalidated {} scene handle(s)", key, scenes.len());
            scenes.clear();
        }
        scenes.insert(id, handle.clone());

        Ok(handle)
    }

    async fn unload_scene(&self, handle: &SceneHandle, cancel: &CancellationToken) -> ResourceResult<()> {
        if !self.is_scene_loaded(handle) {
            log::debug!("Scene {} is no longer loaded; nothing to unload", handle);
            return Ok(());
        }
        if cancel.is_cancelled() {
            return Err(ResourceError::Cancelled(handle.key().to_string()));
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ResourceError::Cancelled(handle.key().to_string())),
            result = self.host.unload_scene(handle.id(), cancel.child_token()) => {
                result.map_err(|e| match ResourceError::from_host(handle.key(), e) {
                    ResourceError::LoadFailed { key, reason } => ResourceError::UnloadFailed { key, reason },
                    other => other,
                })
            }
        };

        result?;
        self.scenes.lock().remove(&handle.id());
        log::debug!("Unloaded scene {}", handle);
        Ok(())
    }

    fn loaded_scene_count(&self) -> usize {
        self.host.loaded_scene_count()
    }

    fn is_scene_loaded(&self, handle: &SceneHandle) -> bool {
        self.scenes.lock().contains_key(&handle.id())
    }

    fn clear(&self) {
        let entries: Vec<(String, CacheEntry)> = self.cache.lock().drain().collect();
        let instances: Vec<InstanceId> = self.instances.lock().drain().map(|(id, _)| id).collect();

        let entry_count = entries.len();
        let instance_count = instances.len();

        for (key, entry) in entries {
            self.release_entry(&key, entry);
        }
        for instance in instances {
            self.host.release_instance(instance);
        }

        log::info!(
            "Resource provider cleared: {} cache entries, {} instances",
            entry_count,
            instance_count
        );
    }
}

impl std::fmt::Debug for ResourceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceProvider")
            .field("cached", &self.cached_count())
            .field("scenes", &self.scenes.lock().len())
            .field("instances", &self.instance_count())
            .finish()
    }
}

/// One caller's interest in a cache entry
///
/// Dropping a waiter without [`finish`](Waiter::finish) (the caller's future
/// was dropped mid-await) counts as cancellation.
struct Waiter<'a> {
    provider: &'a ResourceProvider,
    key: &'a str,
    generation: u64,
    done: bool,
}

impl<'a> Waiter<'a> {
    fn new(provider: &'a ResourceProvider, key: &'a str, generation: u64) -> Self {
        Self {
            provider,
            key,
            generation,
            done: false,
        }
    }

    fn finish(mut self, result: &LoadOutput) {
        self.done = true;
        let outcome = match result {
            Ok(_) => Outcome::Completed,
            Err(e) if e.is_cancelled() => Outcome::Cancelled,
            Err(_) => Outcome::Failed,
        };
        self.provider.leave(self.key, self.generation, outcome);
    }
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.provider.leave(self.key, self.generation, Outcome::Cancelled);
        }
    }
}

fn downcast<T: Any + Send + Sync>(key: &str, object: AssetObject) -> ResourceResult<Arc<T>> {
    object.downcast::<T>().map_err(|_| ResourceError::TypeMismatch {
        key: key.to_string(),
        expected: std::any::type_name::<T>(),
    })
}

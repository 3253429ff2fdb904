//! Scene ready rendezvous
//!
//! A freshly loaded scene may need a few frames (or a network round trip)
//! before it is presentable. It registers a [`SceneReadyHandler`] here and the
//! orchestrator awaits it before revealing the scene. With nothing registered
//! the scene counts as ready immediately.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Announces when a scene is visually ready
#[async_trait]
pub trait SceneReadyHandler: Send + Sync {
    /// Suspend until the scene is ready, or until `cancel` fires
    async fn wait_until_ready(&self, cancel: &CancellationToken);
}

/// Single-slot handler registry
#[derive(Default)]
pub struct SceneReadyRegistry {
    slot: Mutex<Option<Arc<dyn SceneReadyHandler>>>,
}

impl SceneReadyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `handler` the active handler, replacing any previous one
    pub fn register(&self, handler: Arc<dyn SceneReadyHandler>) {
        let previous = self.slot.lock().replace(handler);
        if previous.is_some() {
            log::debug!("Scene ready handler replaced");
        }
    }

    /// Clear the slot if `handler` is the active handler
    ///
    /// A handler that was replaced in the meantime leaves the newer
    /// registration alone. Returns whether anything was cleared.
    pub fn unregister(&self, handler: &Arc<dyn SceneReadyHandler>) -> bool {
        let mut slot = self.slot.lock();
        match slot.as_ref() {
            Some(current) if same_handler(current, handler) => {
                *slot = None;
                true
            }
            _ => {
                log::debug!("Ignoring unregister of a handler that is not active");
                false
            }
        }
    }

    /// The active handler
    pub fn current(&self) -> Option<Arc<dyn SceneReadyHandler>> {
        self.slot.lock().clone()
    }

    /// Check if `handler` is the active handler
    pub fn is_registered(&self, handler: &Arc<dyn SceneReadyHandler>) -> bool {
        self.slot
            .lock()
            .as_ref()
            .map_or(false, |current| same_handler(current, handler))
    }
}

impl std::fmt::Debug for SceneReadyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneReadyRegistry")
            .field("registered", &self.slot.lock().is_some())
            .finish()
    }
}

/// Compare by data address; vtable pointers are not unique per type
fn same_handler(a: &Arc<dyn SceneReadyHandler>, b: &Arc<dyn SceneReadyHandler>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// A handler a scene marks ready by hand
#[derive(Debug)]
pub struct ReadySignal {
    ready: watch::Sender<bool>,
}

impl ReadySignal {
    pub fn new() -> Self {
        let (ready, _) = watch::channel(false);
        Self { ready }
    }

    /// Wake every waiter; later waits return immediately
    pub fn mark_ready(&self) {
        self.ready.send_replace(true);
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SceneReadyHandler for ReadySignal {
    async fn wait_until_ready(&self, cancel: &CancellationToken) {
        let mut ready = self.ready.subscribe();
        loop {
            let is_ready = *ready.borrow_and_update();
            if is_ready {
                return;
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                changed = ready.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

//! # void_event - Typed Event Hub
//!
//! Publish/subscribe for lifecycle notifications:
//! - Typed events (any `Send + Sync + 'static` value)
//! - Immediate delivery with [`EventBus::emit`]: subscribers have run by the
//!   time `emit` returns
//! - Priority-ordered handlers
//!
//! Handlers are invoked without any internal lock held, so a handler may
//! subscribe, unsubscribe or emit further events.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use void_core::{Id, IdGenerator};

/// Handler priority
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// Trait for events
pub trait Event: Send + Sync + 'static {}

// Blanket implementation
impl<T: Send + Sync + 'static> Event for T {}

/// Type-erased handler
type DynamicHandler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub Id);

struct Subscription {
    id: SubscriberId,
    priority: Priority,
    handler: DynamicHandler,
}

/// Event hub shared by the components of one application
pub struct EventBus {
    handlers: RwLock<BTreeMap<TypeId, Vec<Subscription>>>,
    ids: IdGenerator,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(BTreeMap::new()),
            ids: IdGenerator::new(),
        }
    }

    /// Subscribe to an event type
    pub fn subscribe<E: Event, F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe_with_priority::<E, F>(handler, Priority::Normal)
    }

    /// Subscribe with priority
    ///
    /// Higher priorities are called first; equal priorities keep
    /// subscription order.
    pub fn subscribe_with_priority<E: Event, F>(&self, handler: F, priority: Priority) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.ids.next());
        let wrapped: DynamicHandler = Arc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                handler(event);
            }
        });

        let mut handlers = self.handlers.write();
        let list = handlers.entry(TypeId::of::<E>()).or_default();
        list.push(Subscription {
            id,
            priority,
            handler: wrapped,
        });
        // Stable sort keeps subscription order within a priority
        list.sort_by(|a, b| b.priority.cmp(&a.priority));

        id
    }

    /// Unsubscribe
    ///
    /// Returns `false` if the subscriber was not found.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut removed = false;
        for list in self.handlers.write().values_mut() {
            let before = list.len();
            list.retain(|sub| sub.id != id);
            removed |= list.len() != before;
        }
        removed
    }

    /// Deliver an event to its subscribers right now
    pub fn emit<E: Event>(&self, event: E) {
        let handlers: Vec<DynamicHandler> = match self.handlers.read().get(&TypeId::of::<E>()) {
            Some(list) => list.iter().map(|sub| sub.handler.clone()).collect(),
            None => return,
        };

        for handler in handlers {
            handler(&event);
        }
    }

    /// Number of handlers subscribed to `E`
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.handlers
            .read()
            .get(&TypeId::of::<E>())
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("event_types", &self.handlers.read().len())
            .finish()
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{Event, EventBus, Priority, SubscriberId};
}

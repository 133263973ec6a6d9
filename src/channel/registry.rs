//! Subscriber registry
//!
//! Handlers are kept in registration order. Each registration gets its own
//! token, so two identical closures can be removed independently.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::message::UpdateMessage;

/// Callback invoked for every decoded message
pub type Handler = Arc<dyn Fn(&UpdateMessage) + Send + Sync>;

/// Identifier of a single registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub_{}", self.0)
    }
}

#[derive(Default)]
struct Entries {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler)>,
}

/// Ordered list of message handlers
#[derive(Default)]
pub struct SubscriberRegistry {
    entries: Mutex<Entries>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler and return the token that removes it
    pub fn subscribe(self: &Arc<Self>, handler: Handler) -> Subscription {
        let mut entries = self.entries.lock();
        let id = SubscriptionId(entries.next_id);
        entries.next_id += 1;
        entries.handlers.push((id, handler));

        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    /// Remove one registration. Returns false if it was already gone.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock();
        match entries.handlers.iter().position(|(entry_id, _)| *entry_id == id) {
            Some(index) => {
                entries.handlers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Handlers registered right now, in notification order
    pub fn snapshot(&self) -> Vec<Handler> {
        self.entries
            .lock()
            .handlers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unsubscribe capability returned by `subscribe`
///
/// Dropping the token keeps the handler registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<SubscriberRegistry>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove exactly this registration
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(self.id),
            None => false,
        }
    }
}

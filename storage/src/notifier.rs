//! Change notification
//!
//! Writers publish which collections changed; subscribers re-read what they
//! care about. Events reach subscribers in the publishing context directly
//! and other contexts through a shared [`ChangeBus`].

use parking_lot::Mutex;
use scholar_core::{now_millis, Collection};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default broadcast capacity
pub const BUS_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Context id of the publisher.
    pub origin: String,
    pub collections: Vec<Collection>,
    pub timestamp: i64,
}

impl ChangeEvent {
    pub fn new(origin: impl Into<String>, collections: &[Collection]) -> Self {
        Self {
            origin: origin.into(),
            collections: collections.to_vec(),
            timestamp: now_millis(),
        }
    }

    /// Event naming every collection; used when the exact change is unknown.
    pub fn everything(origin: impl Into<String>) -> Self {
        Self::new(origin, &Collection::ALL)
    }

    pub fn touches(&self, collection: Collection) -> bool {
        self.collections.contains(&collection)
    }
}

/// Message bus shared by every context attached to the same backend.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(BUS_CAPACITY)
    }
}

type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

fn dispatch(listeners: &Mutex<Listeners>, event: &ChangeEvent) {
    // Snapshot so callbacks may subscribe or unsubscribe while running
    let callbacks: Vec<Callback> = listeners
        .lock()
        .callbacks
        .iter()
        .map(|(_, callback)| Arc::clone(callback))
        .collect();

    for callback in callbacks {
        if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
            warn!(origin = %event.origin, "change listener panicked; continuing with remaining listeners");
        }
    }
}

/// Publishes change events for one context.
pub struct ChangeNotifier {
    context_id: String,
    bus: Option<ChangeBus>,
    listeners: Arc<Mutex<Listeners>>,
}

impl ChangeNotifier {
    /// Notifier for a new context, attached to `bus` when given.
    pub fn new(bus: Option<ChangeBus>) -> Self {
        Self {
            context_id: uuid::Uuid::new_v4().to_string(),
            bus,
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    /// Notifier that only reaches subscribers in this context.
    pub fn local() -> Self {
        Self::new(None)
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn bus(&self) -> Option<&ChangeBus> {
        self.bus.as_ref()
    }

    /// Announce that `collections` changed.
    ///
    /// The cross-context send is best effort; same-context subscribers are
    /// always called.
    pub fn publish(&self, collections: &[Collection]) {
        let event = ChangeEvent::new(self.context_id.clone(), collections);

        if let Some(bus) = &self.bus {
            if let Err(e) = bus.sender.send(event.clone()) {
                debug!(error = %e, "no other contexts listening for changes");
            }
        }

        dispatch(&self.listeners, &event);
    }

    /// Register `callback` for every event seen by this context.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.callbacks.push((id, Arc::new(callback)));

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.lock().callbacks.len()
    }

    /// Forward events published by other contexts to this context's
    /// subscribers. Must be called from within a Tokio runtime.
    ///
    /// Returns `None` when the notifier has no bus. The task ends when every
    /// bus sender is gone; abort the handle to stop it earlier.
    pub fn spawn_listener(&self) -> Option<JoinHandle<()>> {
        let mut receiver = self.bus.as_ref()?.subscribe();
        let listeners = Arc::clone(&self.listeners);
        let context_id = self.context_id.clone();

        Some(tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) if event.origin == context_id => continue,
                    Ok(event) => {
                        debug!(origin = %event.origin, collections = ?event.collections, "change from another context");
                        dispatch(&listeners, &event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "change listener lagged; signalling full refresh");
                        dispatch(&listeners, &ChangeEvent::everything(context_id.clone()));
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    }
}

/// Registration returned by [`ChangeNotifier::subscribe`].
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Stop receiving events.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .callbacks
                .retain(|(id, _)| *id != self.id);
        }
    }
}

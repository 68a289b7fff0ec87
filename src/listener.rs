//! Lifecycle listener bus.
//!
//! Observers register to hear about fake players being added and removed.
//! Delivery is synchronous, in registration order, and a failing callback
//! never blocks the ones after it. Registration through the registry also
//! backfills `on_player_add` for every player already active, so a late
//! observer converges to the same view as an early one.

use tracing::{info, warn};

use crate::identity::EntityHandle;

/// External observer of fake-player lifecycle events.
///
/// Callbacks return `Result` so a misbehaving listener has a value-level
/// error for the bus to log; the bus never propagates it.
pub trait FakePlayerListener: Send {
    fn on_player_add(&mut self, entity: EntityHandle) -> anyhow::Result<()>;

    fn on_player_remove(&mut self, entity: EntityHandle) -> anyhow::Result<()>;
}

/// Token identifying a registered listener, used for unregistration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered set of lifecycle listeners
#[derive(Default)]
pub struct ListenerBus {
    entries: Vec<(ListenerId, Box<dyn FakePlayerListener>)>,
    next_id: u64,
}

impl ListenerBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener to the end of the delivery order. Backfill of current
    /// players is the registry's job; the bus has no player state.
    pub fn register(&mut self, listener: Box<dyn FakePlayerListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Drop a listener; returns false if the id was not registered
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deliver an add event to every listener in registration order
    pub fn notify_add(&mut self, entity: EntityHandle) {
        for (id, listener) in self.entries.iter_mut() {
            if let Err(e) = listener.on_player_add(entity) {
                warn!(listener = ?id, %entity, error = %e, "listener on_player_add failed");
            }
        }
    }

    /// Deliver a remove event to every listener in registration order
    pub fn notify_remove(&mut self, entity: EntityHandle) {
        for (id, listener) in self.entries.iter_mut() {
            if let Err(e) = listener.on_player_remove(entity) {
                warn!(listener = ?id, %entity, error = %e, "listener on_player_remove failed");
            }
        }
    }

    /// Deliver the add backfill for one existing player to one listener only
    pub fn backfill(&mut self, id: ListenerId, entity: EntityHandle) {
        if let Some((_, listener)) = self.entries.iter_mut().find(|(entry_id, _)| *entry_id == id)
        {
            if let Err(e) = listener.on_player_add(entity) {
                warn!(listener = ?id, %entity, error = %e, "listener backfill failed");
            }
        }
    }
}

/// Default listener: logs lifecycle events at info
pub struct LogListener;

impl FakePlayerListener for LogListener {
    fn on_player_add(&mut self, entity: EntityHandle) -> anyhow::Result<()> {
        info!(%entity, "fake player added");
        Ok(())
    }

    fn on_player_remove(&mut self, entity: EntityHandle) -> anyhow::Result<()> {
        info!(%entity, "fake player removed");
        Ok(())
    }
}

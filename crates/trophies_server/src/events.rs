//! # Host Event Queue
//!
//! World activity is queued here and drained by the session once per tick.
//!
//! ```text
//! ┌──────────────┐      ┌─────────────┐      ┌──────────────┐
//! │ players,     │─────>│   bounded   │─────>│ HostSession  │
//! │ HostWorld    │      │   channel   │      │ (one thread) │
//! └──────────────┘      └─────────────┘      └──────────────┘
//! ```
//!
//! The pipeline itself stays synchronous: the queue only decouples
//! producers from the thread that runs decisions.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use trophies_core::{ActorId, ItemStack, Location};

/// Default queue capacity.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Something that happened in the world.
#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    /// A player broke the block at `location`.
    BlockBroken {
        /// Breaking player.
        actor: ActorId,
        /// Block position.
        location: Location,
    },

    /// A player tried to place `item` as a block.
    BlockPlaced {
        /// Placing player.
        actor: ActorId,
        /// Item in hand.
        item: ItemStack,
        /// Target position.
        location: Location,
    },

    /// An item entity appeared in the world.
    ItemSpawned {
        /// Item entity id.
        entity: u64,
    },

    /// The config file should be re-read.
    ReloadConfig,
}

/// Bounded host event channel.
pub struct EventBus {
    sender: Sender<HostEvent>,
    receiver: Receiver<HostEvent>,
}

impl EventBus {
    /// Creates a queue holding at most `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// A producer handle.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// A consumer handle.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Producer handle.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<HostEvent>,
}

impl EventSender {
    /// Queues an event without blocking. Returns `false` if it was dropped.
    #[inline]
    pub fn send(&self, event: HostEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(?event, "host event queue full, dropping event");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer handle.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<HostEvent>,
}

impl EventReceiver {
    /// Takes every queued event.
    #[inline]
    pub fn drain(&self) -> Vec<HostEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of queued events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_and_drain_in_order() {
        let bus = EventBus::new(8);
        let sender = bus.sender();
        let receiver = bus.receiver();

        assert!(sender.send(HostEvent::ItemSpawned { entity: 1 }));
        assert!(sender.send(HostEvent::ReloadConfig));
        assert_eq!(receiver.pending_count(), 2);

        let events = receiver.drain();
        assert_eq!(
            events,
            vec![HostEvent::ItemSpawned { entity: 1 }, HostEvent::ReloadConfig]
        );
        assert_eq!(receiver.pending_count(), 0);
    }

    #[test]
    fn test_full_queue_drops() {
        let bus = EventBus::new(1);
        let sender = bus.sender();
        assert!(sender.send(HostEvent::ReloadConfig));
        assert!(!sender.send(HostEvent::ReloadConfig));
    }
}

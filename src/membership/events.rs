//! Lifecycle events and the bus they are delivered through.

use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};

use flume::{Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use crate::common::{PeerId, ProtocolId};
use crate::{Error, Result};

use super::Reachability;

/// Buffer size of the membership subscription.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Lifecycle event published by the host.
pub enum Event {
    /// A peer finished the identify handshake.
    PeerIdentificationCompleted { peer: PeerId },
    /// The set of protocols a peer advertises changed.
    PeerProtocolsUpdated {
        peer: PeerId,
        added: Vec<ProtocolId>,
        removed: Vec<ProtocolId>,
    },
    /// Our own listen addresses changed.
    LocalAddressesUpdated { current: Vec<SocketAddr> },
    /// Our own reachability changed.
    LocalReachabilityChanged { reachability: Reachability },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Type of an [Event], used to subscribe.
pub enum EventKind {
    PeerIdentificationCompleted,
    PeerProtocolsUpdated,
    LocalAddressesUpdated,
    LocalReachabilityChanged,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::PeerIdentificationCompleted { .. } => EventKind::PeerIdentificationCompleted,
            Event::PeerProtocolsUpdated { .. } => EventKind::PeerProtocolsUpdated,
            Event::LocalAddressesUpdated { .. } => EventKind::LocalAddressesUpdated,
            Event::LocalReachabilityChanged { .. } => EventKind::LocalReachabilityChanged,
        }
    }
}

/// Source of lifecycle events.
pub trait EventBus: Send + Sync {
    /// Subscribe to the given kinds, buffering at most `buffer` undelivered events.
    fn subscribe(&self, kinds: &[EventKind], buffer: usize) -> Result<Subscription>;
}

#[derive(Debug)]
/// Receiving end of an [EventBus] subscription.
///
/// The stream ends once the bus drops its sending side. Dropping the subscription
/// unsubscribes.
pub struct Subscription {
    kinds: Vec<EventKind>,
    receiver: Receiver<Event>,
}

impl Subscription {
    pub fn new(kinds: Vec<EventKind>, receiver: Receiver<Event>) -> Self {
        Subscription { kinds, receiver }
    }

    pub fn kinds(&self) -> &[EventKind] {
        &self.kinds
    }

    pub fn receiver(&self) -> &Receiver<Event> {
        &self.receiver
    }

    /// Blocks until the next event, or returns `None` once the bus is gone.
    pub fn recv(&self) -> Option<Event> {
        self.receiver.recv().ok()
    }

    pub fn close(self) {}
}

#[derive(Debug)]
struct Subscriber {
    kinds: Vec<EventKind>,
    sender: Sender<Event>,
}

#[derive(Debug)]
/// Process local [EventBus].
///
/// [InMemoryEventBus::emit] blocks while a matching subscriber's buffer is full.
pub struct InMemoryEventBus {
    subscribers: Mutex<Option<Vec<Subscriber>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        InMemoryEventBus {
            subscribers: Mutex::new(Some(Vec::new())),
        }
    }

    /// Deliver `event` to every subscriber of its kind, returning the number of deliveries.
    pub fn emit(&self, event: Event) -> usize {
        let kind = event.kind();

        let senders: Vec<Sender<Event>> = {
            let mut subscribers = self
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            let Some(subscribers) = subscribers.as_mut() else {
                return 0;
            };

            subscribers.retain(|subscriber| !subscriber.sender.is_disconnected());

            subscribers
                .iter()
                .filter(|subscriber| subscriber.kinds.contains(&kind))
                .map(|subscriber| subscriber.sender.clone())
                .collect()
        };

        let mut delivered = 0;

        for sender in senders {
            let result = match sender.try_send(event.clone()) {
                Err(TrySendError::Full(event)) => {
                    debug!(?kind, "Subscriber is slow, blocking emit");
                    sender.send(event).map_err(|_| ())
                }
                Err(TrySendError::Disconnected(_)) => Err(()),
                Ok(()) => Ok(()),
            };

            if result.is_ok() {
                delivered += 1;
            }
        }

        delivered
    }

    /// Close the bus, ending every subscription and refusing new ones.
    pub fn close(&self) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|subscribers| {
                subscribers
                    .iter()
                    .filter(|subscriber| !subscriber.sender.is_disconnected())
                    .count()
            })
            .unwrap_or_default()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for InMemoryEventBus {
    fn subscribe(&self, kinds: &[EventKind], buffer: usize) -> Result<Subscription> {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(subscribers) = subscribers.as_mut() else {
            warn!("Subscribing to a closed event bus");
            return Err(Error::Subscribe("event bus is closed".to_string()));
        };

        let (sender, receiver) = flume::bounded(buffer.max(1));

        subscribers.push(Subscriber {
            kinds: kinds.to_vec(),
            sender,
        });

        Ok(Subscription::new(kinds.to_vec(), receiver))
    }
}

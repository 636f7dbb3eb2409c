//! Shared routing table and stream map.
//!
//! Lock order: routing table, then stream map, then a single [MessageStream].
//! This module is the only code that holds more than one of them at once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::common::PeerId;

use super::{Connectedness, MessageStream, Network, RoutingTable};

pub struct SharedState {
    routing_table: Mutex<Box<dyn RoutingTable>>,
    streams: Mutex<HashMap<PeerId, Arc<MessageStream>>>,
}

impl SharedState {
    pub fn new(routing_table: Box<dyn RoutingTable>) -> Self {
        SharedState {
            routing_table: Mutex::new(routing_table),
            streams: Mutex::new(HashMap::new()),
        }
    }

    /// Locks the routing table. Hold it across any connectedness check that gates a
    /// membership change.
    pub fn routing_table(&self) -> MutexGuard<'_, Box<dyn RoutingTable>> {
        self.routing_table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn streams(&self) -> MutexGuard<'_, HashMap<PeerId, Arc<MessageStream>>> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the message stream of `peer`, creating an unopened one if there is none.
    pub fn message_stream(&self, peer: &PeerId) -> Arc<MessageStream> {
        self.streams()
            .entry(*peer)
            .or_insert_with(|| Arc::new(MessageStream::new(*peer)))
            .clone()
    }

    pub fn has_message_stream(&self, peer: &PeerId) -> bool {
        self.streams().contains_key(peer)
    }

    /// Drop the map entry of `peer` if it is still `stream`, after `stream` failed to open.
    ///
    /// The caller must not hold the lock of `stream`.
    pub fn forget_message_stream(&self, peer: &PeerId, stream: &Arc<MessageStream>) -> bool {
        let mut streams = self.streams();

        match streams.get(peer) {
            Some(current) if Arc::ptr_eq(current, stream) => {
                streams.remove(peer);
                true
            }
            _ => false,
        }
    }

    /// Forget a peer that the network reports as disconnected.
    ///
    /// Under the routing table lock, re-checks connectedness so a reconnect that raced
    /// the disconnect wins. If the peer is really gone, removes it from the routing
    /// table and takes its stream out of the stream map. The stream is returned
    /// still valid, tearing it down is left to the caller outside of both locks.
    pub fn evict_disconnected(&self, network: &dyn Network, peer: &PeerId) -> Eviction {
        let mut routing_table = self.routing_table();

        if network.connectedness(peer) == Connectedness::Connected {
            return Eviction::StillConnected;
        }

        routing_table.remove_peer(peer);

        let stream = self.streams().remove(peer);

        Eviction::Evicted(stream)
    }
}

#[derive(Debug)]
pub enum Eviction {
    /// The peer reconnected before we got the lock.
    StillConnected,
    /// The peer is gone, with the message stream that still has to be invalidated.
    Evicted(Option<Arc<MessageStream>>),
}

impl std::fmt::Debug for SharedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedState")
            .field("routing_table_size", &self.routing_table().size())
            .field("streams", &self.streams().len())
            .finish()
    }
}

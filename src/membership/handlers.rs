use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, trace};

use crate::common::PeerId;

use super::state::Eviction;
use super::{Connectedness, MembershipContext, Reachability};

impl MembershipContext {
    /// A peer qualifies for the routing table if it supports at least one of our
    /// primary protocols. Secondary protocols alone do not count.
    pub(crate) fn valid_rt_peer(&self, peer: &PeerId) -> crate::Result<bool> {
        let supported = self
            .host
            .peerstore
            .supports_protocols(peer, &self.protocols)?;

        Ok(!supported.is_empty())
    }

    /// Admit every currently connected peer that qualifies.
    pub(crate) fn seed_routing_table(&self) {
        let mut routing_table = self.state.routing_table();

        for peer in self.host.network.peers() {
            match self.valid_rt_peer(&peer) {
                Ok(true) => {
                    routing_table.peer_found(peer, false);
                }
                Ok(false) => {}
                Err(error) => {
                    error!(?peer, ?error, "could not check peerstore for protocol support");
                }
            }
        }

        debug!(size = routing_table.size(), "Seeded routing table with connected peers");
    }

    pub(crate) fn handle_local_addresses_updated(&self) {
        // Searching for ourselves is the quickest way to tell our closest peers about
        // the new address. If a lookup is already pending, this one is redundant.
        let _ = self.self_lookup.try_send(());
    }

    pub(crate) fn handle_peer_protocols_updated(&self, peer: &PeerId) {
        let valid = match self.valid_rt_peer(peer) {
            Ok(valid) => valid,
            Err(error) => {
                error!(?peer, ?error, "could not check peerstore for protocol support");
                return;
            }
        };

        let mut routing_table = self.state.routing_table();

        if !valid {
            debug!(?peer, "Peer stopped speaking the dht protocol");
            routing_table.remove_peer(peer);
            return;
        }

        // We might have just discovered a peer that supports the dht protocol.
        routing_table.fix_if_needed();
    }

    pub(crate) fn handle_peer_identification_completed(&self, peer: &PeerId) {
        let mut routing_table = self.state.routing_table();

        if self.host.network.connectedness(peer) != Connectedness::Connected {
            trace!(?peer, "Identified peer already disconnected");
            return;
        }

        match self.valid_rt_peer(peer) {
            Ok(true) => {
                routing_table.peer_found(*peer, false);
                routing_table.fix_if_needed();
            }
            Ok(false) => {}
            Err(error) => {
                error!(?peer, ?error, "could not check peerstore for protocol support");
            }
        }
    }

    pub(crate) fn handle_local_reachability_changed(&self, reachability: Reachability) {
        if !self.auto {
            // Something has gone really wrong if we get an event we did not subscribe to.
            error!(?reachability, "received LocalReachabilityChanged event that was not subscribed to");
            return;
        }

        let target = reachability.target_mode();

        info!(?reachability, "Processed reachability change, performing dht mode switch");

        match self.mode.set_mode(target) {
            Ok(()) => info!(mode = ?target, "switched DHT mode successfully"),
            Err(error) => error!(mode = ?target, ?error, "switching DHT mode failed"),
        }
    }

    /// Returns the teardown thread, if the peer had a message stream to tear down.
    pub(crate) fn handle_disconnected(&self, peer: &PeerId) -> Option<JoinHandle<()>> {
        if self.closing.is_closed() {
            return None;
        }

        let stream = match self.state.evict_disconnected(self.host.network.as_ref(), peer) {
            Eviction::StillConnected => {
                trace!(?peer, "Peer reconnected before its disconnect was processed");
                return None;
            }
            Eviction::Evicted(stream) => stream?,
        };

        debug!(?peer, "Peer disconnected, tearing down its message stream");

        let closing = self.closing.clone();
        let peer = *peer;

        // Locking the stream can block for a while.
        let spawned = thread::Builder::new()
            .name("dht-stream-teardown".to_string())
            .spawn(move || match stream.lock(&closing) {
                Ok(mut guard) => guard.invalidate(),
                Err(error) => trace!(?peer, ?error, "Abandoned message stream teardown"),
            });

        match spawned {
            Ok(handle) => Some(handle),
            Err(error) => {
                error!(?peer, ?error, "Failed to spawn message stream teardown");
                None
            }
        }
    }
}

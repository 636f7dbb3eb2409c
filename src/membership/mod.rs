//! Routing table membership maintenance.
//!
//! [Membership] subscribes to peer lifecycle events and raw network disconnects,
//! and turns them into routing table changes and client/server mode switches on a
//! dedicated thread.

mod events;
mod handlers;
mod mode;
mod network;
mod routing;
mod state;
mod stream;
#[cfg(test)]
pub(crate) mod testing;

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use flume::{Receiver, Selector, Sender};
use tracing::{debug, error};

use crate::closing::Closing;
use crate::common::{PeerId, ProtocolId};
use crate::Result;

pub use events::{Event, EventBus, EventKind, InMemoryEventBus, Subscription, DEFAULT_EVENT_BUFFER};
pub use mode::{Mode, ModeController, ModeHandler, ModeOption, Reachability};
pub use network::{Conn, Connectedness, Host, Network, Notifee, Peerstore, Stream};
pub use routing::RoutingTable;
pub use state::{Eviction, SharedState};
pub use stream::{MessageStream, StreamGuard, StreamState};

/// Everything the event handlers need, shared with the owning node.
pub(crate) struct MembershipContext {
    pub host: Host,
    pub state: Arc<SharedState>,
    pub mode: Arc<ModeController>,
    /// Primary protocols, qualifying peers for the routing table.
    pub protocols: Vec<ProtocolId>,
    /// Whether the mode follows reachability.
    pub auto: bool,
    pub self_lookup: Sender<()>,
    pub closing: Closing,
}

/// Forwards raw disconnects into the membership loop, ignores everything else.
///
/// Admission is driven by identification, a bare connection says nothing about
/// protocol support.
struct DisconnectNotifee {
    disconnects: Sender<PeerId>,
    closing: Closing,
}

impl Notifee for DisconnectNotifee {
    fn connected(&self, _conn: &Conn) {}

    fn disconnected(&self, conn: &Conn) {
        if self.closing.is_closed() {
            return;
        }

        let _ = self.disconnects.send(*conn.remote_peer());
    }

    fn opened_stream(&self, _peer: &PeerId, _protocol: &ProtocolId) {}

    fn closed_stream(&self, _peer: &PeerId, _protocol: &ProtocolId) {}

    fn listen(&self, _address: &SocketAddr) {}

    fn listen_close(&self, _address: &SocketAddr) {}
}

enum Signal {
    Event(Event),
    Disconnected(PeerId),
    /// The event bus closed our subscription.
    SubscriptionClosed,
    Shutdown,
}

/// The membership event processor, see [Membership::spawn].
pub(crate) struct Membership {
    context: Arc<MembershipContext>,
    subscription: Option<Subscription>,
    notifee: Arc<dyn Notifee>,
    disconnects: Receiver<PeerId>,
    teardowns: Vec<JoinHandle<()>>,
}

impl Membership {
    /// Subscribe to the event bus, register with the network and seed the routing
    /// table with the peers we are already connected to.
    pub fn new(context: Arc<MembershipContext>, buffer: usize) -> Result<Self> {
        let mut kinds = vec![
            // Identified peers may join the routing table.
            EventKind::PeerIdentificationCompleted,
            // Peers may stop (or start) speaking the dht protocol.
            EventKind::PeerProtocolsUpdated,
            // Our new address should reach our closest peers.
            EventKind::LocalAddressesUpdated,
        ];

        if context.auto {
            kinds.push(EventKind::LocalReachabilityChanged);
        }

        let subscription = context.host.event_bus.subscribe(&kinds, buffer)?;

        let (sender, disconnects) = flume::unbounded();

        let notifee: Arc<dyn Notifee> = Arc::new(DisconnectNotifee {
            disconnects: sender,
            closing: context.closing.clone(),
        });

        context.host.network.notify(notifee.clone());

        context.seed_routing_table();

        Ok(Membership {
            context,
            subscription: Some(subscription),
            notifee,
            disconnects,
            teardowns: Vec::new(),
        })
    }

    /// Run the event loop on its own thread.
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("dht-membership".to_string())
            .spawn(move || self.run())?;

        Ok(handle)
    }

    /// Process events until the subscription closes or the node shuts down.
    pub fn run(mut self) {
        loop {
            match self.next_signal() {
                Signal::Event(event) => self.handle_event(event),
                Signal::Disconnected(peer) => {
                    if let Some(handle) = self.context.handle_disconnected(&peer) {
                        self.teardowns.push(handle);
                    }
                    self.teardowns.retain(|handle| !handle.is_finished());
                }
                Signal::SubscriptionClosed => {
                    debug!("Event subscription closed, stopping membership loop");
                    break;
                }
                Signal::Shutdown => {
                    debug!("Node is shutting down, stopping membership loop");
                    break;
                }
            }
        }
    }

    fn next_signal(&self) -> Signal {
        let Some(subscription) = self.subscription.as_ref() else {
            return Signal::SubscriptionClosed;
        };

        Selector::new()
            .recv(subscription.receiver(), |event| match event {
                Ok(event) => Signal::Event(event),
                Err(_) => Signal::SubscriptionClosed,
            })
            .recv(&self.disconnects, |peer| match peer {
                Ok(peer) => Signal::Disconnected(peer),
                // We hold the notifee, and with it the sender.
                Err(_) => Signal::Shutdown,
            })
            .recv(self.context.closing.receiver(), |_| Signal::Shutdown)
            .wait()
    }

    fn handle_event(&self, event: Event) {
        let context = &self.context;

        match event {
            Event::LocalAddressesUpdated { .. } => context.handle_local_addresses_updated(),
            Event::PeerProtocolsUpdated { peer, .. } => context.handle_peer_protocols_updated(&peer),
            Event::PeerIdentificationCompleted { peer } => {
                context.handle_peer_identification_completed(&peer)
            }
            Event::LocalReachabilityChanged { reachability } => {
                context.handle_local_reachability_changed(reachability)
            }
        }
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        self.context.host.network.stop_notify(&self.notifee);

        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }

        for handle in self.teardowns.drain(..) {
            if handle.join().is_err() {
                error!("Message stream teardown panicked");
            }
        }
    }
}

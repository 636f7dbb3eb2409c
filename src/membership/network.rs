//! Contracts of the transport layer and the peerstore.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::common::{PeerId, ProtocolId};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectedness {
    NotConnected,
    Connected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A transport connection to a remote peer.
pub struct Conn {
    pub remote_peer: PeerId,
    pub remote_addr: SocketAddr,
}

impl Conn {
    pub fn new(remote_peer: PeerId, remote_addr: SocketAddr) -> Self {
        Conn {
            remote_peer,
            remote_addr,
        }
    }

    pub fn remote_peer(&self) -> &PeerId {
        &self.remote_peer
    }
}

/// A message stream to a remote peer.
pub trait Stream: Send {
    fn write(&mut self, message: &[u8]) -> std::io::Result<()>;

    /// Abort the stream in both directions.
    fn reset(&mut self);
}

/// Observer of raw network notifications.
pub trait Notifee: Send + Sync {
    fn connected(&self, conn: &Conn);
    fn disconnected(&self, conn: &Conn);
    fn opened_stream(&self, peer: &PeerId, protocol: &ProtocolId);
    fn closed_stream(&self, peer: &PeerId, protocol: &ProtocolId);
    fn listen(&self, address: &SocketAddr);
    fn listen_close(&self, address: &SocketAddr);
}

/// The transport layer.
pub trait Network: Send + Sync {
    fn connectedness(&self, peer: &PeerId) -> Connectedness;

    /// Peers with at least one live connection.
    fn peers(&self) -> Vec<PeerId>;

    fn notify(&self, notifee: Arc<dyn Notifee>);

    /// Stop notifying a notifee previously passed to [Network::notify].
    fn stop_notify(&self, notifee: &Arc<dyn Notifee>);

    /// Open a stream to `peer` speaking the first protocol it supports out of `protocols`.
    fn new_stream(&self, peer: &PeerId, protocols: &[ProtocolId]) -> Result<Box<dyn Stream>>;
}

/// Knows which protocols peers advertised.
pub trait Peerstore: Send + Sync {
    /// Returns the subset of `protocols` that `peer` supports.
    fn supports_protocols(&self, peer: &PeerId, protocols: &[ProtocolId]) -> Result<Vec<ProtocolId>>;
}

#[derive(Clone)]
/// The collaborators a node runs on top of.
pub struct Host {
    pub network: Arc<dyn Network>,
    pub peerstore: Arc<dyn Peerstore>,
    pub event_bus: Arc<dyn super::EventBus>,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}

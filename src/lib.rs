//! Routing table membership maintenance and record conflict resolution for a
//! Kademlia DHT node.
//!
//! A [Node] reacts to peer lifecycle events published by its host (identification,
//! protocol changes, disconnects, address and reachability changes) and keeps the
//! routing table, per peer message streams and the client/server [Mode] consistent
//! with the network. Records fetched from the DHT are validated and reconciled by
//! the [reducer::NamespacedReducer] bound to their key's namespace.

mod closing;
pub mod common;
mod config;
mod error;
pub mod membership;
mod node;
pub mod record;
pub mod reducer;

pub use crate::closing::{Closing, Shutdown};
pub use crate::common::{PeerId, ProtocolId, DEFAULT_PROTOCOL, ID_SIZE};
pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::membership::{
    Event, EventBus, EventKind, Host, InMemoryEventBus, Mode, ModeHandler, ModeOption,
    Network, Peerstore, Reachability, RoutingTable,
};
pub use crate::node::Node;
pub use crate::reducer::{NamespacedReducer, RecordError, Reduced, Reducer};
pub use bytes::Bytes;

pub use ed25519_dalek::SigningKey;

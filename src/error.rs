//! Main Crate Error

use crate::common::PeerId;
use crate::membership::Mode;
use crate::reducer::RecordError;

#[derive(thiserror::Error, Debug)]
/// kad-membership crate error enum.
pub enum Error {
    #[error(transparent)]
    /// Transparent [std::io::Error]
    IO(#[from] std::io::Error),

    /// Peer ids must be exactly [crate::ID_SIZE] bytes.
    #[error("Invalid peer id size, expected 20, got {0}")]
    InvalidIdSize(usize),

    /// The event bus refused our subscription, fatal to [crate::Node::new].
    #[error("dht could not subscribe to event bus events: {0}")]
    Subscribe(String),

    /// The peerstore failed to answer a protocol support query.
    #[error("could not check peerstore for protocol support: {0}")]
    Peerstore(String),

    /// The [crate::ModeHandler] failed to switch modes.
    #[error("switching dht mode to {target:?} failed: {reason}")]
    ModeSwitch { target: Mode, reason: String },

    #[error(transparent)]
    /// Record validation or reduction failure.
    Record(#[from] RecordError),

    /// The message stream of this peer was torn down after a disconnect.
    #[error("message stream to {0} was invalidated")]
    StreamInvalidated(PeerId),

    /// The node is shutting down.
    #[error("dht is shutting down")]
    Closing,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

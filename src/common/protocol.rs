//! Protocol identifiers negotiated with remote peers.

use std::fmt::{self, Display, Formatter};

/// Primary DHT protocol spoken by this implementation.
pub const DEFAULT_PROTOCOL: &str = "/kad/1.0.0";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A protocol identifier, as advertised by peers.
pub struct ProtocolId(String);

impl ProtocolId {
    pub fn new(id: impl Into<String>) -> Self {
        ProtocolId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProtocolId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProtocolId {
    fn from(id: &str) -> Self {
        ProtocolId::new(id)
    }
}

impl AsRef<str> for ProtocolId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

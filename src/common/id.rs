//! Opaque peer identifier.
use rand::Rng;
use std::fmt::{self, Debug, Display, Formatter};

use crate::{Error, Result};

/// The size of peer IDs in bytes.
pub const ID_SIZE: usize = 20;

#[derive(Clone, Copy, PartialEq, Ord, PartialOrd, Eq, Hash)]
/// Opaque identifier of a remote (or the local) node.
pub struct PeerId(pub [u8; ID_SIZE]);

impl PeerId {
    pub fn random() -> PeerId {
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; ID_SIZE] = rng.gen();

        PeerId(random_bytes)
    }

    /// Create a new PeerId from some bytes. Returns Err if `bytes` is not of length
    /// [ID_SIZE].
    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<PeerId> {
        let bytes = bytes.as_ref();
        if bytes.len() != ID_SIZE {
            return Err(Error::InvalidIdSize(bytes.len()));
        }

        let mut tmp: [u8; ID_SIZE] = [0; ID_SIZE];
        tmp.copy_from_slice(bytes);

        Ok(PeerId(tmp))
    }

    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }
}

impl Display for PeerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }

        Ok(())
    }
}

impl Debug for PeerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self)
    }
}

impl From<[u8; ID_SIZE]> for PeerId {
    fn from(bytes: [u8; ID_SIZE]) -> Self {
        PeerId(bytes)
    }
}

//! Record validation and conflict resolution.
//!
//! A [Reducer] validates single records and picks the authoritative one out of
//! several copies fetched for the same key. [NamespacedReducer] routes both
//! operations to the reducer bound to the key's namespace.

mod error;
mod ipns;
mod namespaced;
mod public_key;
#[cfg(test)]
pub(crate) mod testing;

use bytes::Bytes;

pub use error::RecordError;
pub use ipns::{IpnsReducer, IpnsValidator};
pub use namespaced::NamespacedReducer;
pub use public_key::{PublicKeyReducer, PublicKeyValidator};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Winner of [Reducer::reduce].
pub struct Reduced {
    pub value: Bytes,
    /// Position of [Self::value] in the candidates, or `None` if the winner is a
    /// new value that is none of them.
    pub index: Option<usize>,
}

/// Validates records and reduces several candidates to one.
pub trait Reducer: Send + Sync {
    fn validate(&self, key: &str, value: &[u8]) -> Result<(), RecordError>;

    /// Must not be called with an empty `values`, and must not mutate it.
    fn reduce(&self, key: &str, values: &[Bytes]) -> Result<Reduced, RecordError>;
}

/// A record format that can validate a record and select the best out of many.
pub trait Validator: Send + Sync {
    fn validate(&self, key: &str, value: &[u8]) -> Result<(), RecordError>;

    /// Returns the index of the best record in `values`.
    fn select(&self, key: &str, values: &[Bytes]) -> Result<usize, RecordError>;
}

#[derive(Debug, Clone, Default)]
/// Adapts a [Validator] into a [Reducer] by indexing its selection back into the candidates.
pub struct Selecting<V>(pub V);

impl<V: Validator> Selecting<V> {
    pub fn new(validator: V) -> Self {
        Selecting(validator)
    }

    pub fn validator(&self) -> &V {
        &self.0
    }
}

impl<V: Validator> Reducer for Selecting<V> {
    fn validate(&self, key: &str, value: &[u8]) -> Result<(), RecordError> {
        self.0.validate(key, value)
    }

    fn reduce(&self, key: &str, values: &[Bytes]) -> Result<Reduced, RecordError> {
        let index = self.0.select(key, values)?;

        let value = values.get(index).cloned().ok_or(RecordError::NotFound)?;

        Ok(Reduced {
            value,
            index: Some(index),
        })
    }
}

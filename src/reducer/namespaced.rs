use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};

use bytes::Bytes;

use crate::common::{split_key, IPNS_NAMESPACE, PK_NAMESPACE};

use super::{IpnsReducer, PublicKeyReducer, Reduced, Reducer, RecordError};

/// Dispatches to the [Reducer] bound to the namespace of each key.
///
/// Bindings are fixed once the node starts, lookups are exact matches on the namespace.
pub struct NamespacedReducer {
    reducers: HashMap<String, Box<dyn Reducer>>,
}

impl NamespacedReducer {
    /// A reducer without any namespace bound.
    pub fn empty() -> Self {
        NamespacedReducer {
            reducers: HashMap::new(),
        }
    }

    /// Bind `reducer` to `namespace`, replacing any previous binding.
    pub fn with(mut self, namespace: impl Into<String>, reducer: impl Reducer + 'static) -> Self {
        self.reducers.insert(namespace.into(), Box::new(reducer));
        self
    }

    /// Looks up the reducer responsible for the given key.
    ///
    /// Returns `None` for malformed keys as well as unbound namespaces.
    pub fn reducer_by_key(&self, key: &str) -> Option<&dyn Reducer> {
        let (namespace, _) = split_key(key).ok()?;

        self.reducers.get(namespace).map(|reducer| reducer.as_ref())
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.reducers.keys().map(|namespace| namespace.as_str())
    }
}

impl Default for NamespacedReducer {
    /// Binds [PublicKeyReducer] to `pk` and [IpnsReducer] to `ipns`.
    fn default() -> Self {
        NamespacedReducer::empty()
            .with(PK_NAMESPACE, PublicKeyReducer::default())
            .with(IPNS_NAMESPACE, IpnsReducer::default())
    }
}

impl Reducer for NamespacedReducer {
    fn validate(&self, key: &str, value: &[u8]) -> Result<(), RecordError> {
        let reducer = self
            .reducer_by_key(key)
            .ok_or(RecordError::InvalidRecordType)?;

        reducer.validate(key, value)
    }

    fn reduce(&self, key: &str, values: &[Bytes]) -> Result<Reduced, RecordError> {
        if values.is_empty() {
            return Err(RecordError::NoValues);
        }

        let reducer = self
            .reducer_by_key(key)
            .ok_or(RecordError::InvalidRecordType)?;

        reducer.reduce(key, values)
    }
}

impl Debug for NamespacedReducer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut namespaces: Vec<&str> = self.namespaces().collect();
        namespaces.sort_unstable();

        f.debug_struct("NamespacedReducer")
            .field("namespaces", &namespaces)
            .finish()
    }
}

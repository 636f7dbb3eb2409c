//! In-memory store of validated records.

use std::num::NonZeroUsize;
use std::sync::Arc;

use bytes::Bytes;
use lru::LruCache;
use tracing::debug;

use crate::reducer::{NamespacedReducer, Reducer, RecordError};

/// Maximum number of records kept when no explicit capacity is configured.
pub const MAX_RECORDS: usize = 1000;

#[derive(Debug)]
/// Least recently used store of records, only ever holding records its reducer accepts.
pub struct RecordStore {
    reducer: Arc<NamespacedReducer>,
    records: LruCache<String, Bytes>,
}

impl RecordStore {
    pub fn new(reducer: Arc<NamespacedReducer>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or(NonZeroUsize::new(MAX_RECORDS))
            .unwrap_or(NonZeroUsize::MIN);

        RecordStore {
            reducer,
            records: LruCache::new(capacity),
        }
    }

    /// Validate and store `value` under `key`.
    ///
    /// If a record is already stored, `value` only replaces it when it wins the
    /// reduction against it. Returns `true` if `value` was stored.
    pub fn put(&mut self, key: &str, value: Bytes) -> Result<bool, RecordError> {
        self.reducer.validate(key, &value)?;

        if let Some(existing) = self.records.get(key) {
            if existing == &value {
                return Ok(true);
            }

            let candidates = [value.clone(), existing.clone()];

            match self.reducer.reduce(key, &candidates) {
                Ok(reduced) if reduced.index == Some(0) => {}
                Ok(_) => {
                    debug!(?key, "Refusing to replace a better record");
                    return Ok(false);
                }
                Err(error) => {
                    // The stored copy can be invalid by now (e.g. expired), the new one is not.
                    debug!(?key, ?error, "Replacing record that failed reduction");
                }
            }
        }

        self.records.put(key.to_string(), value);

        Ok(true)
    }

    /// Returns the stored record if it is still valid, evicting it otherwise.
    pub fn get(&mut self, key: &str) -> Option<Bytes> {
        let value = self.records.get(key)?.clone();

        match self.reducer.validate(key, &value) {
            Ok(()) => Some(value),
            Err(error) => {
                debug!(?key, ?error, "Evicting invalid record");
                self.records.pop(key);

                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

//! Reducer with a trivial record format, used across the crate's tests.
//!
//! `"newer"` beats `"valid"`, `"expired"` fails validation, anything else is ignored.

use bytes::Bytes;

use super::{Reduced, Reducer, RecordError};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TestReducer;

impl Reducer for TestReducer {
    fn validate(&self, _key: &str, value: &[u8]) -> Result<(), RecordError> {
        if value == b"expired" {
            return Err(RecordError::Expired);
        }

        Ok(())
    }

    fn reduce(&self, _key: &str, values: &[Bytes]) -> Result<Reduced, RecordError> {
        let mut index = None;

        for (i, value) in values.iter().enumerate() {
            if value.as_ref() == b"newer" {
                // Last newer wins.
                index = Some(i);
            } else if value.as_ref() == b"valid" && index.is_none() {
                // First valid wins.
                index = Some(i);
            }
        }

        let index = index.ok_or(RecordError::NotFound)?;

        Ok(Reduced {
            value: values[index].clone(),
            index: Some(index),
        })
    }
}

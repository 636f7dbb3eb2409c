//! Public key records, stored under `/pk/<sha1 of the key>`.

use bytes::Bytes;
use ed25519_dalek::VerifyingKey;

use crate::common::{key::public_key_hash, split_key, PK_NAMESPACE};

use super::{RecordError, Selecting, Validator};

pub type PublicKeyReducer = Selecting<PublicKeyValidator>;

#[derive(Debug, Clone, Copy, Default)]
/// Validates that a record is the ed25519 public key its key was derived from.
pub struct PublicKeyValidator;

impl Validator for PublicKeyValidator {
    fn validate(&self, key: &str, value: &[u8]) -> Result<(), RecordError> {
        let (namespace, hash) = split_key(key)?;

        if namespace != PK_NAMESPACE {
            return Err(RecordError::InvalidRecordType);
        }

        let bytes: &[u8; 32] = value
            .try_into()
            .map_err(|_| RecordError::Malformed(format!("public key of {} bytes", value.len())))?;

        VerifyingKey::from_bytes(bytes)
            .map_err(|_| RecordError::Malformed("invalid ed25519 public key".to_string()))?;

        if public_key_hash(bytes) != hash {
            return Err(RecordError::KeyMismatch);
        }

        Ok(())
    }

    /// Every valid public key for a given key is the same key, so the first valid one wins.
    fn select(&self, key: &str, values: &[Bytes]) -> Result<usize, RecordError> {
        values
            .iter()
            .position(|value| self.validate(key, value).is_ok())
            .ok_or(RecordError::NotFound)
    }
}

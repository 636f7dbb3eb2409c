//! Signed, sequenced records with an end of life, stored under `/ipns/<sha1 of the key>`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::common::ipns_key;
use crate::reducer::RecordError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// A record signed by the owner of an ed25519 key.
///
/// Copies with a higher [SignedRecord::seq] supersede older ones.
pub struct SignedRecord {
    /// ed25519 public key
    #[serde(rename = "k", with = "serde_bytes")]
    key: [u8; 32],
    /// sequence number
    seq: u64,
    /// value
    #[serde(rename = "v", with = "serde_bytes")]
    value: Vec<u8>,
    /// end of life, seconds since unix epoch
    eol: u64,
    /// ed25519 signature
    #[serde(rename = "sig", with = "serde_bytes")]
    signature: [u8; 64],
}

impl SignedRecord {
    /// Create and sign a new record valid until `eol`.
    pub fn new(signer: &SigningKey, value: &[u8], seq: u64, eol: SystemTime) -> Self {
        let eol = unix_seconds(eol);

        let signable = encode_signable(seq, eol, value);
        let signature = signer.sign(&signable);

        Self {
            key: signer.verifying_key().to_bytes(),
            seq,
            value: value.into(),
            eol,
            signature: signature.to_bytes(),
        }
    }

    /// Decode a bencoded record and verify its signature, without checking its end of life.
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        let record: SignedRecord = serde_bencode::from_bytes(bytes)?;

        let key = VerifyingKey::from_bytes(&record.key)
            .map_err(|_| RecordError::Malformed("invalid ed25519 public key".to_string()))?;
        let signature = Signature::from_bytes(&record.signature);

        key.verify(
            &encode_signable(record.seq, record.eol, &record.value),
            &signature,
        )
        .map_err(|_| RecordError::InvalidSignature)?;

        Ok(record)
    }

    pub fn encode(&self) -> Result<Bytes, RecordError> {
        Ok(serde_bencode::to_bytes(self)?.into())
    }

    /// Returns `true` if the end of life is before `now`.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.eol < unix_seconds(now)
    }

    /// Key this record belongs under.
    pub fn record_key(&self) -> Result<String, RecordError> {
        let key = VerifyingKey::from_bytes(&self.key)
            .map_err(|_| RecordError::Malformed("invalid ed25519 public key".to_string()))?;

        Ok(ipns_key(&key))
    }

    // === Getters ===

    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn eol(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.eol)
    }

    pub fn signature(&self) -> &[u8; 64] {
        &self.signature
    }
}

fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub fn encode_signable(seq: u64, eol: u64, value: &[u8]) -> Box<[u8]> {
    let mut signable = vec![];

    signable.extend(format!("3:eoli{}e3:seqi{}e1:v{}:", eol, seq, value.len()).into_bytes());
    signable.extend(value);

    signable.into()
}

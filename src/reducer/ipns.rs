use std::time::SystemTime;

use bytes::Bytes;
use tracing::trace;

use crate::common::{key::public_key_hash, split_key, IPNS_NAMESPACE};
use crate::record::SignedRecord;

use super::{RecordError, Selecting, Validator};

pub type IpnsReducer = Selecting<IpnsValidator>;

#[derive(Debug, Clone, Copy, Default)]
/// Validates [SignedRecord]s and prefers the highest sequence number.
pub struct IpnsValidator;

impl IpnsValidator {
    fn decode(&self, key: &str, value: &[u8], now: SystemTime) -> Result<SignedRecord, RecordError> {
        let (namespace, hash) = split_key(key)?;

        if namespace != IPNS_NAMESPACE {
            return Err(RecordError::InvalidRecordType);
        }

        let record = SignedRecord::decode(value)?;

        if public_key_hash(record.key()) != hash {
            return Err(RecordError::KeyMismatch);
        }

        if record.is_expired_at(now) {
            return Err(RecordError::Expired);
        }

        Ok(record)
    }
}

impl Validator for IpnsValidator {
    fn validate(&self, key: &str, value: &[u8]) -> Result<(), RecordError> {
        self.decode(key, value, SystemTime::now()).map(|_| ())
    }

    /// Highest sequence number wins, then the latest end of life, then the earliest candidate.
    fn select(&self, key: &str, values: &[Bytes]) -> Result<usize, RecordError> {
        let now = SystemTime::now();

        let mut best: Option<(usize, SignedRecord)> = None;

        for (index, value) in values.iter().enumerate() {
            let record = match self.decode(key, value, now) {
                Ok(record) => record,
                Err(error) => {
                    trace!(?key, index, ?error, "Skipping invalid candidate");
                    continue;
                }
            };

            let better = match &best {
                None => true,
                Some((_, current)) => {
                    (record.seq(), record.eol()) > (current.seq(), current.eol())
                }
            };

            if better {
                best = Some((index, record));
            }
        }

        best.map(|(index, _)| index).ok_or(RecordError::NotFound)
    }
}

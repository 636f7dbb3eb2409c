#[derive(thiserror::Error, Debug)]
/// Errors returned while validating or reducing records.
pub enum RecordError {
    /// No [super::Reducer] is bound to the namespace of the key.
    #[error("invalid record keytype")]
    InvalidRecordType,

    #[error("invalid record key: {0:?}")]
    InvalidKey(String),

    /// The record was well formed, but its validity period is over.
    #[error("record expired")]
    Expired,

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("record signature does not match its public key")]
    InvalidSignature,

    #[error("record public key does not match the key it was stored under")]
    KeyMismatch,

    /// Reduce was called with an empty candidate set.
    #[error("can't select from no values")]
    NoValues,

    /// None of the candidates was acceptable.
    #[error("no record found")]
    NotFound,
}

impl From<serde_bencode::Error> for RecordError {
    fn from(error: serde_bencode::Error) -> Self {
        RecordError::Malformed(error.to_string())
    }
}

//! Record keys of the form `/<namespace>/<rest>`.

use ed25519_dalek::VerifyingKey;
use sha1_smol::Sha1;

use crate::reducer::RecordError;

/// Namespace of public key records.
pub const PK_NAMESPACE: &str = "pk";
/// Namespace of signed, sequenced name records.
pub const IPNS_NAMESPACE: &str = "ipns";

/// Split a record key into its namespace and the namespace specific rest.
///
/// The rest may contain further `/` separators, but neither part may be empty.
pub fn split_key(key: &str) -> Result<(&str, &str), RecordError> {
    let stripped = key
        .strip_prefix('/')
        .ok_or_else(|| RecordError::InvalidKey(key.to_string()))?;

    match stripped.split_once('/') {
        Some((namespace, rest)) if !namespace.is_empty() && !rest.is_empty() => {
            Ok((namespace, rest))
        }
        _ => Err(RecordError::InvalidKey(key.to_string())),
    }
}

/// Lowercase hex SHA-1 of a public key, the suffix used by `pk` and `ipns` keys.
pub fn public_key_hash(public_key: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(public_key);

    hasher.digest().to_string()
}

/// Key under which a public key record is stored.
pub fn pk_key(public_key: &VerifyingKey) -> String {
    format!("/{}/{}", PK_NAMESPACE, public_key_hash(public_key.as_bytes()))
}

/// Key under which signed records of a public key are stored.
pub fn ipns_key(public_key: &VerifyingKey) -> String {
    format!("/{}/{}", IPNS_NAMESPACE, public_key_hash(public_key.as_bytes()))
}

//! Miscellaneous common structs used throughout the library.

mod id;
pub mod key;
mod protocol;

pub use id::*;
pub use key::{ipns_key, pk_key, split_key, IPNS_NAMESPACE, PK_NAMESPACE};
pub use protocol::*;

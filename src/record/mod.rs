//! Record formats and local storage.

mod signed;
mod store;

pub use signed::{encode_signable, SignedRecord};
pub use store::{RecordStore, MAX_RECORDS};

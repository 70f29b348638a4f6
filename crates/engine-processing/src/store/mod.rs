pub mod error;
pub mod index;
pub mod options;
pub mod record_store;
pub mod registry;

pub use record_store::{InsertOutcome, RecordStore, Status, StoredRecord};

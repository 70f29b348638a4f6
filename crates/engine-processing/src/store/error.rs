use connectors::file::csv::error::FileError;
use model::records::field::StoreKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot both append to and replace a store in the same load")]
    ConflictingLoadMode,

    #[error("The {0} store is already loaded; append to it or replace it")]
    AlreadyLoaded(StoreKind),

    #[error("The {0} store is not loaded")]
    NotLoaded(StoreKind),

    #[error("File error: {0}")]
    File(#[from] FileError),
}

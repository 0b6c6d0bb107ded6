//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] solifin_storage::StorageError),

    #[error("No active session")]
    NoActiveSession,

    #[error("Identifier cannot be empty")]
    EmptyIdentifier,

    #[error("Path cannot be empty")]
    EmptyPath,
}

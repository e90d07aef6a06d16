//! Domain errors
//!
//! Every error here is meant to be shown to the user as a transient
//! notification; none of them should end the process.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors raised by quote store, import, and sync operations
#[derive(Error, Debug)]
pub enum QuoteError {
    /// Empty text or category on add
    #[error("Invalid quote: {0}")]
    Validation(String),

    /// Import payload is not an array of complete quotes; nothing was imported
    #[error("Invalid import file: {0}")]
    MalformedImport(String),

    /// Remote fetch or post failed
    #[error("Network error: {0}")]
    Network(String),

    /// Random pick from zero candidates
    #[error("No quotes available in this category")]
    EmptyCollection,

    /// Delete of an index past the end of the store
    #[error("No quote at position {index} (store has {len})")]
    Index { index: usize, len: usize },

    /// A resolution was requested with no conflicts pending
    #[error("There are no sync conflicts to resolve")]
    NothingToResolve,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for QuoteError {
    fn from(err: reqwest::Error) -> Self {
        QuoteError::Network(err.to_string())
    }
}

/// Result type for quote operations
pub type Result<T> = std::result::Result<T, QuoteError>;

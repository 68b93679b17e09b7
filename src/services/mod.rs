/// Business operations over the storage layer
///
/// Each submodule exposes generic free functions that take the storage
/// collaborator plus whatever read-only configuration they need. They are
/// the surface the conversation flows and the MCP tools call into.

pub mod history;
pub mod journey;
pub mod profile;
pub mod tasks;

pub use history::*;
pub use journey::*;
pub use profile::*;
pub use tasks::*;

use thiserror::Error;

use crate::domain::DomainError;
use crate::storage::StorageError;

/// Errors an engine operation can end with
///
/// Everything except `Storage` is an expected outcome the transport turns
/// into a message for the user. `Storage` fails only the current operation.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Limit reached: {0}")]
    QuotaExceeded(String),

    #[error("No answer received")]
    Timeout,

    #[error("Command canceled")]
    Canceled,

    #[error("Storage failure: {0}")]
    Storage(#[source] StorageError),
}

impl From<DomainError> for TrackerError {
    fn from(error: DomainError) -> Self {
        TrackerError::Validation(error.to_string())
    }
}

impl From<StorageError> for TrackerError {
    fn from(error: StorageError) -> Self {
        match error {
            // A unique index caught a second open journey or undone task
            StorageError::Conflict(message) => TrackerError::Conflict(message),
            other => TrackerError::Storage(other),
        }
    }
}

impl TrackerError {
    /// True for outcomes the user caused; false for persistence failures
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, TrackerError::Storage(_))
    }
}

/// Domain module containing the core entities and their validation rules
///
/// This module defines the entities the accountability engine works with
/// (User, Journey, Entry, Task), the static catalogs (TaskDefinition, the
/// rank ladders) and the derived Activity view.

pub mod activity;
pub mod entry;
pub mod journey;
pub mod rank;
pub mod task;
pub mod types;
pub mod user;

// Re-export public types for easy access
pub use activity::*;
pub use entry::*;
pub use journey::*;
pub use rank::*;
pub use task::*;
pub use types::*;
pub use user::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid streak length: {0}")]
    InvalidStreakDays(String),

    #[error("Invalid note: {0} (expected a value from 1 to 10)")]
    InvalidNote(i64),

    #[error("Text too long: {length} characters (max {max})")]
    TextTooLong { length: usize, max: usize },

    #[error("Invalid rank system '{name}': {message}")]
    InvalidRankSystem { name: String, message: String },
}

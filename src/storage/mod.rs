/// Storage layer for persisting tracker data
///
/// This module handles all database operations using SQLite. The engine
/// only talks to the [`TrackerStorage`] trait; [`SqliteStorage`] is the
/// implementation the server ships with.

pub mod migrations;
pub mod sqlite;

// Re-export the main storage types
pub use sqlite::*;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{Entry, EntryId, EntryScope, Journey, Task, User, UserId};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Journey not found: {journey_id}")]
    JourneyNotFound { journey_id: String },

    #[error("Entry not found: {entry_id}")]
    EntryNotFound { entry_id: String },

    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    #[error("Constraint violated: {0}")]
    Conflict(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Trait defining the persistence collaborator the engine runs against
///
/// Row order is always creation order (oldest first) unless a method says
/// otherwise. Time windows passed as `from`/`to` are inclusive on both ends.
pub trait TrackerStorage {
    /// Insert the user or refresh its display name
    fn upsert_user(&self, user: &User) -> Result<User, StorageError>;

    fn find_user(&self, user_id: UserId) -> Result<Option<User>, StorageError>;

    /// Most recently registered user with this display name (case-insensitive)
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    fn create_journey(&self, journey: &Journey) -> Result<(), StorageError>;

    fn update_journey(&self, journey: &Journey) -> Result<(), StorageError>;

    /// The user's journey with no end, if any
    fn find_open_journey(&self, user_id: UserId) -> Result<Option<Journey>, StorageError>;

    /// The user's most recently created journey, open or not
    fn find_latest_journey(&self, user_id: UserId) -> Result<Option<Journey>, StorageError>;

    fn list_journeys(&self, user_id: UserId) -> Result<Vec<Journey>, StorageError>;

    /// Number of distinct users owning at least one journey
    fn count_journey_users(&self) -> Result<u64, StorageError>;

    fn create_entry(&self, entry: &Entry) -> Result<(), StorageError>;

    fn get_entry(&self, entry_id: EntryId) -> Result<Entry, StorageError>;

    fn update_entry_privacy(&self, entry_id: EntryId, is_public: bool) -> Result<(), StorageError>;

    /// A slice of the user's entries matching `scope`
    fn list_entries(
        &self,
        user_id: UserId,
        scope: EntryScope,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Entry>, StorageError>;

    fn count_entries(&self, user_id: UserId, scope: EntryScope) -> Result<u64, StorageError>;

    fn count_entries_created_between(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, StorageError>;

    /// Entries created strictly after `after`
    fn count_entries_created_after(&self, user_id: UserId, after: DateTime<Utc>) -> Result<u64, StorageError>;

    fn create_task(&self, task: &Task) -> Result<(), StorageError>;

    fn update_task(&self, task: &Task) -> Result<(), StorageError>;

    /// The user's task that is not done yet, if any
    fn find_undone_task(&self, user_id: UserId) -> Result<Option<Task>, StorageError>;

    fn list_tasks(&self, user_id: UserId) -> Result<Vec<Task>, StorageError>;

    /// Tasks whose `updated_at` is strictly after `after`
    fn list_tasks_updated_after(&self, user_id: UserId, after: DateTime<Utc>) -> Result<Vec<Task>, StorageError>;

    fn count_tasks_updated_between(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, StorageError>;

    /// Tasks created strictly after `after`
    fn count_tasks_created_after(&self, user_id: UserId, after: DateTime<Utc>) -> Result<u64, StorageError>;
}

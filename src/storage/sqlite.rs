/// SQLite implementation of the tracker storage interface
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving users, journeys, entries and tasks. It handles all SQL
/// queries and data conversion.

use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::domain::{Entry, EntryId, EntryScope, Journey, JourneyId, Task, TaskId, User, UserId};
use crate::storage::{migrations, StorageError, TrackerStorage};

const JOURNEY_COLUMNS: &str = "id, user_id, rank_system, started_at, ended_at, note, created_at";
const ENTRY_COLUMNS: &str = "id, user_id, is_public, note, text, created_at";
const TASK_COLUMNS: &str = "id, user_id, task_ref, message_ref, is_done, created_at, updated_at";
const USER_COLUMNS: &str = "id, username, created_at, updated_at";

/// SQLite-based storage implementation
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    ///
    /// This opens the database file and runs any necessary migrations
    /// to ensure the schema is up to date.
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        let storage = Self::from_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(storage)
    }

    /// Open a throwaway database that lives only as long as this value
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open in-memory database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        migrations::initialize_database(&conn)?;

        Ok(Self { conn })
    }

    fn count(&self, sql: &str, params: impl rusqlite::Params) -> Result<u64, StorageError> {
        let count: i64 = self.conn.query_row(sql, params, |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

/// Timestamps are stored as UTC RFC 3339 with a fixed width so that text
/// comparison in SQL matches chronological order.
fn ts(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| rusqlite::Error::InvalidColumnType(idx, "Invalid datetime".to_string(), Type::Text))
}

fn parse_opt_ts(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| rusqlite::Error::InvalidColumnType(idx, "Invalid datetime".to_string(), Type::Text))
    })
    .transpose()
}

fn parse_uuid<T>(row: &Row, idx: usize, parse: fn(&str) -> Result<T, uuid::Error>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).map_err(|_| rusqlite::Error::InvalidColumnType(idx, "Invalid UUID".to_string(), Type::Text))
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        username: row.get(1)?,
        created_at: parse_ts(row, 2)?,
        updated_at: parse_ts(row, 3)?,
    })
}

fn journey_from_row(row: &Row) -> rusqlite::Result<Journey> {
    Ok(Journey {
        id: parse_uuid(row, 0, JourneyId::from_string)?,
        user_id: UserId(row.get(1)?),
        rank_system: row.get(2)?,
        start: parse_ts(row, 3)?,
        end: parse_opt_ts(row, 4)?,
        note: row.get(5)?,
        created_at: parse_ts(row, 6)?,
    })
}

fn entry_from_row(row: &Row) -> rusqlite::Result<Entry> {
    let note: i64 = row.get(3)?;
    let note = u8::try_from(note)
        .map_err(|_| rusqlite::Error::InvalidColumnType(3, "Invalid note".to_string(), Type::Integer))?;

    Ok(Entry {
        id: parse_uuid(row, 0, EntryId::from_string)?,
        user_id: UserId(row.get(1)?),
        is_public: row.get(2)?,
        note,
        text: row.get(4)?,
        created_at: parse_ts(row, 5)?,
    })
}

fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: parse_uuid(row, 0, TaskId::from_string)?,
        user_id: UserId(row.get(1)?),
        task_ref: row.get(2)?,
        message_ref: row.get(3)?,
        is_done: row.get(4)?,
        created_at: parse_ts(row, 5)?,
        updated_at: parse_ts(row, 6)?,
    })
}

/// Turn unique-index violations into a domain-level conflict
fn conflict_or_query(error: rusqlite::Error, what: &str) -> StorageError {
    if error.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
        StorageError::Conflict(what.to_string())
    } else {
        StorageError::Query(error)
    }
}

impl TrackerStorage for SqliteStorage {
    fn upsert_user(&self, user: &User) -> Result<User, StorageError> {
        self.conn.execute(
            "INSERT INTO users (id, username, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET username = excluded.username, updated_at = excluded.updated_at",
            params![user.id.0, user.username, ts(&user.created_at), ts(&user.updated_at)],
        )?;

        tracing::debug!("Upserted user: {} ({})", user.username, user.id);
        self.find_user(user.id)?
            .ok_or_else(|| StorageError::InvalidData(format!("user {} vanished after upsert", user.id)))
    }

    fn find_user(&self, user_id: UserId) -> Result<Option<User>, StorageError> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        Ok(self.conn.query_row(&sql, params![user_id.0], user_from_row).optional()?)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let sql = format!(
            "SELECT {} FROM users WHERE username = ?1 COLLATE NOCASE
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            USER_COLUMNS
        );
        Ok(self.conn.query_row(&sql, params![username], user_from_row).optional()?)
    }

    fn create_journey(&self, journey: &Journey) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO journeys (id, user_id, rank_system, started_at, ended_at, note, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    journey.id.to_string(),
                    journey.user_id.0,
                    journey.rank_system,
                    ts(&journey.start),
                    journey.end.as_ref().map(ts),
                    journey.note,
                    ts(&journey.created_at),
                ],
            )
            .map_err(|e| conflict_or_query(e, &format!("user {} already has an open journey", journey.user_id)))?;

        tracing::debug!("Created journey {} for user {}", journey.id, journey.user_id);
        Ok(())
    }

    fn update_journey(&self, journey: &Journey) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "UPDATE journeys SET rank_system = ?2, started_at = ?3, ended_at = ?4, note = ?5 WHERE id = ?1",
            params![
                journey.id.to_string(),
                journey.rank_system,
                ts(&journey.start),
                journey.end.as_ref().map(ts),
                journey.note,
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::JourneyNotFound {
                journey_id: journey.id.to_string(),
            });
        }

        tracing::debug!("Updated journey {}", journey.id);
        Ok(())
    }

    fn find_open_journey(&self, user_id: UserId) -> Result<Option<Journey>, StorageError> {
        let sql = format!(
            "SELECT {} FROM journeys WHERE user_id = ?1 AND ended_at IS NULL
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            JOURNEY_COLUMNS
        );
        Ok(self.conn.query_row(&sql, params![user_id.0], journey_from_row).optional()?)
    }

    fn find_latest_journey(&self, user_id: UserId) -> Result<Option<Journey>, StorageError> {
        let sql = format!(
            "SELECT {} FROM journeys WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT 1",
            JOURNEY_COLUMNS
        );
        Ok(self.conn.query_row(&sql, params![user_id.0], journey_from_row).optional()?)
    }

    fn list_journeys(&self, user_id: UserId) -> Result<Vec<Journey>, StorageError> {
        let sql = format!(
            "SELECT {} FROM journeys WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC",
            JOURNEY_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let journeys = stmt
            .query_map(params![user_id.0], journey_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(journeys)
    }

    fn count_journey_users(&self) -> Result<u64, StorageError> {
        self.count("SELECT COUNT(DISTINCT user_id) FROM journeys", [])
    }

    fn create_entry(&self, entry: &Entry) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO entries (id, user_id, is_public, note, text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id.to_string(),
                entry.user_id.0,
                entry.is_public,
                entry.note,
                entry.text,
                ts(&entry.created_at),
            ],
        )?;

        tracing::debug!("Created entry {} for user {}", entry.id, entry.user_id);
        Ok(())
    }

    fn get_entry(&self, entry_id: EntryId) -> Result<Entry, StorageError> {
        let sql = format!("SELECT {} FROM entries WHERE id = ?1", ENTRY_COLUMNS);
        self.conn
            .query_row(&sql, params![entry_id.to_string()], entry_from_row)
            .optional()?
            .ok_or_else(|| StorageError::EntryNotFound {
                entry_id: entry_id.to_string(),
            })
    }

    fn update_entry_privacy(&self, entry_id: EntryId, is_public: bool) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "UPDATE entries SET is_public = ?2 WHERE id = ?1",
            params![entry_id.to_string(), is_public],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::EntryNotFound {
                entry_id: entry_id.to_string(),
            });
        }

        tracing::debug!("Set entry {} public={}", entry_id, is_public);
        Ok(())
    }

    fn list_entries(
        &self,
        user_id: UserId,
        scope: EntryScope,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Entry>, StorageError> {
        // LIMIT -1 means "no limit" in SQLite
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let offset = offset as i64;

        let entries = match scope.privacy_filter() {
            Some(is_public) => {
                let sql = format!(
                    "SELECT {} FROM entries WHERE user_id = ?1 AND is_public = ?2
                     ORDER BY created_at ASC, rowid ASC LIMIT ?3 OFFSET ?4",
                    ENTRY_COLUMNS
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map(params![user_id.0, is_public, limit, offset], entry_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM entries WHERE user_id = ?1
                     ORDER BY created_at ASC, rowid ASC LIMIT ?2 OFFSET ?3",
                    ENTRY_COLUMNS
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map(params![user_id.0, limit, offset], entry_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(entries)
    }

    fn count_entries(&self, user_id: UserId, scope: EntryScope) -> Result<u64, StorageError> {
        match scope.privacy_filter() {
            Some(is_public) => self.count(
                "SELECT COUNT(*) FROM entries WHERE user_id = ?1 AND is_public = ?2",
                params![user_id.0, is_public],
            ),
            None => self.count("SELECT COUNT(*) FROM entries WHERE user_id = ?1", params![user_id.0]),
        }
    }

    fn count_entries_created_between(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        self.count(
            "SELECT COUNT(*) FROM entries WHERE user_id = ?1 AND created_at BETWEEN ?2 AND ?3",
            params![user_id.0, ts(&from), ts(&to)],
        )
    }

    fn count_entries_created_after(&self, user_id: UserId, after: DateTime<Utc>) -> Result<u64, StorageError> {
        self.count(
            "SELECT COUNT(*) FROM entries WHERE user_id = ?1 AND created_at > ?2",
            params![user_id.0, ts(&after)],
        )
    }

    fn create_task(&self, task: &Task) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO tasks (id, user_id, task_ref, message_ref, is_done, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    task.id.to_string(),
                    task.user_id.0,
                    task.task_ref,
                    task.message_ref,
                    task.is_done,
                    ts(&task.created_at),
                    ts(&task.updated_at),
                ],
            )
            .map_err(|e| conflict_or_query(e, &format!("user {} already has an unfinished task", task.user_id)))?;

        tracing::debug!("Created task {} (ref {}) for user {}", task.id, task.task_ref, task.user_id);
        Ok(())
    }

    fn update_task(&self, task: &Task) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "UPDATE tasks SET message_ref = ?2, is_done = ?3, updated_at = ?4 WHERE id = ?1",
            params![task.id.to_string(), task.message_ref, task.is_done, ts(&task.updated_at)],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::TaskNotFound {
                task_id: task.id.to_string(),
            });
        }

        tracing::debug!("Updated task {} (done={})", task.id, task.is_done);
        Ok(())
    }

    fn find_undone_task(&self, user_id: UserId) -> Result<Option<Task>, StorageError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE user_id = ?1 AND is_done = 0
             ORDER BY created_at ASC, rowid ASC LIMIT 1",
            TASK_COLUMNS
        );
        Ok(self.conn.query_row(&sql, params![user_id.0], task_from_row).optional()?)
    }

    fn list_tasks(&self, user_id: UserId) -> Result<Vec<Task>, StorageError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC",
            TASK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params![user_id.0], task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    fn list_tasks_updated_after(&self, user_id: UserId, after: DateTime<Utc>) -> Result<Vec<Task>, StorageError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE user_id = ?1 AND updated_at > ?2 ORDER BY created_at ASC, rowid ASC",
            TASK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params![user_id.0, ts(&after)], task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    fn count_tasks_updated_between(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        self.count(
            "SELECT COUNT(*) FROM tasks WHERE user_id = ?1 AND updated_at BETWEEN ?2 AND ?3",
            params![user_id.0, ts(&from), ts(&to)],
        )
    }

    fn count_tasks_created_after(&self, user_id: UserId, after: DateTime<Utc>) -> Result<u64, StorageError> {
        self.count(
            "SELECT COUNT(*) FROM tasks WHERE user_id = ?1 AND created_at > ?2",
            params![user_id.0, ts(&after)],
        )
    }
}

/// Scoring engine
///
/// A score is never stored. It is recomputed from the user's journeys,
/// tasks and entries every time it is asked for:
///
/// - 2 points per whole day of every journey (open journeys count up to now)
/// - the catalog points of every task
/// - 1 point per entry
///
/// Scoped to the current journey, only the open journey's days count, and
/// only tasks completed and entries written after it started.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{EntryScope, TaskCatalog, UserId};
use crate::storage::{StorageError, TrackerStorage};

/// Points per whole day of a journey
pub const POINTS_PER_DAY: i64 = 2;
/// Points per check-in entry
pub const POINTS_PER_ENTRY: i64 = 1;

/// Which part of a user's history a score covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScope {
    AllHistory,
    CurrentJourney,
}

/// Computes scores against the configured task catalog
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    catalog: TaskCatalog,
}

impl ScoringEngine {
    pub fn new(catalog: TaskCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    /// Score a user as of `now`. Read-only.
    pub fn score<S: TrackerStorage>(
        &self,
        storage: &S,
        user_id: UserId,
        scope: ScoreScope,
        now: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        match scope {
            ScoreScope::AllHistory => self.all_history(storage, user_id, now),
            ScoreScope::CurrentJourney => self.current_journey(storage, user_id, now),
        }
    }

    fn all_history<S: TrackerStorage>(
        &self,
        storage: &S,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        let days: i64 = storage
            .list_journeys(user_id)?
            .iter()
            .map(|journey| journey.elapsed_days(now))
            .sum();

        // Assigned tasks count whether or not they were finished
        let task_points: i64 = storage
            .list_tasks(user_id)?
            .iter()
            .map(|task| self.catalog.points_for(task.task_ref))
            .sum();

        let entries = storage.count_entries(user_id, EntryScope::All)? as i64;

        Ok(days * POINTS_PER_DAY + task_points + entries * POINTS_PER_ENTRY)
    }

    fn current_journey<S: TrackerStorage>(
        &self,
        storage: &S,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        let Some(journey) = storage.find_open_journey(user_id)? else {
            return Ok(0);
        };

        let days = journey.elapsed_days(now);

        let task_points: i64 = storage
            .list_tasks_updated_after(user_id, journey.start)?
            .iter()
            .map(|task| self.catalog.points_for(task.task_ref))
            .sum();

        let entries = storage.count_entries_created_after(user_id, journey.start)? as i64;

        Ok(days * POINTS_PER_DAY + task_points + entries * POINTS_PER_ENTRY)
    }
}

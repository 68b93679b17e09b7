/// Profile and account summaries

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{normalize_username, EntryScope, RankResolution, RankTable, User, UserId};
use crate::scoring::{ScoreScope, ScoringEngine};
use crate::services::TrackerError;
use crate::storage::TrackerStorage;

/// Everything the profile and account views show about a user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub user_id: UserId,
    pub username: Option<String>,
    pub total_score: i64,
    pub current_score: i64,
    /// Whether the latest journey is still open
    pub journey_is_current: bool,
    pub journey_start: DateTime<Utc>,
    pub journey_end: Option<DateTime<Utc>>,
    pub rank_system: Option<String>,
    /// Whole days of the latest journey
    pub days: i64,
    pub current_rank: RankResolution,
    pub next_rank: RankResolution,
    pub entries_this_journey: u64,
    pub tasks_this_journey: u64,
    pub journey_count: usize,
    /// Days across all journeys, each counted until its end (or now)
    pub total_days: i64,
    pub average_days: i64,
    pub total_entries: u64,
    pub total_tasks: u64,
}

/// Look a user up by display name, with or without the leading `@`
pub fn find_user_by_name<S: TrackerStorage>(storage: &S, username: &str) -> Result<User, TrackerError> {
    let username = normalize_username(username);
    if username.is_empty() {
        return Err(TrackerError::Validation("username cannot be empty".to_string()));
    }
    storage
        .find_user_by_username(&username)?
        .ok_or_else(|| TrackerError::NotFound(format!("user '{}'", username)))
}

/// Summarise a user's standing; fails with `NotFound` before their first journey
pub fn profile_summary<S: TrackerStorage>(
    storage: &S,
    scoring: &ScoringEngine,
    ranks: &RankTable,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Result<ProfileSummary, TrackerError> {
    let journey = storage
        .find_latest_journey(user_id)?
        .ok_or_else(|| TrackerError::NotFound(format!("user {} has no journeys yet", user_id)))?;

    let journeys = storage.list_journeys(user_id)?;
    let total_days: i64 = journeys.iter().map(|j| j.elapsed_days(now)).sum();
    let average_days = if journeys.is_empty() {
        total_days
    } else {
        total_days / journeys.len() as i64
    };

    let until = journey.end.unwrap_or(now);
    let (current_rank, next_rank) = ranks.current_and_next(journey.start, until, journey.rank_system.as_deref());

    let username = storage.find_user(user_id)?.map(|user| user.username);

    Ok(ProfileSummary {
        user_id,
        username,
        total_score: scoring.score(storage, user_id, ScoreScope::AllHistory, now)?,
        current_score: scoring.score(storage, user_id, ScoreScope::CurrentJourney, now)?,
        journey_is_current: journey.is_open(),
        journey_start: journey.start,
        journey_end: journey.end,
        rank_system: journey.rank_system.clone(),
        days: journey.elapsed_days(now),
        current_rank,
        next_rank,
        entries_this_journey: storage.count_entries_created_after(user_id, journey.start)?,
        tasks_this_journey: storage.count_tasks_created_after(user_id, journey.start)?,
        journey_count: journeys.len(),
        total_days,
        average_days,
        total_entries: storage.count_entries(user_id, EntryScope::All)?,
        total_tasks: storage.list_tasks(user_id)?.len() as u64,
    })
}

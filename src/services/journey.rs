/// Journey lifecycle and user registration
///
/// A user has at most one open journey. The check here runs before the
/// insert; the partial unique index on `journeys` backs it up.

use chrono::{DateTime, Utc};

use crate::domain::{Journey, JourneyId, RankTable, User, UserId};
use crate::services::TrackerError;
use crate::storage::TrackerStorage;

/// Record a user (or refresh their display name)
pub fn register_user<S: TrackerStorage>(
    storage: &S,
    user_id: UserId,
    username: &str,
    now: DateTime<Utc>,
) -> Result<User, TrackerError> {
    let user = User::new(user_id, username, now);
    if user.username.is_empty() {
        return Err(TrackerError::Validation("username cannot be empty".to_string()));
    }

    let user = storage.upsert_user(&user)?;
    tracing::info!("Registered user {} as '{}'", user.id, user.username);
    Ok(user)
}

pub fn has_open_journey<S: TrackerStorage>(storage: &S, user_id: UserId) -> Result<bool, TrackerError> {
    Ok(storage.find_open_journey(user_id)?.is_some())
}

/// Open a journey backdated by the streak the user already has
pub fn start_journey<S: TrackerStorage>(
    storage: &S,
    user_id: UserId,
    declared_days: i64,
    now: DateTime<Utc>,
) -> Result<Journey, TrackerError> {
    if has_open_journey(storage, user_id)? {
        return Err(TrackerError::Conflict(format!(
            "user {} already has an open journey",
            user_id
        )));
    }

    let journey = Journey::new(user_id, declared_days, now)?;
    storage.create_journey(&journey)?;

    tracing::info!(
        "Started journey {} for user {} ({} days declared)",
        journey.id,
        user_id,
        declared_days
    );
    Ok(journey)
}

/// Attach a rank ladder to the journey `journey_id`
///
/// The journey must still be the user's open one. The stored name is the
/// ladder's canonical spelling, whatever case the user picked it in.
pub fn assign_rank_system<S: TrackerStorage>(
    storage: &S,
    ranks: &RankTable,
    user_id: UserId,
    journey_id: JourneyId,
    rank_system: &str,
) -> Result<Journey, TrackerError> {
    let definition = ranks
        .get(rank_system)
        .ok_or_else(|| TrackerError::NotFound(format!("rank system '{}'", rank_system.trim())))?;

    let mut journey = storage
        .find_open_journey(user_id)?
        .filter(|journey| journey.id == journey_id)
        .ok_or_else(|| TrackerError::NotFound(format!("open journey {} for user {}", journey_id, user_id)))?;

    journey.rank_system = Some(definition.name.clone());
    storage.update_journey(&journey)?;

    tracing::info!("Journey {} now ranks on '{}'", journey.id, definition.name);
    Ok(journey)
}

/// End the open journey after a relapse
pub fn close_journey<S: TrackerStorage>(
    storage: &S,
    user_id: UserId,
    note: &str,
    now: DateTime<Utc>,
) -> Result<Journey, TrackerError> {
    let mut journey = storage
        .find_open_journey(user_id)?
        .ok_or_else(|| TrackerError::NotFound(format!("open journey for user {}", user_id)))?;

    journey.close(note, now)?;
    storage.update_journey(&journey)?;

    tracing::info!(
        "Closed journey {} for user {} after {} days",
        journey.id,
        user_id,
        journey.elapsed_days(now)
    );
    Ok(journey)
}

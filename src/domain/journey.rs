/// Journey entity: one continuous streak attempt
///
/// A journey starts on the date the user declares (now minus the streak
/// they already have), gets its rank system chosen right after creation
/// and is closed once, when the user reports a relapse.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::elapsed_days;
use crate::domain::{DomainError, JourneyId, UserId, MAX_TEXT_LENGTH};

/// Longest streak a user may declare when opening a journey (100 years)
pub const MAX_DECLARED_DAYS: i64 = 36_500;

/// One streak attempt, open while `end` is unset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journey {
    pub id: JourneyId,
    pub user_id: UserId,
    /// Rank ladder chosen by the user; unset until the follow-up choice
    pub rank_system: Option<String>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    /// What the user wrote when the journey ended
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl Journey {
    /// Open a journey for a user who already has `declared_days` behind them
    pub fn new(user_id: UserId, declared_days: i64, now: DateTime<Utc>) -> Result<Self, DomainError> {
        Self::validate_declared_days(declared_days)?;

        Ok(Self {
            id: JourneyId::new(),
            user_id,
            rank_system: None,
            start: now - Duration::days(declared_days),
            end: None,
            note: String::new(),
            created_at: now,
        })
    }

    /// Parse the free-text streak length a user typed
    pub fn parse_declared_days(input: &str) -> Result<i64, DomainError> {
        let days: i64 = input
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidStreakDays(format!("'{}' is not a number", input.trim())))?;
        Self::validate_declared_days(days)?;
        Ok(days)
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Whole days covered by this journey, up to its end or `now` if still open
    pub fn elapsed_days(&self, now: DateTime<Utc>) -> i64 {
        elapsed_days(self.start, self.end.unwrap_or(now))
    }

    /// Mark the journey as ended by a relapse
    pub fn close(&mut self, note: &str, now: DateTime<Utc>) -> Result<(), DomainError> {
        if note.chars().count() > MAX_TEXT_LENGTH {
            return Err(DomainError::TextTooLong {
                length: note.chars().count(),
                max: MAX_TEXT_LENGTH,
            });
        }
        self.end = Some(now);
        self.note = note.trim().to_string();
        Ok(())
    }

    fn validate_declared_days(days: i64) -> Result<(), DomainError> {
        if days < 0 {
            return Err(DomainError::InvalidStreakDays(format!("{} is negative", days)));
        }
        if days > MAX_DECLARED_DAYS {
            return Err(DomainError::InvalidStreakDays(format!(
                "{} is longer than {} days",
                days, MAX_DECLARED_DAYS
            )));
        }
        Ok(())
    }
}

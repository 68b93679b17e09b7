/// Entry entity for daily check-ins
///
/// An Entry is what a user leaves behind after a check-in where they did
/// not relapse: a 1-10 self rating, a free-text note and a privacy flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, EntryId, UserId};

/// Maximum length of any free text a user submits
pub const MAX_TEXT_LENGTH: usize = 4096;

/// Lowest and highest self rating a check-in accepts
pub const NOTE_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// A user's daily check-in note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub user_id: UserId,
    /// Private until the user picks otherwise
    pub is_public: bool,
    /// Self rating from 1 to 10
    pub note: u8,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Create a new entry with validation
    ///
    /// The privacy flag starts out private; the check-in flow finalizes it
    /// once the user answers the public/private question.
    pub fn new(user_id: UserId, note: u8, text: &str, now: DateTime<Utc>) -> Result<Self, DomainError> {
        Self::validate_note(note as i64)?;
        let text = Self::validate_text(text)?;

        Ok(Self {
            id: EntryId::new(),
            user_id,
            is_public: false,
            note,
            text,
            created_at: now,
        })
    }

    /// Parse the self rating a user selected
    pub fn parse_note(input: &str) -> Result<u8, DomainError> {
        let value: i64 = input.trim().parse().map_err(|_| DomainError::Validation {
            message: format!("'{}' is not a note from 1 to 10", input.trim()),
        })?;
        Self::validate_note(value)?;
        Ok(value as u8)
    }

    fn validate_note(value: i64) -> Result<(), DomainError> {
        if value < *NOTE_RANGE.start() as i64 || value > *NOTE_RANGE.end() as i64 {
            return Err(DomainError::InvalidNote(value));
        }
        Ok(())
    }

    fn validate_text(text: &str) -> Result<String, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::Validation {
                message: "Entry text cannot be empty".to_string(),
            });
        }
        let length = text.chars().count();
        if length > MAX_TEXT_LENGTH {
            return Err(DomainError::TextTooLong { length, max: MAX_TEXT_LENGTH });
        }
        Ok(text.to_string())
    }
}

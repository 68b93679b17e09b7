/// User entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::UserId;

/// A chat user known to the tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Display name, without a leading `@`
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, username: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: normalize_username(username),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Strip surrounding whitespace and the `@` handle prefix
pub fn normalize_username(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_string()
}

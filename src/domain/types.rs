/// Identifier types and small enums shared across the domain layer

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Identity of a chat user
///
/// Users are identified by the numeric id their chat platform hands us,
/// so this is not generated locally like the row identifiers below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an identifier from its string form (used when loading rows)
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a journey (one streak attempt)
    JourneyId
);
uuid_id!(
    /// Unique identifier for a check-in entry
    EntryId
);
uuid_id!(
    /// Unique identifier for an assigned task instance
    TaskId
);

/// Which entries a history page shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryScope {
    All,
    Public,
    Private,
}

impl EntryScope {
    /// The `is_public` value rows must have, or `None` for every row
    pub fn privacy_filter(self) -> Option<bool> {
        match self {
            EntryScope::All => None,
            EntryScope::Public => Some(true),
            EntryScope::Private => Some(false),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryScope::All => "all",
            EntryScope::Public => "public",
            EntryScope::Private => "private",
        }
    }
}

impl FromStr for EntryScope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(EntryScope::All),
            "public" => Ok(EntryScope::Public),
            "private" => Ok(EntryScope::Private),
            other => Err(DomainError::Validation {
                message: format!(
                    "Invalid entry scope '{}'. Valid options: all, public, private",
                    other
                ),
            }),
        }
    }
}

/// Rank ladders and the rank resolver
///
/// A rank system is a named ladder of day thresholds, each mapped to a
/// milestone label. The ladders are sorted once when the table is built,
/// so resolving a rank is a linear scan over an ordered list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::elapsed_days;
use crate::domain::DomainError;

/// One rung of a rank ladder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankLevel {
    /// The rung holds while the elapsed days are at most this value
    pub days: u32,
    pub label: String,
}

/// A named rank ladder as it appears in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankDefinition {
    pub name: String,
    pub levels: Vec<RankLevel>,
}

/// Result of resolving a rank for a journey
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankResolution {
    /// The requested rung exists
    Tier(RankLevel),
    /// The user already holds the top rung and asked for one past it;
    /// carries the top rung
    MaxRank(RankLevel),
    /// Every threshold is exceeded, or the rank system is unknown
    Exhausted,
}

impl RankResolution {
    pub fn threshold(&self) -> u32 {
        match self {
            RankResolution::Tier(level) | RankResolution::MaxRank(level) => level.days,
            RankResolution::Exhausted => 0,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RankResolution::Tier(level) | RankResolution::MaxRank(level) => &level.label,
            RankResolution::Exhausted => "",
        }
    }

    pub fn is_max_rank(&self) -> bool {
        matches!(self, RankResolution::MaxRank(_))
    }
}

/// All configured rank ladders, each sorted by ascending threshold
#[derive(Debug, Clone, Default)]
pub struct RankTable {
    systems: Vec<RankDefinition>,
}

impl RankTable {
    /// Build the table, validating and sorting every ladder
    pub fn new(definitions: Vec<RankDefinition>) -> Result<Self, DomainError> {
        let mut systems: Vec<RankDefinition> = Vec::with_capacity(definitions.len());

        for mut definition in definitions {
            let name = definition.name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::InvalidRankSystem {
                    name,
                    message: "name cannot be empty".to_string(),
                });
            }
            if systems.iter().any(|s| s.name.eq_ignore_ascii_case(&name)) {
                return Err(DomainError::InvalidRankSystem {
                    name,
                    message: "defined more than once".to_string(),
                });
            }
            if definition.levels.is_empty() {
                return Err(DomainError::InvalidRankSystem {
                    name,
                    message: "needs at least one level".to_string(),
                });
            }

            definition.levels.sort_by_key(|level| level.days);
            if definition.levels.windows(2).any(|pair| pair[0].days == pair[1].days) {
                return Err(DomainError::InvalidRankSystem {
                    name,
                    message: "thresholds must be unique".to_string(),
                });
            }

            definition.name = name;
            systems.push(definition);
        }

        Ok(Self { systems })
    }

    /// Look up a ladder by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&RankDefinition> {
        let name = name.trim();
        self.systems.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn systems(&self) -> &[RankDefinition] {
        &self.systems
    }

    pub fn names(&self) -> Vec<String> {
        self.systems.iter().map(|s| s.name.clone()).collect()
    }

    /// Resolve the rung `offset` steps above the one a journey started at
    /// `start` currently holds (0 = current rank, 1 = next rank)
    pub fn resolve(
        &self,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
        rank_system: &str,
        offset: usize,
    ) -> RankResolution {
        let days = elapsed_days(start, now);

        let Some(system) = self.get(rank_system) else {
            tracing::debug!("Unknown rank system '{}'", rank_system);
            return RankResolution::Exhausted;
        };

        for (index, level) in system.levels.iter().enumerate() {
            if days <= i64::from(level.days) {
                return match system.levels.get(index + offset) {
                    Some(target) => RankResolution::Tier(target.clone()),
                    None => match system.levels.last() {
                        Some(top) => RankResolution::MaxRank(top.clone()),
                        None => RankResolution::Exhausted,
                    },
                };
            }
        }

        RankResolution::Exhausted
    }

    /// Current and next rank of a journey, the pair every summary shows
    pub fn current_and_next(
        &self,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
        rank_system: Option<&str>,
    ) -> (RankResolution, RankResolution) {
        match rank_system {
            Some(name) => (
                self.resolve(start, now, name, 0),
                self.resolve(start, now, name, 1),
            ),
            None => (RankResolution::Exhausted, RankResolution::Exhausted),
        }
    }
}

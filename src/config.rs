/// Tracker configuration
///
/// Rank ladders, the task catalog and the per-day limits. Loaded from a
/// JSON file when one is given on the command line; every field has a
/// default so a missing file (or a partial one) still yields a working
/// tracker.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{Clock, SystemClock};
use crate::domain::{RankDefinition, RankLevel, RankTable, TaskCatalog, TaskDefinition};
use crate::flows::MAX_ANSWER_TIMEOUT_SECS;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_daily_check_ins() -> u32 {
    3
}

fn default_daily_tasks() -> u32 {
    3
}

fn default_page_size() -> usize {
    10
}

fn default_answer_timeout_secs() -> u64 {
    300
}

/// Per-user limits and conversation pacing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Entries a user may create per local day
    #[serde(default = "default_daily_check_ins")]
    pub daily_check_ins: u32,
    /// Tasks a user may work through per local day
    #[serde(default = "default_daily_tasks")]
    pub daily_tasks: u32,
    /// Entries per history page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// How long a conversation waits for an answer
    #[serde(default = "default_answer_timeout_secs")]
    pub answer_timeout_secs: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            daily_check_ins: default_daily_check_ins(),
            daily_tasks: default_daily_tasks(),
            page_size: default_page_size(),
            answer_timeout_secs: default_answer_timeout_secs(),
        }
    }
}

/// Full tracker configuration
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | rank_systems | built-in ladders | Named day-threshold ladders users pick from |
/// | tasks | built-in catalog | Assignable micro-tasks and their points |
/// | limits | 3 / 3 / 10 / 300s | Check-ins per day, tasks per day, page size, answer timeout |
/// | utc_offset_minutes | system zone | Fixed offset used for "local midnight" |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_rank_systems")]
    pub rank_systems: Vec<RankDefinition>,
    #[serde(default = "default_tasks")]
    pub tasks: Vec<TaskDefinition>,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            rank_systems: default_rank_systems(),
            tasks: default_tasks(),
            limits: Limits::default(),
            utc_offset_minutes: None,
        }
    }
}

impl TrackerConfig {
    /// Read and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: TrackerConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::info!(
            "Loaded configuration from {}: {} rank systems, {} tasks",
            path.display(),
            config.rank_systems.len(),
            config.tasks.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Rank ladders carry their own checks
        self.rank_table()?;

        if self.tasks.is_empty() {
            return Err(ConfigError::Invalid("at least one task is required".to_string()));
        }
        let mut seen = HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.id) {
                return Err(ConfigError::Invalid(format!("task id {} is defined twice", task.id)));
            }
            if task.points < 0 {
                return Err(ConfigError::Invalid(format!("task {} has negative points", task.id)));
            }
        }

        let limits = &self.limits;
        if limits.daily_check_ins == 0 || limits.daily_tasks == 0 {
            return Err(ConfigError::Invalid("daily limits must be at least 1".to_string()));
        }
        if limits.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".to_string()));
        }
        if limits.answer_timeout_secs == 0 || limits.answer_timeout_secs > MAX_ANSWER_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "answer_timeout_secs must be between 1 and {}",
                MAX_ANSWER_TIMEOUT_SECS
            )));
        }

        self.utc_offset()?;
        Ok(())
    }

    /// Build the sorted rank table once from the configured ladders
    pub fn rank_table(&self) -> Result<RankTable, ConfigError> {
        RankTable::new(self.rank_systems.clone()).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn task_catalog(&self) -> TaskCatalog {
        TaskCatalog::new(self.tasks.clone())
    }

    fn utc_offset(&self) -> Result<Option<FixedOffset>, ConfigError> {
        match self.utc_offset_minutes {
            None => Ok(None),
            Some(minutes) => minutes.checked_mul(60).and_then(FixedOffset::east_opt).map(Some).ok_or_else(|| {
                ConfigError::Invalid(format!("utc_offset_minutes {} is out of range", minutes))
            }),
        }
    }

    /// The wall clock matching this configuration's day boundaries
    pub fn system_clock(&self) -> Result<Arc<dyn Clock>, ConfigError> {
        Ok(match self.utc_offset()? {
            Some(offset) => Arc::new(SystemClock::with_offset(offset)),
            None => Arc::new(SystemClock::new()),
        })
    }
}

fn ladder(name: &str, levels: &[(u32, &str)]) -> RankDefinition {
    RankDefinition {
        name: name.to_string(),
        levels: levels
            .iter()
            .map(|(days, label)| RankLevel { days: *days, label: label.to_string() })
            .collect(),
    }
}

fn default_rank_systems() -> Vec<RankDefinition> {
    vec![
        ladder(
            "Military",
            &[
                (3, "Recruit"),
                (7, "Private"),
                (14, "Corporal"),
                (30, "Sergeant"),
                (60, "Lieutenant"),
                (90, "Captain"),
                (180, "Major"),
                (365, "Colonel"),
                (730, "General"),
            ],
        ),
        ladder(
            "Belts",
            &[
                (7, "White belt"),
                (14, "Yellow belt"),
                (30, "Orange belt"),
                (60, "Green belt"),
                (90, "Blue belt"),
                (180, "Brown belt"),
                (365, "Black belt"),
            ],
        ),
        ladder(
            "Memes",
            &[
                (1, "Absolute beginner"),
                (7, "Gigachad in training"),
                (30, "Monk mode"),
                (90, "Touch-grass champion"),
                (365, "Ascended"),
            ],
        ),
    ]
}

fn default_tasks() -> Vec<TaskDefinition> {
    [
        (0, 10, "task-cold-shower"),
        (1, 10, "task-walk-30-minutes"),
        (2, 15, "task-read-20-pages"),
        (3, 5, "task-drink-water"),
        (4, 20, "task-no-phone-hour"),
        (5, 15, "task-workout"),
        (6, 10, "task-meditate-10-minutes"),
        (7, 5, "task-make-bed"),
    ]
    .into_iter()
    .map(|(id, points, key)| TaskDefinition { id, points, prompt_key: key.to_string() })
    .collect()
}

/// Activity: the derived, never-stored view over a user's history

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Entry, Journey, Task};

/// One item of a user's chronological activity stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub item: ActivityItem,
}

/// What happened, tagged with its kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum ActivityItem {
    Journey(Journey),
    Entry(Entry),
    Task(Task),
}

impl ActivityItem {
    pub fn kind(&self) -> &'static str {
        match self {
            ActivityItem::Journey(_) => "journey",
            ActivityItem::Entry(_) => "entry",
            ActivityItem::Task(_) => "task",
        }
    }
}

impl From<Journey> for Activity {
    fn from(journey: Journey) -> Self {
        Self { created_at: journey.created_at, item: ActivityItem::Journey(journey) }
    }
}

impl From<Entry> for Activity {
    fn from(entry: Entry) -> Self {
        Self { created_at: entry.created_at, item: ActivityItem::Entry(entry) }
    }
}

impl From<Task> for Activity {
    fn from(task: Task) -> Self {
        Self { created_at: task.created_at, item: ActivityItem::Task(task) }
    }
}

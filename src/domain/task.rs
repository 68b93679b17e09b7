/// Task instances and the task catalog they are drawn from

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{TaskId, UserId};

/// One entry of the assignable task catalog (read-only configuration)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: u32,
    /// Points awarded to the score once assigned
    pub points: i64,
    /// Text key the transport renders into the actual challenge
    pub prompt_key: String,
}

/// A micro-challenge handed to a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    /// Which `TaskDefinition` this instance was drawn from
    pub task_ref: u32,
    /// Transport message the task was announced in, if any
    pub message_ref: Option<i64>,
    pub is_done: bool,
    pub created_at: DateTime<Utc>,
    /// Completion time once done; equal to `created_at` before that
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Hand out a task drawn from `definition`
    pub fn assign(
        user_id: UserId,
        definition: &TaskDefinition,
        message_ref: Option<i64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            user_id,
            task_ref: definition.id,
            message_ref,
            is_done: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_done(&mut self, now: DateTime<Utc>) {
        self.is_done = true;
        self.updated_at = now;
    }
}

/// Lookup table over the configured task definitions
#[derive(Debug, Clone, Default)]
pub struct TaskCatalog {
    definitions: Vec<TaskDefinition>,
}

impl TaskCatalog {
    pub fn new(definitions: Vec<TaskDefinition>) -> Self {
        Self { definitions }
    }

    pub fn get(&self, id: u32) -> Option<&TaskDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// Points a task instance is worth; unknown references are worth nothing
    pub fn points_for(&self, task_ref: u32) -> i64 {
        match self.get(task_ref) {
            Some(definition) => definition.points,
            None => {
                tracing::warn!("Task reference {} is not in the catalog, counting 0 points", task_ref);
                0
            }
        }
    }

    pub fn definitions(&self) -> &[TaskDefinition] {
        &self.definitions
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Task assignment and completion

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::clock::Clock;
use crate::domain::{Task, TaskCatalog, TaskDefinition, UserId};
use crate::services::TrackerError;
use crate::storage::TrackerStorage;

/// Outcome of asking for a task
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskAssignment {
    /// A new task was drawn from the catalog
    Assigned { task: Task, definition: TaskDefinition },
    /// The user still has this task open; nothing new was created
    Unfinished { task: Task },
}

/// A task that was just marked done and what it was worth
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskCompletion {
    pub task: Task,
    pub points: i64,
    pub prompt_key: Option<String>,
}

/// Hand the user a random task, unless today's quota is spent or one is
/// still open
pub fn request_task<S, R>(
    storage: &S,
    catalog: &TaskCatalog,
    daily_limit: u32,
    clock: &dyn Clock,
    rng: &mut R,
    user_id: UserId,
    message_ref: Option<i64>,
) -> Result<TaskAssignment, TrackerError>
where
    S: TrackerStorage,
    R: Rng + ?Sized,
{
    let now = clock.now();

    let today = storage.count_tasks_updated_between(user_id, clock.local_midnight(), now)?;
    if today >= u64::from(daily_limit) {
        return Err(TrackerError::QuotaExceeded(format!(
            "{} tasks already today, come back tomorrow",
            today
        )));
    }

    if let Some(task) = storage.find_undone_task(user_id)? {
        tracing::debug!("User {} still has task {} open", user_id, task.id);
        return Ok(TaskAssignment::Unfinished { task });
    }

    let definition = catalog
        .definitions()
        .choose(rng)
        .cloned()
        .ok_or_else(|| TrackerError::NotFound("no tasks are configured".to_string()))?;

    let task = Task::assign(user_id, &definition, message_ref, now);
    storage.create_task(&task)?;

    tracing::info!("Assigned task {} ({}) to user {}", task.id, definition.prompt_key, user_id);
    Ok(TaskAssignment::Assigned { task, definition })
}

/// Mark the user's open task as done
///
/// Points are not stored anywhere; the scoring engine picks them up from
/// the task reference on its next run.
pub fn complete_task<S: TrackerStorage>(
    storage: &S,
    catalog: &TaskCatalog,
    clock: &dyn Clock,
    user_id: UserId,
) -> Result<TaskCompletion, TrackerError> {
    let mut task = storage
        .find_undone_task(user_id)?
        .ok_or_else(|| TrackerError::NotFound(format!("open task for user {}", user_id)))?;

    task.mark_done(clock.now());
    storage.update_task(&task)?;

    let definition = catalog.get(task.task_ref);
    let points = catalog.points_for(task.task_ref);
    tracing::info!("User {} completed task {} for {} points", user_id, task.id, points);

    Ok(TaskCompletion {
        prompt_key: definition.map(|d| d.prompt_key.clone()),
        task,
        points,
    })
}

/// Tools for micro-tasks
///
/// This module implements the task_request and task_complete MCP tools.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::domain::UserId;
use crate::services::{TaskAssignment, TaskCompletion, TrackerError};
use crate::tools::{ToolResponse, UserParams};
use crate::RecoveryTrackerServer;

/// Parameters for requesting a task
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TaskRequestParams {
    pub user_id: i64,
    /// Id of the chat message the task will be announced in (optional)
    #[serde(default)]
    pub message_ref: Option<i64>,
}

pub fn task_request(
    tracker: &mut RecoveryTrackerServer,
    params: TaskRequestParams,
) -> Result<ToolResponse<TaskAssignment>, TrackerError> {
    let assignment = tracker.request_task(UserId(params.user_id), params.message_ref)?;

    let message = match &assignment {
        TaskAssignment::Assigned { task, definition } => format!(
            "New task: {} (worth {} points), assigned {}. Call task_complete when done.",
            definition.prompt_key,
            definition.points,
            task.created_at.format("%d %b %y %H:%M")
        ),
        TaskAssignment::Unfinished { task } => match task.message_ref {
            Some(message_ref) => format!(
                "Finish your current task first (see message {}).",
                message_ref
            ),
            None => "Finish your current task first.".to_string(),
        },
    };

    Ok(ToolResponse::new(message, assignment))
}

pub fn task_complete(
    tracker: &RecoveryTrackerServer,
    params: UserParams,
) -> Result<ToolResponse<TaskCompletion>, TrackerError> {
    let completion = tracker.complete_task(UserId(params.user_id))?;

    let message = format!(
        "Task {} done: assigned {}, finished {}. +{} points.",
        completion.prompt_key.as_deref().unwrap_or("(retired task)"),
        completion.task.created_at.format("%d %b %y %H:%M"),
        completion.task.updated_at.format("%d %b %y %H:%M"),
        completion.points
    );

    Ok(ToolResponse::new(message, completion))
}

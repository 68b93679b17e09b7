/// Tools for browsing and exporting history
///
/// This module implements the entries_list, activity_list and
/// history_export MCP tools.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::domain::{Activity, ActivityItem, EntryScope, UserId};
use crate::services::{EntryPage, HistoryExport, TrackerError};
use crate::tools::{ToolResponse, UserParams};
use crate::RecoveryTrackerServer;

/// Parameters for paging through entries
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EntriesListParams {
    pub user_id: i64,
    /// all, public or private (default: all)
    #[serde(default)]
    pub scope: Option<EntryScope>,
    /// 1-based page number (default: 1)
    #[serde(default)]
    pub page: Option<usize>,
}

pub fn entries_list(
    tracker: &RecoveryTrackerServer,
    params: EntriesListParams,
) -> Result<ToolResponse<EntryPage>, TrackerError> {
    let scope = params.scope.unwrap_or(EntryScope::All);
    let page = tracker.entries(UserId(params.user_id), scope, params.page.unwrap_or(1))?;

    let mut message = format!(
        "{} entries, page {} of {} ({} total)",
        scope.as_str(),
        page.page,
        page.total_pages,
        page.total_count
    );
    for entry in &page.items {
        message.push_str(&format!(
            "\n{} [{}/10] {}",
            entry.created_at.format("%d %b %y"),
            entry.note,
            entry.text
        ));
    }

    Ok(ToolResponse::new(message, page))
}

pub fn activity_list(
    tracker: &RecoveryTrackerServer,
    params: UserParams,
) -> Result<ToolResponse<Vec<Activity>>, TrackerError> {
    let activity = tracker.activity(UserId(params.user_id))?;

    let mut message = format!("{} activity items", activity.len());
    for item in &activity {
        let detail = match &item.item {
            ActivityItem::Journey(journey) => match journey.end {
                Some(end) => format!("journey ended {}", end.format("%d %b %y")),
                None => format!("journey started {}", journey.start.format("%d %b %y")),
            },
            ActivityItem::Entry(entry) => format!("check-in rated {}/10", entry.note),
            ActivityItem::Task(task) => {
                format!("task {}{}", task.task_ref, if task.is_done { " (done)" } else { "" })
            }
        };
        message.push_str(&format!("\n{} {}", item.created_at.format("%d %b %y %H:%M"), detail));
    }

    Ok(ToolResponse::new(message, activity))
}

pub fn history_export(
    tracker: &RecoveryTrackerServer,
    params: UserParams,
) -> Result<ToolResponse<HistoryExport>, TrackerError> {
    let export = tracker.export_history(UserId(params.user_id))?;
    let message = format!(
        "Exported {} journeys, {} entries and {} tasks",
        export.journeys.len(),
        export.entries.len(),
        export.tasks.len()
    );
    Ok(ToolResponse::new(message, export))
}

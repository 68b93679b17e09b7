/// Tools for the profile and account views
///
/// profile_view shows anyone's standing (by id or by username) next to
/// their public entries; account_view is the same summary for the caller,
/// paging through all of their entries.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{EntryScope, UserId};
use crate::services::{EntryPage, ProfileSummary, TrackerError};
use crate::tools::ToolResponse;
use crate::RecoveryTrackerServer;

/// Parameters for viewing a profile; give exactly one of the two
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProfileParams {
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Display name, with or without a leading @
    #[serde(default)]
    pub username: Option<String>,
    /// Page of public entries to include (default: 1)
    #[serde(default)]
    pub page: Option<usize>,
}

/// Parameters for the caller's own account view
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AccountParams {
    pub user_id: i64,
    /// Page of entries to include (default: 1)
    #[serde(default)]
    pub page: Option<usize>,
}

/// A profile summary with one page of entries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub summary: ProfileSummary,
    pub entries: EntryPage,
}

pub fn profile_view(
    tracker: &RecoveryTrackerServer,
    params: ProfileParams,
) -> Result<ToolResponse<ProfileView>, TrackerError> {
    let summary = match (params.user_id, params.username.as_deref()) {
        (Some(user_id), None) => tracker.profile(UserId(user_id))?,
        (None, Some(username)) => tracker.profile_by_username(username)?,
        _ => {
            return Err(TrackerError::Validation(
                "give either user_id or username".to_string(),
            ))
        }
    };

    // Other people only ever see what was shared
    let entries = tracker.entries(summary.user_id, EntryScope::Public, params.page.unwrap_or(1))?;
    Ok(view(summary, entries))
}

pub fn account_view(
    tracker: &RecoveryTrackerServer,
    params: AccountParams,
) -> Result<ToolResponse<ProfileView>, TrackerError> {
    let user_id = UserId(params.user_id);
    let summary = tracker.profile(user_id)?;
    let entries = tracker.entries(user_id, EntryScope::All, params.page.unwrap_or(1))?;
    Ok(view(summary, entries))
}

fn view(summary: ProfileSummary, entries: EntryPage) -> ToolResponse<ProfileView> {
    let mut message = render_profile(&summary);
    message.push_str(&format!(
        "\n\n{} entries, page {} of {}",
        entries.scope.as_str(),
        entries.page,
        entries.total_pages
    ));
    for entry in &entries.items {
        message.push_str(&format!(
            "\n{} [{}/10] {}",
            entry.created_at.format("%d %b %y"),
            entry.note,
            entry.text
        ));
    }
    ToolResponse::new(message, ProfileView { summary, entries })
}

fn render_profile(summary: &ProfileSummary) -> String {
    let name = summary
        .username
        .clone()
        .unwrap_or_else(|| format!("user {}", summary.user_id));

    let journey = if summary.journey_is_current { "Current journey" } else { "Last journey" };

    let next_rank = if summary.next_rank.is_max_rank() {
        "top rank reached".to_string()
    } else if summary.next_rank.label().is_empty() {
        "-".to_string()
    } else {
        format!("{} at {} days", summary.next_rank.label(), summary.next_rank.threshold())
    };

    format!(
        "{name}\n\
         Score: {total} total, {current} this journey\n\
         {journey}: since {start}, {days} days\n\
         Rank: {rank} (next: {next_rank})\n\
         This journey: {entries} entries, {tasks} tasks\n\
         All time: {count} journeys, {total_days} days (avg {average}), {total_entries} entries, {total_tasks} tasks",
        name = name,
        total = summary.total_score,
        current = summary.current_score,
        journey = journey,
        start = summary.journey_start.format("%d %b %y"),
        days = summary.days,
        rank = if summary.current_rank.label().is_empty() { "-" } else { summary.current_rank.label() },
        next_rank = next_rank,
        entries = summary.entries_this_journey,
        tasks = summary.tasks_this_journey,
        count = summary.journey_count,
        total_days = summary.total_days,
        average = summary.average_days,
        total_entries = summary.total_entries,
        total_tasks = summary.total_tasks,
    )
}

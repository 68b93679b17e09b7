/// History pagination, the activity stream and the data export

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Activity, Entry, EntryScope, Journey, Task, UserId};
use crate::services::TrackerError;
use crate::storage::TrackerStorage;

/// One page of a user's entries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryPage {
    pub items: Vec<Entry>,
    pub scope: EntryScope,
    /// 1-based page number that was requested
    pub page: usize,
    pub page_size: usize,
    pub total_count: u64,
    /// Number of non-empty pages (at least 1, even for an empty history)
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Everything a user has on record, for download
#[derive(Debug, Clone, Serialize)]
pub struct HistoryExport {
    pub user_id: UserId,
    pub exported_at: DateTime<Utc>,
    pub activity: Vec<Activity>,
    pub journeys: Vec<Journey>,
    pub entries: Vec<Entry>,
    pub tasks: Vec<Task>,
}

/// Serve entries `[(page-1)*page_size, page*page_size)`, oldest first
pub fn list_entries<S: TrackerStorage>(
    storage: &S,
    user_id: UserId,
    scope: EntryScope,
    page: usize,
    page_size: usize,
) -> Result<EntryPage, TrackerError> {
    if page == 0 {
        return Err(TrackerError::Validation("pages are numbered from 1".to_string()));
    }
    if page_size == 0 {
        return Err(TrackerError::Validation("page size must be at least 1".to_string()));
    }

    let total_count = storage.count_entries(user_id, scope)?;
    let offset = (page - 1).saturating_mul(page_size);
    let items = if (offset as u64) < total_count {
        storage.list_entries(user_id, scope, Some(page_size), offset)?
    } else {
        Vec::new()
    };

    let total = total_count as usize;
    let total_pages = total.div_ceil(page_size).max(1);

    Ok(EntryPage {
        items,
        scope,
        page,
        page_size,
        total_count,
        total_pages,
        has_next: page.saturating_mul(page_size) < total,
        has_previous: page > 1,
    })
}

/// Journeys, entries and tasks merged by creation time
///
/// The sort is stable, so items created at the same instant keep the
/// journeys, entries, tasks order they were collected in.
pub fn build_activity_stream<S: TrackerStorage>(
    storage: &S,
    user_id: UserId,
) -> Result<Vec<Activity>, TrackerError> {
    let journeys = storage.list_journeys(user_id)?;
    let entries = storage.list_entries(user_id, EntryScope::All, None, 0)?;
    let tasks = storage.list_tasks(user_id)?;

    Ok(merge_activity(&journeys, &entries, &tasks))
}

fn merge_activity(journeys: &[Journey], entries: &[Entry], tasks: &[Task]) -> Vec<Activity> {
    let mut activity: Vec<Activity> = Vec::with_capacity(journeys.len() + entries.len() + tasks.len());
    activity.extend(journeys.iter().cloned().map(Activity::from));
    activity.extend(entries.iter().cloned().map(Activity::from));
    activity.extend(tasks.iter().cloned().map(Activity::from));

    activity.sort_by_key(|a| a.created_at);
    activity
}

pub fn export_history<S: TrackerStorage>(
    storage: &S,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Result<HistoryExport, TrackerError> {
    let journeys = storage.list_journeys(user_id)?;
    let entries = storage.list_entries(user_id, EntryScope::All, None, 0)?;
    let tasks = storage.list_tasks(user_id)?;
    let activity = merge_activity(&journeys, &entries, &tasks);

    tracing::info!("Exported {} activity items for user {}", activity.len(), user_id);
    Ok(HistoryExport {
        user_id,
        exported_at: now,
        activity,
        journeys,
        entries,
        tasks,
    })
}

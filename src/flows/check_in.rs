/// The daily check-in conversation
///
/// relapsed -> closing note -> journey closed
/// survived -> rating -> text -> entry stored private -> privacy choice

use crate::domain::{Entry, EntryId, UserId, NOTE_RANGE};
use crate::flows::{FlowContext, FlowEvent, FlowState, Step};
use crate::services::{self, TrackerError};
use crate::storage::TrackerStorage;

pub(crate) const RELAPSED: &str = "relapsed";
pub(crate) const SURVIVED: &str = "survived";
pub(crate) const PUBLIC: &str = "public";
pub(crate) const PRIVATE: &str = "private";

pub(crate) fn begin<S: TrackerStorage>(ctx: &FlowContext<'_, S>, user_id: UserId) -> Result<Step, TrackerError> {
    if !services::has_open_journey(ctx.storage, user_id)? {
        return Err(TrackerError::NotFound(
            "you have no journey going; start one first".to_string(),
        ));
    }

    let today = ctx
        .storage
        .count_entries_created_between(user_id, ctx.clock.local_midnight(), ctx.clock.now())?;
    if today >= u64::from(ctx.limits.daily_check_ins) {
        return Err(TrackerError::QuotaExceeded(format!(
            "already checked in {} times today",
            today
        )));
    }

    Ok(Step::Continue {
        state: FlowState::AwaitingRelapseAnswer,
        message: "Did you relapse since your last check-in?".to_string(),
        choices: Some(vec![RELAPSED.to_string(), SURVIVED.to_string()]),
        event: None,
    })
}

pub(crate) fn relapse_answer(choice: &str) -> Result<Step, TrackerError> {
    if choice == RELAPSED {
        return Ok(Step::Continue {
            state: FlowState::AwaitingRelapseNote,
            message: "Sorry to hear that. What happened? A few words close this journey.".to_string(),
            choices: None,
            event: None,
        });
    }

    Ok(Step::Continue {
        state: FlowState::AwaitingNote,
        message: "Well done. How would you rate today?".to_string(),
        choices: Some(NOTE_RANGE.map(|n| n.to_string()).collect()),
        event: None,
    })
}

pub(crate) fn relapse_note<S: TrackerStorage>(
    ctx: &FlowContext<'_, S>,
    user_id: UserId,
    text: &str,
) -> Result<Step, TrackerError> {
    let journey = services::close_journey(ctx.storage, user_id, text, ctx.clock.now())?;
    let days = journey.elapsed_days(ctx.clock.now());

    Ok(Step::Finish {
        message: format!("Journey closed after {} days. Start a new one whenever you are ready.", days),
        event: Some(FlowEvent::JourneyClosed { journey }),
    })
}

pub(crate) fn note(choice: &str) -> Result<Step, TrackerError> {
    let note = Entry::parse_note(choice)?;

    Ok(Step::Continue {
        state: FlowState::AwaitingEntryText { note },
        message: "Write a few lines about your day.".to_string(),
        choices: None,
        event: None,
    })
}

pub(crate) fn entry_text<S: TrackerStorage>(
    ctx: &FlowContext<'_, S>,
    user_id: UserId,
    note: u8,
    text: &str,
) -> Result<Step, TrackerError> {
    let entry = Entry::new(user_id, note, text, ctx.clock.now())?;
    ctx.storage.create_entry(&entry)?;
    tracing::info!("User {} wrote entry {} (note {})", user_id, entry.id, note);

    Ok(Step::Continue {
        state: FlowState::AwaitingPrivacyChoice { entry_id: entry.id },
        message: "Saved. Should this entry show on your public profile?".to_string(),
        choices: Some(vec![PUBLIC.to_string(), PRIVATE.to_string()]),
        event: Some(FlowEvent::EntryCreated { entry }),
    })
}

pub(crate) fn privacy_choice<S: TrackerStorage>(
    ctx: &FlowContext<'_, S>,
    entry_id: EntryId,
    choice: &str,
) -> Result<Step, TrackerError> {
    let is_public = choice == PUBLIC;
    ctx.storage.update_entry_privacy(entry_id, is_public)?;
    let entry = ctx.storage.get_entry(entry_id)?;
    tracing::info!("Entry {} finalized as {}", entry_id, choice);

    Ok(Step::Finish {
        message: format!("Check-in complete. Your entry is {}.", choice),
        event: Some(FlowEvent::EntryFinalized { entry }),
    })
}

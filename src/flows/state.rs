/// Conversation states

use serde::Serialize;

use crate::domain::{EntryId, JourneyId};

/// Where a user's pending conversation stands
///
/// Idle is not a variant: a user with no entry in the conversation table
/// is idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    /// New journey: waiting for the streak the user already has
    AwaitingStreakDays,
    /// New journey created, waiting for the rank ladder
    AwaitingRankChoice { journey_id: JourneyId },
    /// Check-in: relapsed or survived?
    AwaitingRelapseAnswer,
    /// Relapsed: waiting for the closing note
    AwaitingRelapseNote,
    /// Survived: waiting for the 1-10 rating
    AwaitingNote,
    /// Rating given, waiting for the entry text
    AwaitingEntryText { note: u8 },
    /// Entry stored as private, waiting for the privacy choice
    AwaitingPrivacyChoice { entry_id: EntryId },
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::AwaitingStreakDays => "awaiting_streak_days",
            FlowState::AwaitingRankChoice { .. } => "awaiting_rank_choice",
            FlowState::AwaitingRelapseAnswer => "awaiting_relapse_answer",
            FlowState::AwaitingRelapseNote => "awaiting_relapse_note",
            FlowState::AwaitingNote => "awaiting_note",
            FlowState::AwaitingEntryText { .. } => "awaiting_entry_text",
            FlowState::AwaitingPrivacyChoice { .. } => "awaiting_privacy_choice",
        }
    }
}

/// Tools that drive the multi-turn conversations
///
/// journey_new and checkin_start open a conversation and return its first
/// prompt; conversation_answer answers the pending prompt; and
/// conversation_cancel drops it.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::domain::UserId;
use crate::flows::FlowReply;
use crate::services::TrackerError;
use crate::RecoveryTrackerServer;

/// Parameters for tools that only need the user
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UserParams {
    /// Numeric id of the chat user
    pub user_id: i64,
}

/// Parameters for answering the pending prompt
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AnswerParams {
    pub user_id: i64,
    /// One of the offered choices, or free text when none were offered
    pub answer: String,
    /// Step number of the prompt being answered; stale steps are rejected.
    /// Required when the prompt offered no choices.
    #[serde(default)]
    pub step: Option<u64>,
}

pub fn journey_new(tracker: &mut RecoveryTrackerServer, params: UserParams) -> Result<FlowReply, TrackerError> {
    tracker.start_new_journey(UserId(params.user_id))
}

pub fn checkin_start(tracker: &mut RecoveryTrackerServer, params: UserParams) -> Result<FlowReply, TrackerError> {
    tracker.start_check_in(UserId(params.user_id))
}

pub fn conversation_answer(
    tracker: &mut RecoveryTrackerServer,
    params: AnswerParams,
) -> Result<FlowReply, TrackerError> {
    tracker.answer(UserId(params.user_id), &params.answer, params.step)
}

pub fn conversation_cancel(
    tracker: &mut RecoveryTrackerServer,
    params: UserParams,
) -> Result<FlowReply, TrackerError> {
    tracker.cancel(UserId(params.user_id))
}

/// Text shown for a flow reply: the message, then the choices on offer
pub fn render_flow_reply(reply: &FlowReply) -> String {
    let mut text = reply.message.clone();
    if let Some(prompt) = &reply.prompt {
        match &prompt.choices {
            Some(choices) => text.push_str(&format!("\nChoices (step {}): {}", prompt.step, choices.join(" | "))),
            None => text.push_str(&format!("\nReply with text (step {})", prompt.step)),
        }
    }
    text
}

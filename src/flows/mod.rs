/// Multi-turn conversations
///
/// Each user has at most one pending conversation, stored here as a
/// [`FlowState`] keyed by user id. A command starts a flow and returns the
/// first [`Prompt`]; every later answer is looked up by user id, checked
/// against the prompt it claims to answer, and moves the flow one step.
/// Prompts expire after the configured answer timeout. Expiry is checked
/// when the user next shows up, and [`ConversationManager::sweep_expired`]
/// clears the rest.

mod check_in;
mod new_journey;
pub mod state;

pub use state::FlowState;

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::clock::Clock;
use crate::config::Limits;
use crate::domain::{Entry, Journey, RankResolution, RankTable, UserId};
use crate::services::TrackerError;
use crate::storage::TrackerStorage;

/// Longest a prompt may stay open
pub const MAX_ANSWER_TIMEOUT_SECS: u64 = 7 * 24 * 3600;

/// Everything a flow step may read or write
pub struct FlowContext<'a, S: TrackerStorage> {
    pub storage: &'a S,
    pub ranks: &'a RankTable,
    pub limits: &'a Limits,
    pub clock: &'a dyn Clock,
}

/// A question waiting for the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    /// Quote this when answering; older steps are rejected
    pub step: u64,
    /// The accepted answers, or `None` for free text
    pub choices: Option<Vec<String>>,
    pub expires_at: DateTime<Utc>,
}

/// Something a flow step persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FlowEvent {
    JourneyStarted { journey: Journey },
    RankAssigned { journey: Journey, current_rank: RankResolution, days: i64 },
    JourneyClosed { journey: Journey },
    /// Stored as private until the privacy choice arrives
    EntryCreated { entry: Entry },
    EntryFinalized { entry: Entry },
    Canceled,
}

/// What a flow step tells the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowReply {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<FlowEvent>,
    /// Present while the conversation continues
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Prompt>,
}

/// A pending conversation
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub state: FlowState,
    pub step: u64,
    pub choices: Option<Vec<String>>,
    pub expires_at: DateTime<Utc>,
}

/// Result of one flow step
pub(crate) enum Step {
    /// Ask the next question
    Continue {
        state: FlowState,
        message: String,
        choices: Option<Vec<String>>,
        event: Option<FlowEvent>,
    },
    /// The flow is over
    Finish { message: String, event: Option<FlowEvent> },
}

/// Table of pending conversations
#[derive(Debug)]
pub struct ConversationManager {
    conversations: HashMap<UserId, Conversation>,
    timeout: Duration,
    last_step: u64,
}

impl ConversationManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            conversations: HashMap::new(),
            timeout,
            last_step: 0,
        }
    }

    pub fn from_limits(limits: &Limits) -> Self {
        let secs = limits.answer_timeout_secs.min(MAX_ANSWER_TIMEOUT_SECS) as i64;
        Self::new(Duration::seconds(secs))
    }

    pub fn pending(&self, user_id: UserId) -> Option<&Conversation> {
        self.conversations.get(&user_id)
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Start the new-journey conversation
    pub fn start_new_journey<S: TrackerStorage>(
        &mut self,
        ctx: &FlowContext<'_, S>,
        user_id: UserId,
    ) -> Result<FlowReply, TrackerError> {
        self.ensure_idle(user_id, ctx.clock.now())?;
        let step = new_journey::begin(ctx, user_id)?;
        Ok(self.apply(user_id, step, ctx.clock.now()))
    }

    /// Start the daily check-in conversation
    pub fn start_check_in<S: TrackerStorage>(
        &mut self,
        ctx: &FlowContext<'_, S>,
        user_id: UserId,
    ) -> Result<FlowReply, TrackerError> {
        self.ensure_idle(user_id, ctx.clock.now())?;
        let step = check_in::begin(ctx, user_id)?;
        Ok(self.apply(user_id, step, ctx.clock.now()))
    }

    /// Feed the user's answer to their pending conversation
    ///
    /// A choice that is not on offer, a `step` that is not the pending
    /// one, or free text sent without a `step` is rejected and the question
    /// stays open. Any other failure ends the conversation.
    pub fn answer<S: TrackerStorage>(
        &mut self,
        ctx: &FlowContext<'_, S>,
        user_id: UserId,
        answer: &str,
        step: Option<u64>,
    ) -> Result<FlowReply, TrackerError> {
        let now = ctx.clock.now();
        let conversation = self.take_live(user_id, now)?;

        if let Some(step) = step {
            if step != conversation.step {
                let pending = conversation.step;
                self.conversations.insert(user_id, conversation);
                return Err(TrackerError::Conflict(format!(
                    "answer is for step {} but step {} is pending",
                    step, pending
                )));
            }
        }

        // Free text cannot be checked against the prompt, so a retry would land on the next one
        if step.is_none() && conversation.choices.is_none() {
            self.conversations.insert(user_id, conversation);
            return Err(TrackerError::Validation(
                "a free-text answer must quote the step of the prompt it answers".to_string(),
            ));
        }

        let answer = answer.trim();
        let choice = match &conversation.choices {
            Some(choices) => choices
                .iter()
                .find(|c| c.eq_ignore_ascii_case(answer))
                .cloned()
                .ok_or_else(|| format!("'{}' is not one of: {}", answer, choices.join(", "))),
            None => Ok(answer.to_string()),
        };
        let choice = match choice {
            Ok(choice) => choice,
            Err(message) => {
                self.conversations.insert(user_id, conversation);
                return Err(TrackerError::Validation(message));
            }
        };

        let outcome = match conversation.state.clone() {
            FlowState::AwaitingStreakDays => new_journey::streak_days(ctx, user_id, &choice),
            FlowState::AwaitingRankChoice { journey_id } => {
                new_journey::rank_choice(ctx, user_id, journey_id, &choice)
            }
            FlowState::AwaitingRelapseAnswer => check_in::relapse_answer(&choice),
            FlowState::AwaitingRelapseNote => check_in::relapse_note(ctx, user_id, &choice),
            FlowState::AwaitingNote => check_in::note(&choice),
            FlowState::AwaitingEntryText { note } => check_in::entry_text(ctx, user_id, note, &choice),
            FlowState::AwaitingPrivacyChoice { entry_id } => check_in::privacy_choice(ctx, entry_id, &choice),
        };

        match outcome {
            Ok(step) => Ok(self.apply(user_id, step, now)),
            Err(e) => {
                tracing::info!(
                    "Conversation for user {} ended in {}: {}",
                    user_id,
                    conversation.state.name(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Drop the user's pending conversation
    ///
    /// Anything an earlier step already stored stays stored.
    pub fn cancel(&mut self, user_id: UserId, now: DateTime<Utc>) -> Result<FlowReply, TrackerError> {
        let conversation = self.take_live(user_id, now)?;
        tracing::info!("User {} canceled conversation in {}", user_id, conversation.state.name());

        Ok(FlowReply {
            message: TrackerError::Canceled.to_string(),
            event: Some(FlowEvent::Canceled),
            prompt: None,
        })
    }

    /// Remove every conversation whose deadline has passed
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> Vec<UserId> {
        let expired: Vec<UserId> = self
            .conversations
            .iter()
            .filter(|(_, c)| now > c.expires_at)
            .map(|(user_id, _)| *user_id)
            .collect();

        for user_id in &expired {
            if let Some(conversation) = self.conversations.remove(user_id) {
                tracing::info!(
                    "Conversation for user {} timed out in {}",
                    user_id,
                    conversation.state.name()
                );
            }
        }
        expired
    }

    fn ensure_idle(&mut self, user_id: UserId, now: DateTime<Utc>) -> Result<(), TrackerError> {
        match self.take_live(user_id, now) {
            Ok(conversation) => {
                let state = conversation.state.name();
                self.conversations.insert(user_id, conversation);
                Err(TrackerError::Conflict(format!(
                    "another command is waiting for an answer ({}); answer or cancel it first",
                    state
                )))
            }
            Err(_) => Ok(()),
        }
    }

    /// Remove and return the user's conversation if it has not expired
    fn take_live(&mut self, user_id: UserId, now: DateTime<Utc>) -> Result<Conversation, TrackerError> {
        let conversation = self
            .conversations
            .remove(&user_id)
            .ok_or_else(|| TrackerError::NotFound("nothing is waiting for an answer".to_string()))?;

        if now > conversation.expires_at {
            tracing::info!(
                "Conversation for user {} timed out in {}",
                user_id,
                conversation.state.name()
            );
            return Err(TrackerError::Timeout);
        }
        Ok(conversation)
    }

    fn apply(&mut self, user_id: UserId, step: Step, now: DateTime<Utc>) -> FlowReply {
        match step {
            Step::Continue { state, message, choices, event } => {
                self.last_step += 1;
                let conversation = Conversation {
                    state,
                    step: self.last_step,
                    choices,
                    expires_at: now + self.timeout,
                };
                let prompt = Prompt {
                    step: conversation.step,
                    choices: conversation.choices.clone(),
                    expires_at: conversation.expires_at,
                };
                tracing::debug!("User {} now {} (step {})", user_id, conversation.state.name(), conversation.step);
                self.conversations.insert(user_id, conversation);

                FlowReply { message, event, prompt: Some(prompt) }
            }
            Step::Finish { message, event } => FlowReply { message, event, prompt: None },
        }
    }
}

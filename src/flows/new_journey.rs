/// The new-journey conversation: streak days, then rank ladder

use crate::domain::{Journey, JourneyId, UserId};
use crate::flows::{FlowContext, FlowEvent, FlowState, Step};
use crate::services::{self, TrackerError};
use crate::storage::TrackerStorage;

pub(crate) fn begin<S: TrackerStorage>(ctx: &FlowContext<'_, S>, user_id: UserId) -> Result<Step, TrackerError> {
    if services::has_open_journey(ctx.storage, user_id)? {
        return Err(TrackerError::Conflict(
            "you already have a journey going; check in instead".to_string(),
        ));
    }

    Ok(Step::Continue {
        state: FlowState::AwaitingStreakDays,
        message: "How many days have you already been clean? Answer with a number.".to_string(),
        choices: None,
        event: None,
    })
}

pub(crate) fn streak_days<S: TrackerStorage>(
    ctx: &FlowContext<'_, S>,
    user_id: UserId,
    answer: &str,
) -> Result<Step, TrackerError> {
    let days = Journey::parse_declared_days(answer)?;
    let journey = services::start_journey(ctx.storage, user_id, days, ctx.clock.now())?;

    Ok(Step::Continue {
        state: FlowState::AwaitingRankChoice { journey_id: journey.id },
        message: "Journey started. Pick the rank system you want to climb.".to_string(),
        choices: Some(ctx.ranks.names()),
        event: Some(FlowEvent::JourneyStarted { journey }),
    })
}

pub(crate) fn rank_choice<S: TrackerStorage>(
    ctx: &FlowContext<'_, S>,
    user_id: UserId,
    journey_id: JourneyId,
    choice: &str,
) -> Result<Step, TrackerError> {
    let journey = services::assign_rank_system(ctx.storage, ctx.ranks, user_id, journey_id, choice)?;
    let now = ctx.clock.now();
    let rank_system = journey.rank_system.clone().unwrap_or_default();
    let current_rank = ctx.ranks.resolve(journey.start, now, &rank_system, 0);
    let days = journey.elapsed_days(now);

    let message = format!(
        "Journey saved. Rank: {} ({}), started {}, {} days in.",
        if current_rank.label().is_empty() { "beyond the top rank" } else { current_rank.label() },
        rank_system,
        journey.start.format("%d %b %y"),
        days
    );

    Ok(Step::Finish {
        message,
        event: Some(FlowEvent::RankAssigned { journey, current_rank, days }),
    })
}

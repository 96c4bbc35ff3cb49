use crate::state::PendingRequest;
use crate::{AttemptOutcome, Effect, Msg, Phase, SchedulerState, TimerDelay};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SchedulerState, msg: Msg) -> (SchedulerState, Vec<Effect>) {
    let effects = match msg {
        Msg::EnableRequested => match state.phase() {
            Phase::Idle => vec![state.arm(TimerDelay::Configured)],
            Phase::Armed => {
                let mut effects = Vec::with_capacity(2);
                effects.extend(state.cancel_armed());
                effects.push(state.arm(TimerDelay::Configured));
                effects
            }
            // Never interrupt an attempt; re-arm once it is over.
            Phase::Firing => {
                state.defer(PendingRequest::Enable);
                Vec::new()
            }
        },
        Msg::DisableRequested => match state.phase() {
            Phase::Idle => Vec::new(),
            Phase::Armed => {
                let effects: Vec<Effect> = state.cancel_armed().into_iter().collect();
                state.go_idle();
                effects
            }
            Phase::Firing => {
                state.defer(PendingRequest::Disable);
                Vec::new()
            }
        },
        Msg::TimerFired(timer) => {
            if state.is_armed_with(timer) {
                state.begin_attempt();
                vec![Effect::StartAttempt]
            } else {
                Vec::new()
            }
        }
        Msg::AttemptFinished(outcome) => {
            if state.phase() != Phase::Firing {
                return (state, Vec::new());
            }
            state.record_outcome(outcome);
            let next = match state.take_pending() {
                Some(PendingRequest::Disable) => None,
                Some(PendingRequest::Enable) => Some(TimerDelay::Configured),
                None => next_delay(outcome),
            };
            match next {
                Some(delay) => vec![state.arm(delay)],
                None => {
                    state.go_idle();
                    Vec::new()
                }
            }
        }
    };

    (state, effects)
}

fn next_delay(outcome: AttemptOutcome) -> Option<TimerDelay> {
    match outcome {
        AttemptOutcome::Submitted { remaining } if remaining > 0 => Some(TimerDelay::Configured),
        AttemptOutcome::Submitted { .. } | AttemptOutcome::QueueEmpty => None,
        AttemptOutcome::Failed => Some(TimerDelay::Backoff),
    }
}

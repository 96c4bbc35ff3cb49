use crate::state::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    /// Control surface asked for automatic submission (resets the countdown).
    EnableRequested,
    /// Control surface asked to stop automatic submission.
    DisableRequested,
    /// A timer armed earlier has elapsed.
    TimerFired(TimerId),
    /// The submission attempt started by `Effect::StartAttempt` is over.
    AttemptFinished(AttemptOutcome),
}

/// Result of one automatic submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The head prompt was dispatched and removed; `remaining` prompts are left.
    Submitted { remaining: usize },
    /// Dispatch failed and the prompt went back to the head of the queue.
    Failed,
    /// Nothing was queued.
    QueueEmpty,
}

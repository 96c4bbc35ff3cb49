use crate::state::TimerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ArmTimer { timer: TimerId, delay: TimerDelay },
    CancelTimer { timer: TimerId },
    StartAttempt,
}

/// How long an armed timer waits. The runner resolves `Configured` from
/// the settings it reads when the timer is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerDelay {
    Configured,
    Backoff,
}

use crate::view_model::SchedulerView;
use crate::{AttemptOutcome, Effect, TimerDelay};

pub type TimerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No timer armed.
    #[default]
    Idle,
    /// One timer pending; it fires once.
    Armed,
    /// A submission attempt is in flight.
    Firing,
}

/// Control request received while an attempt was in flight, applied once
/// the attempt finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingRequest {
    Enable,
    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedTimer {
    pub id: TimerId,
    pub delay: TimerDelay,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchedulerState {
    phase: Phase,
    armed: Option<ArmedTimer>,
    last_timer: TimerId,
    pending: Option<PendingRequest>,
    submitted: u64,
    failed: u64,
    consecutive_failures: u32,
    last_outcome: Option<AttemptOutcome>,
    dirty: bool,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn armed(&self) -> Option<ArmedTimer> {
        self.armed
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn view(&self) -> SchedulerView {
        SchedulerView {
            phase: self.phase,
            armed: self.armed,
            pending: self.pending,
            submitted: self.submitted,
            failed: self.failed,
            consecutive_failures: self.consecutive_failures,
            last_outcome: self.last_outcome,
        }
    }

    /// Returns whether anything observable changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Arms a fresh timer. Any previous timer id is forgotten, so a late
    /// fire from it is ignored.
    pub(crate) fn arm(&mut self, delay: TimerDelay) -> Effect {
        self.last_timer += 1;
        let timer = self.last_timer;
        self.phase = Phase::Armed;
        self.armed = Some(ArmedTimer { id: timer, delay });
        self.dirty = true;
        Effect::ArmTimer { timer, delay }
    }

    pub(crate) fn cancel_armed(&mut self) -> Option<Effect> {
        let armed = self.armed.take()?;
        self.dirty = true;
        Some(Effect::CancelTimer { timer: armed.id })
    }

    pub(crate) fn go_idle(&mut self) {
        self.phase = Phase::Idle;
        self.armed = None;
        self.pending = None;
        self.dirty = true;
    }

    pub(crate) fn is_armed_with(&self, timer: TimerId) -> bool {
        self.phase == Phase::Armed && self.armed.map(|armed| armed.id) == Some(timer)
    }

    pub(crate) fn begin_attempt(&mut self) {
        self.phase = Phase::Firing;
        self.armed = None;
        self.pending = None;
        self.dirty = true;
    }

    pub(crate) fn defer(&mut self, request: PendingRequest) {
        self.pending = Some(request);
        self.dirty = true;
    }

    pub(crate) fn take_pending(&mut self) -> Option<PendingRequest> {
        self.pending.take()
    }

    pub(crate) fn record_outcome(&mut self, outcome: AttemptOutcome) {
        match outcome {
            AttemptOutcome::Submitted { .. } => {
                self.submitted += 1;
                self.consecutive_failures = 0;
            }
            AttemptOutcome::Failed => {
                self.failed += 1;
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            }
            AttemptOutcome::QueueEmpty => {}
        }
        self.last_outcome = Some(outcome);
        self.dirty = true;
    }
}

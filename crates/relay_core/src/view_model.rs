use crate::state::{ArmedTimer, Phase, PendingRequest};
use crate::AttemptOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchedulerView {
    pub phase: Phase,
    pub armed: Option<ArmedTimer>,
    pub pending: Option<PendingRequest>,
    pub submitted: u64,
    pub failed: u64,
    pub consecutive_failures: u32,
    pub last_outcome: Option<AttemptOutcome>,
}

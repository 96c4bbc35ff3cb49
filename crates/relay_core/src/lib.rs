//! Relay core: prompt data model, splitter and the pure scheduler state machine.
mod effect;
mod msg;
mod record;
mod settings;
mod split;
mod state;
mod status;
mod update;
mod view_model;

pub use effect::{Effect, TimerDelay};
pub use msg::{AttemptOutcome, Msg};
pub use record::{PromptQueue, PromptRecord, QueueError, DEFAULT_TITLE};
pub use settings::{
    Settings, DEFAULT_AUTO_SUBMIT_DELAY_SECONDS, DEFAULT_POLL_INTERVAL_SECONDS, RETRY_BACKOFF,
};
pub use split::{split_prompts, SplitPrompt};
pub use state::{ArmedTimer, Phase, PendingRequest, SchedulerState, TimerId};
pub use status::{PageStatus, StatusKind};
pub use update::update;
pub use view_model::SchedulerView;

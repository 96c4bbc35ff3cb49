//! Relay engine: persistence, page access and the async scheduler runner.
mod bridge;
mod classify;
mod control;
mod decode;
mod locate;
mod page;
mod persist;
mod poller;
mod queue_store;
mod runner;
mod status_board;
mod store;
mod submit;

pub use bridge::{BridgePage, BridgeSettings, InjectionMode, PageInspection};
pub use classify::{classify_document, classify_status, classify_text};
pub use control::{ControlRequest, ControlResponse, Relay, RelayError};
pub use decode::decode_document;
pub use locate::{
    describe_controls, locate, locate_input, locate_submit, ControlSummary, Locator,
    INPUT_LOCATORS, SUBMIT_LOCATORS,
};
pub use page::{ControlHandle, ControlKind, PageAdapter, PageError, PageFailureKind};
pub use persist::{ensure_store_dir, write_atomically, PersistError};
pub use poller::spawn_status_poller;
pub use queue_store::{QueueStore, QueueStoreError};
pub use runner::{run_attempt, AttemptContext, SchedulerHandle, SchedulerSnapshot, SchedulerTiming};
pub use status_board::StatusBoard;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError, QUEUE_KEY, SETTINGS_KEY};
pub use submit::{submit_prompt, try_submit, ControlRole, SubmitError, SETTLING_DELAY};

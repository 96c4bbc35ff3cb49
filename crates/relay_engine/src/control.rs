//! Control channel: JSON requests from a control surface and the relay
//! operations behind them.

use std::sync::Arc;

use std::time::Duration;

use chrono::{DateTime, Utc};
use relay_core::{split_prompts, PageStatus, Phase, PromptRecord, QueueError, Settings};
use relay_logging::{relay_debug, relay_info, relay_warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::page::PageAdapter;
use crate::poller;
use crate::queue_store::{QueueStore, QueueStoreError};
use crate::runner::{AttemptContext, SchedulerHandle, SchedulerSnapshot, SchedulerTiming};
use crate::status_board::StatusBoard;
use crate::submit::{submit_prompt, try_submit, SubmitError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ControlRequest {
    SendPrompt {
        prompt: String,
    },
    EnableAutoSubmit,
    DisableAutoSubmit,
    GetStatus,
    /// Fire-and-forget; has no response.
    UpdateStatus {
        status: String,
        #[serde(rename = "isProcessing")]
        is_processing: bool,
    },
    AddPrompts {
        text: String,
    },
    ClearQueue,
    /// Countdown of the armed timer.
    GetSchedule,
    SaveSettings {
        settings: Settings,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlResponse {
    Status {
        status: String,
        #[serde(rename = "isProcessing")]
        is_processing: bool,
    },
    Schedule {
        phase: String,
        #[serde(rename = "remainingSeconds")]
        remaining_seconds: Option<u64>,
        #[serde(rename = "delaySeconds")]
        delay_seconds: Option<u64>,
    },
    Ack {
        success: bool,
    },
}

impl ControlResponse {
    pub fn ack(success: bool) -> Self {
        ControlResponse::Ack { success }
    }
}

impl From<SchedulerSnapshot> for ControlResponse {
    fn from(snapshot: SchedulerSnapshot) -> Self {
        let phase = match snapshot.view.phase {
            Phase::Idle => "idle",
            Phase::Armed => "armed",
            Phase::Firing => "firing",
        };
        ControlResponse::Schedule {
            phase: phase.to_string(),
            remaining_seconds: snapshot.remaining.map(whole_seconds_up),
            delay_seconds: snapshot.armed_delay.map(whole_seconds_up),
        }
    }
}

/// Countdowns show 1s until the timer actually fires.
fn whole_seconds_up(duration: Duration) -> u64 {
    let millis = duration.as_millis().div_ceil(1000);
    u64::try_from(millis).unwrap_or(u64::MAX)
}

impl From<PageStatus> for ControlResponse {
    fn from(status: PageStatus) -> Self {
        ControlResponse::Status {
            status: status.text,
            is_processing: status.is_processing,
        }
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Store(#[from] QueueStoreError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error("no prompt text given")]
    EmptyInput,
}

/// The running relay: queue store, page, advisory status and the scheduler.
///
/// Dropping it stops the scheduler task.
pub struct Relay {
    store: Arc<QueueStore>,
    page: Arc<dyn PageAdapter>,
    status: StatusBoard,
    scheduler: SchedulerHandle,
    timing: SchedulerTiming,
}

impl Relay {
    /// Initializes the store and starts the scheduler, enabling it when
    /// auto-submit is on and prompts are waiting.
    pub fn start(
        store: Arc<QueueStore>,
        page: Arc<dyn PageAdapter>,
        timing: SchedulerTiming,
    ) -> Result<Self, RelayError> {
        let settings = store.ensure_initialized()?;
        let status = StatusBoard::new();
        let scheduler = SchedulerHandle::spawn(AttemptContext::new(
            Arc::clone(&store),
            Arc::clone(&page),
            status.clone(),
            timing,
        ));

        let relay = Self {
            store,
            page,
            status,
            scheduler,
            timing,
        };
        let queued = relay.store.queue()?.len();
        if settings.auto_submit_enabled && queued > 0 {
            relay_info!("Resuming auto-submit with {} queued prompt(s)", queued);
            relay.scheduler.enable();
        }
        Ok(relay)
    }

    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    pub fn status(&self) -> PageStatus {
        self.status.get()
    }

    /// Answers one control request. `None` for notifications.
    pub async fn handle(&self, request: ControlRequest) -> Option<ControlResponse> {
        relay_debug!("Control request: {:?}", request);
        match request {
            ControlRequest::SendPrompt { prompt } => {
                Some(ControlResponse::ack(self.send_prompt(&prompt).await))
            }
            ControlRequest::EnableAutoSubmit => {
                self.scheduler.enable();
                Some(ControlResponse::ack(true))
            }
            ControlRequest::DisableAutoSubmit => {
                self.scheduler.disable();
                Some(ControlResponse::ack(true))
            }
            ControlRequest::GetStatus => Some(self.status.get().into()),
            ControlRequest::UpdateStatus {
                status,
                is_processing,
            } => {
                self.status.set(PageStatus::new(status, is_processing));
                None
            }
            ControlRequest::AddPrompts { text } => {
                let success = match self.add_prompts(&text, Utc::now()) {
                    Ok(added) => added > 0,
                    Err(err) => {
                        relay_warn!("Could not add prompts: {}", err);
                        false
                    }
                };
                Some(ControlResponse::ack(success))
            }
            ControlRequest::ClearQueue => {
                let success = match self.clear_queue() {
                    Ok(_) => true,
                    Err(err) => {
                        relay_warn!("Could not clear queue: {}", err);
                        false
                    }
                };
                Some(ControlResponse::ack(success))
            }
            ControlRequest::GetSchedule => match self.scheduler.snapshot().await {
                Some(snapshot) => Some(snapshot.into()),
                None => Some(ControlResponse::ack(false)),
            },
            ControlRequest::SaveSettings { settings } => {
                let success = match self.save_settings(&settings) {
                    Ok(_) => true,
                    Err(err) => {
                        relay_warn!("Could not save settings: {}", err);
                        false
                    }
                };
                Some(ControlResponse::ack(success))
            }
        }
    }

    /// Submits `text` as is, bypassing the queue.
    pub async fn send_prompt(&self, text: &str) -> bool {
        let sent = try_submit(self.page.as_ref(), text, self.timing.settle).await;
        if sent {
            self.status.set(PageStatus::submitted());
        }
        sent
    }

    /// Splits `raw` and appends the prompts; returns how many were added.
    pub fn add_prompts(&self, raw: &str, now: DateTime<Utc>) -> Result<usize, RelayError> {
        let prompts = split_prompts(raw);
        if prompts.is_empty() {
            return Ok(0);
        }
        let added = self.store.add_prompts(&prompts, now)?;
        if self.store.settings()?.auto_submit_enabled {
            self.scheduler.enable();
        }
        Ok(added)
    }

    /// Submits the first split prompt right away and queues the rest once
    /// that succeeds. Returns how many prompts were queued.
    pub async fn send_now(&self, raw: &str, now: DateTime<Utc>) -> Result<usize, RelayError> {
        let prompts = split_prompts(raw);
        let (first, rest) = prompts.split_first().ok_or(RelayError::EmptyInput)?;

        submit_prompt(self.page.as_ref(), &first.text, self.timing.settle).await?;
        self.status.set(PageStatus::submitted());
        if rest.is_empty() {
            return Ok(0);
        }

        let queued = self.store.add_prompts(rest, now)?;
        relay_info!("Sent first prompt and queued {} more", queued);
        if self.store.settings()?.auto_submit_enabled {
            self.scheduler.enable();
        }
        Ok(queued)
    }

    /// Submits the prompt at `index` without removing it; bumps its counters.
    /// The record is looked up again after submitting since the scheduler may
    /// have shifted the queue meanwhile.
    pub async fn send_from_queue(&self, index: usize) -> Result<PromptRecord, RelayError> {
        let record = self.store.queue()?.get(index)?.clone();
        submit_prompt(self.page.as_ref(), &record.text, self.timing.settle).await?;
        self.status.set(PageStatus::submitted());
        Ok(self.store.mark_sent(&record)?)
    }

    /// Empties the queue and stops auto-submit.
    pub fn clear_queue(&self) -> Result<usize, RelayError> {
        let dropped = self.store.clear()?;
        self.scheduler.disable();
        relay_info!("Cleared {} prompt(s) from queue", dropped);
        Ok(dropped)
    }

    /// Persists `settings` and enables or disables auto-submit to match.
    pub fn save_settings(&self, settings: &Settings) -> Result<Settings, RelayError> {
        self.store.save_settings(settings)?;
        let saved = self.store.settings()?;
        if saved.auto_submit_enabled {
            self.scheduler.enable();
        } else {
            self.scheduler.disable();
        }
        Ok(saved)
    }

    pub fn spawn_status_poller(&self, cancel: CancellationToken) -> JoinHandle<()> {
        poller::spawn_status_poller(
            Arc::clone(&self.page),
            Arc::clone(&self.store),
            self.status.clone(),
            cancel,
        )
    }

    /// Stops the scheduler and waits for its task to end.
    pub async fn shutdown(self) {
        self.scheduler.shutdown().await;
    }
}

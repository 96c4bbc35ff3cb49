//! Async driver for the pure scheduler state machine.
//!
//! One tokio task owns [`SchedulerState`], feeds it messages and applies the
//! effects it returns: timers become sleep tasks, cancellation aborts them and
//! an attempt runs as its own task that reports back when done.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use relay_core::{
    update, AttemptOutcome, Effect, Msg, PageStatus, PromptRecord, SchedulerState, SchedulerView,
    Settings, TimerDelay, TimerId, RETRY_BACKOFF,
};
use relay_logging::{relay_debug, relay_error, relay_info, relay_trace, relay_warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::page::PageAdapter;
use crate::queue_store::QueueStore;
use crate::status_board::StatusBoard;
use crate::submit::{try_submit, SETTLING_DELAY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTiming {
    /// Pause between injecting text and clicking submit.
    pub settle: Duration,
    /// Delay before retrying after a failed attempt.
    pub backoff: Duration,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            settle: SETTLING_DELAY,
            backoff: RETRY_BACKOFF,
        }
    }
}

/// Point-in-time view of the scheduler for countdown displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    pub view: SchedulerView,
    /// Full delay the armed timer was started with.
    pub armed_delay: Option<Duration>,
    /// Time left before the armed timer fires.
    pub remaining: Option<Duration>,
}

enum SchedulerCommand {
    Enable,
    Disable,
    Snapshot(oneshot::Sender<SchedulerSnapshot>),
}

/// Everything one submission attempt needs.
pub struct AttemptContext {
    pub store: Arc<QueueStore>,
    pub page: Arc<dyn PageAdapter>,
    pub status: StatusBoard,
    pub timing: SchedulerTiming,
    /// Popped record the store refused to take back; restored before the
    /// next pop.
    held: Mutex<Option<PromptRecord>>,
}

impl AttemptContext {
    pub fn new(
        store: Arc<QueueStore>,
        page: Arc<dyn PageAdapter>,
        status: StatusBoard,
        timing: SchedulerTiming,
    ) -> Self {
        Self {
            store,
            page,
            status,
            timing,
            held: Mutex::new(None),
        }
    }

    pub fn held_record(&self) -> Option<PromptRecord> {
        self.lock_held().clone()
    }

    fn return_to_head(&self, record: PromptRecord) {
        match self.store.push_head(record.clone()) {
            Ok(len) => relay_debug!("Returned \"{}\" to queue head ({} queued)", record.title, len),
            Err(err) => {
                relay_error!(
                    "Could not return \"{}\" to queue head, holding it for the next attempt: {}",
                    record.title,
                    err
                );
                *self.lock_held() = Some(record);
            }
        }
    }

    /// Puts a held record back at the head. False while the store keeps
    /// refusing it.
    fn restore_held(&self) -> bool {
        let mut held = self.lock_held();
        let Some(record) = held.take() else {
            return true;
        };
        match self.store.push_head(record.clone()) {
            Ok(_) => {
                relay_info!("Restored \"{}\" to queue head", record.title);
                true
            }
            Err(err) => {
                relay_error!("Still cannot restore \"{}\": {}", record.title, err);
                *held = Some(record);
                false
            }
        }
    }

    fn lock_held(&self) -> MutexGuard<'_, Option<PromptRecord>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct SchedulerHandle {
    cmd_tx: mpsc::UnboundedSender<SchedulerCommand>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Starts the scheduler task in `Idle`. Must be called inside a tokio
    /// runtime.
    pub fn spawn(ctx: AttemptContext) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let runner = Runner {
            state: SchedulerState::new(),
            ctx: Arc::new(ctx),
            msg_tx,
            timer: None,
            attempt: None,
        };
        let task = tokio::spawn(runner.run(cmd_rx, msg_rx, cancel.clone()));

        Self {
            cmd_tx,
            cancel,
            task: Some(task),
        }
    }

    /// Arms the timer at the configured delay, resetting any countdown.
    pub fn enable(&self) {
        self.send(SchedulerCommand::Enable);
    }

    pub fn disable(&self) {
        self.send(SchedulerCommand::Disable);
    }

    /// `None` once the scheduler task has stopped.
    pub async fn snapshot(&self) -> Option<SchedulerSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(SchedulerCommand::Snapshot(reply_tx))
            .is_err()
        {
            return None;
        }
        reply_rx.await.ok()
    }

    /// Stops the scheduler task and waits for it, including an attempt
    /// already in flight, so a popped prompt is either submitted or back
    /// in the queue.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                relay_error!("Scheduler task ended abnormally: {}", err);
            }
        }
    }

    fn send(&self, command: SchedulerCommand) {
        if self.cmd_tx.send(command).is_err() {
            relay_warn!("Scheduler is not running; request dropped");
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct ActiveTimer {
    id: TimerId,
    delay: Duration,
    deadline: Instant,
    task: JoinHandle<()>,
}

struct Runner {
    state: SchedulerState,
    ctx: Arc<AttemptContext>,
    msg_tx: mpsc::UnboundedSender<Msg>,
    timer: Option<ActiveTimer>,
    attempt: Option<JoinHandle<()>>,
}

impl Runner {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<SchedulerCommand>,
        mut msg_rx: mpsc::UnboundedReceiver<Msg>,
        cancel: CancellationToken,
    ) {
        relay_debug!("Scheduler started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                command = cmd_rx.recv() => match command {
                    Some(SchedulerCommand::Enable) => self.dispatch(Msg::EnableRequested),
                    Some(SchedulerCommand::Disable) => self.dispatch(Msg::DisableRequested),
                    Some(SchedulerCommand::Snapshot(reply)) => {
                        let _ = reply.send(self.snapshot());
                    }
                    None => break,
                },
                Some(msg) = msg_rx.recv() => self.dispatch(msg),
            }
        }
        if let Some(timer) = self.timer.take() {
            timer.task.abort();
        }
        if let Some(attempt) = self.attempt.take() {
            relay_info!("Waiting for the attempt in flight");
            if let Err(err) = attempt.await {
                relay_error!("Attempt task ended abnormally: {}", err);
            }
        }
        if !self.ctx.restore_held() {
            relay_error!("Stopping with a prompt that could not be put back");
        }
        relay_debug!("Scheduler stopped");
    }

    fn dispatch(&mut self, msg: Msg) {
        if let Msg::AttemptFinished(_) = msg {
            self.attempt = None;
        }
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.apply(effect);
        }
        if self.state.consume_dirty() {
            relay_trace!("Scheduler state: {:?}", self.state.view());
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::ArmTimer { timer, delay } => self.arm(timer, delay),
            Effect::CancelTimer { timer } => {
                if let Some(active) = self.timer.take_if(|active| active.id == timer) {
                    active.task.abort();
                    relay_debug!("Cancelled timer {}", timer);
                }
            }
            Effect::StartAttempt => {
                self.timer = None;
                let ctx = Arc::clone(&self.ctx);
                let msg_tx = self.msg_tx.clone();
                self.attempt = Some(tokio::spawn(async move {
                    let outcome = run_attempt(&ctx).await;
                    let _ = msg_tx.send(Msg::AttemptFinished(outcome));
                }));
            }
        }
    }

    fn arm(&mut self, timer: TimerId, delay: TimerDelay) {
        let duration = match delay {
            TimerDelay::Configured => self.configured_delay(),
            TimerDelay::Backoff => {
                relay_warn!(
                    "Retrying in {:?} after {} consecutive failure(s)",
                    self.ctx.timing.backoff,
                    self.state.consecutive_failures()
                );
                self.ctx.timing.backoff
            }
        };
        if let Some(previous) = self.timer.take() {
            previous.task.abort();
        }

        let msg_tx = self.msg_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = msg_tx.send(Msg::TimerFired(timer));
        });
        relay_debug!("Armed timer {} for {:?}", timer, duration);
        self.timer = Some(ActiveTimer {
            id: timer,
            delay: duration,
            deadline: Instant::now() + duration,
            task,
        });
    }

    fn configured_delay(&self) -> Duration {
        match self.ctx.store.settings() {
            Ok(settings) => settings.auto_submit_delay(),
            Err(err) => {
                relay_warn!("Could not read settings, using default delay: {}", err);
                Settings::default().auto_submit_delay()
            }
        }
    }

    fn snapshot(&self) -> SchedulerSnapshot {
        let now = Instant::now();
        SchedulerSnapshot {
            view: self.state.view(),
            armed_delay: self.timer.as_ref().map(|timer| timer.delay),
            remaining: self
                .timer
                .as_ref()
                .map(|timer| timer.deadline.saturating_duration_since(now)),
        }
    }
}

/// One automatic submission: pop the head, submit it, put it back on failure.
pub async fn run_attempt(ctx: &AttemptContext) -> AttemptOutcome {
    if !ctx.restore_held() {
        return AttemptOutcome::Failed;
    }
    let record = match ctx.store.pop_head() {
        Ok(Some(record)) => record,
        Ok(None) => {
            relay_info!("Prompt queue is empty; auto-submit going idle");
            return AttemptOutcome::QueueEmpty;
        }
        Err(err) => {
            relay_error!("Could not take prompt from queue: {}", err);
            return AttemptOutcome::Failed;
        }
    };

    if try_submit(ctx.page.as_ref(), &record.text, ctx.timing.settle).await {
        ctx.status.set(PageStatus::submitted());
        let remaining = match ctx.store.queue() {
            Ok(queue) => queue.len(),
            Err(err) => {
                relay_error!("Could not read prompt queue after submission: {}", err);
                0
            }
        };
        relay_info!("Submitted \"{}\"; {} prompt(s) left", record.title, remaining);
        AttemptOutcome::Submitted { remaining }
    } else {
        ctx.return_to_head(record);
        AttemptOutcome::Failed
    }
}

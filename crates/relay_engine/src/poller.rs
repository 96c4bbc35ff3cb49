use std::sync::Arc;

use relay_core::Settings;
use relay_logging::{relay_debug, relay_trace, relay_warn};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::page::PageAdapter;
use crate::queue_store::QueueStore;
use crate::status_board::StatusBoard;

/// Polls the page status on the configured interval until `cancel` fires.
///
/// The interval is read once, when polling starts. Polling never touches
/// the queue.
pub fn spawn_status_poller(
    page: Arc<dyn PageAdapter>,
    store: Arc<QueueStore>,
    board: StatusBoard,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let period = match store.settings() {
        Ok(settings) => settings.poll_interval(),
        Err(err) => {
            relay_warn!("Could not read settings, using default poll interval: {}", err);
            Settings::default().poll_interval()
        }
    };

    tokio::spawn(async move {
        relay_debug!("Status poller running every {:?}", period);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => poll_once(page.as_ref(), &board).await,
            }
        }
        relay_debug!("Status poller stopped");
    })
}

async fn poll_once(page: &dyn PageAdapter, board: &StatusBoard) {
    match page.poll_status().await {
        Ok(kind) => {
            let status = board.observe(kind);
            relay_trace!("Page status: {} (processing: {})", status.text, status.is_processing);
        }
        Err(err) => relay_debug!("Status poll failed: {}", err),
    }
}

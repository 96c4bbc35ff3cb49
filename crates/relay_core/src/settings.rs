use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 10;
pub const DEFAULT_AUTO_SUBMIT_DELAY_SECONDS: u64 = 65;

/// Fixed pause after a failed submission before the next attempt.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(10);

/// Relay settings persisted under the `settings` key.
///
/// Fields missing from the stored value take their defaults, so settings
/// written by older versions keep loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub poll_interval_seconds: u64,
    pub auto_submit_enabled: bool,
    pub auto_submit_delay_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            auto_submit_enabled: true,
            auto_submit_delay_seconds: DEFAULT_AUTO_SUBMIT_DELAY_SECONDS,
        }
    }
}

impl Settings {
    /// Replaces zero intervals with their defaults.
    pub fn sanitized(self) -> Self {
        Self {
            poll_interval_seconds: non_zero_or(
                self.poll_interval_seconds,
                DEFAULT_POLL_INTERVAL_SECONDS,
            ),
            auto_submit_enabled: self.auto_submit_enabled,
            auto_submit_delay_seconds: non_zero_or(
                self.auto_submit_delay_seconds,
                DEFAULT_AUTO_SUBMIT_DELAY_SECONDS,
            ),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(non_zero_or(
            self.poll_interval_seconds,
            DEFAULT_POLL_INTERVAL_SECONDS,
        ))
    }

    pub fn auto_submit_delay(&self) -> Duration {
        Duration::from_secs(non_zero_or(
            self.auto_submit_delay_seconds,
            DEFAULT_AUTO_SUBMIT_DELAY_SECONDS,
        ))
    }
}

fn non_zero_or(value: u64, fallback: u64) -> u64 {
    if value == 0 {
        fallback
    } else {
        value
    }
}

//! Watch engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default delay between two polls of a watched method.
pub const DEFAULT_WATCH_INTERVAL_MS: u64 = 3_000;

/// Default number of consecutive failed polls tolerated before a watch
/// gives up.
pub const DEFAULT_MAX_RETRY: u32 = 5;

/// Polling behaviour shared by every watch of a requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Milliseconds between polls
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Consecutive failures swallowed before the job is torn down
    #[serde(default = "default_max_retry")]
    pub max_retry: u32,
}

fn default_interval_ms() -> u64 { DEFAULT_WATCH_INTERVAL_MS }
fn default_max_retry() -> u32 { DEFAULT_MAX_RETRY }

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_WATCH_INTERVAL_MS,
            max_retry: DEFAULT_MAX_RETRY,
        }
    }
}

impl WatchConfig {
    /// Poll period, never shorter than one millisecond.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry;
        self
    }
}

//! Fixed-interval polling of a function's last update status.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_MAX_WAIT_SECS: u64 = 60;

/// Status value that ends a wait.
pub const SUCCESSFUL_STATUS: &str = "successful";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    pub interval_secs: u64,
    pub max_wait_secs: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_wait_secs: DEFAULT_MAX_WAIT_SECS,
        }
    }
}

impl PollPolicy {
    pub fn new(interval_secs: u64, max_wait_secs: u64) -> Self {
        Self {
            interval_secs,
            max_wait_secs,
        }
    }

    /// `max_wait / interval`, truncated. A trailing partial interval is never
    /// waited for. A zero interval yields no attempts.
    pub fn attempts(&self) -> u64 {
        self.max_wait_secs
            .checked_div(self.interval_secs)
            .unwrap_or(0)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Case-insensitive match against [`SUCCESSFUL_STATUS`].
pub fn is_successful_status(status: &str) -> bool {
    status.eq_ignore_ascii_case(SUCCESSFUL_STATUS)
}

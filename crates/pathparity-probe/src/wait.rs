//! Consistency wait policy
//!
//! After a successful write the runner waits for the backing store to settle
//! before reading candidates back. The policy is injected so tests can run
//! with [`ConsistencyWait::Immediate`] or under paused tokio time.

use crate::adapter::BackendAdapter;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long to wait between a write and its verification reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConsistencyWait {
    /// Read back immediately
    Immediate,
    /// Sleep for a fixed delay
    Fixed {
        /// Delay in milliseconds
        millis: u64,
    },
    /// Poll the primary candidates until all are visible or the timeout passes
    Poll {
        /// Delay between polls in milliseconds
        interval_ms: u64,
        /// Upper bound on the total wait in milliseconds
        timeout_ms: u64,
    },
}

impl Default for ConsistencyWait {
    fn default() -> Self {
        Self::Fixed { millis: 100 }
    }
}

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Nothing was awaited
    Skipped,
    /// The fixed delay elapsed
    Elapsed,
    /// Every polled path became visible
    Visible {
        /// Poll rounds performed
        polls: u32,
    },
    /// The poll timeout passed first
    TimedOut {
        /// Poll rounds performed
        polls: u32,
    },
}

impl ConsistencyWait {
    /// Fixed delay
    #[inline]
    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        Self::Fixed {
            millis: duration_millis(delay),
        }
    }

    /// Poll until visible
    #[inline]
    #[must_use]
    pub fn poll(interval: Duration, timeout: Duration) -> Self {
        Self::Poll {
            interval_ms: duration_millis(interval),
            timeout_ms: duration_millis(timeout),
        }
    }

    /// Wait according to the policy
    ///
    /// `paths` are the locations the write is expected to populate; only the
    /// poll policy reads them. Read errors count as not yet visible.
    pub async fn settle(&self, adapter: &dyn BackendAdapter, paths: &[&str]) -> WaitOutcome {
        match *self {
            Self::Immediate => WaitOutcome::Skipped,
            Self::Fixed { millis } => {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                WaitOutcome::Elapsed
            }
            Self::Poll {
                interval_ms,
                timeout_ms,
            } => {
                let deadline =
                    tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
                let interval = Duration::from_millis(interval_ms.max(1));
                let mut polls = 0;
                loop {
                    polls += 1;
                    if all_visible(adapter, paths).await {
                        return WaitOutcome::Visible { polls };
                    }
                    if tokio::time::Instant::now() + interval > deadline {
                        tracing::debug!(polls, "consistency poll timed out");
                        return WaitOutcome::TimedOut { polls };
                    }
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
}

async fn all_visible(adapter: &dyn BackendAdapter, paths: &[&str]) -> bool {
    for path in paths {
        match adapter.read(path).await {
            Ok(outcome) if outcome.found => {}
            _ => return false,
        }
    }
    true
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

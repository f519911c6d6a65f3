//! Reconnection policy: bounded exponential backoff, single-flight.
//!
//! The reconnection loop is the only consumer; these types exist separately
//! so the backoff math and single-flight guarantee are testable without a
//! socket.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::SyncConfig;

/// Reconnection progress, published to the UI.
///
/// A value type rather than a boolean so the UI can render attempt
/// progress ("reconnecting 3/8").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ReconnectionState {
    /// No reconnection in progress.
    #[default]
    Idle,
    /// Attempting to restore the Command Channel.
    #[serde(rename_all = "camelCase")]
    Reconnecting {
        /// 1-based attempt number.
        attempt: u32,
        /// Attempt budget before the session goes terminally disconnected.
        max_attempts: u32,
    },
}

/// Bounded exponential backoff policy.
#[derive(Debug, Clone)]
pub(crate) struct ReconnectPolicy {
    base_delay: Duration,
    max_delay: Duration,
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            base_delay: Duration::from_millis(config.reconnect_base_delay_ms),
            max_delay: Duration::from_millis(config.reconnect_max_delay_ms),
            max_attempts: config.max_reconnect_attempts,
        }
    }

    /// Backoff delay before the given 1-based attempt.
    ///
    /// Doubles per attempt from the base delay, capped at the maximum.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }
}

/// Counter proving the single-flight property of the reconnection loop.
///
/// The loop structure already guarantees one attempt at a time; this
/// counter makes the guarantee observable to tests and diagnostics.
#[derive(Debug, Default)]
pub(crate) struct SingleFlight {
    in_flight: AtomicUsize,
}

impl SingleFlight {
    /// Attempts to claim the flight slot.
    ///
    /// Returns `None` if a reconnection attempt is already in progress;
    /// the caller must not start a second one.
    pub fn begin(self: &Arc<Self>) -> Option<SingleFlightGuard> {
        if self
            .in_flight
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }
        Some(SingleFlightGuard {
            counter: Arc::clone(self),
        })
    }

    /// Number of reconnection attempts currently in progress (0 or 1).
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// RAII guard releasing the flight slot on drop.
pub(crate) struct SingleFlightGuard {
    counter: Arc<SingleFlight>,
}

impl Drop for SingleFlightGuard {
    fn drop(&mut self) {
        self.counter.in_flight.store(0, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(base_ms: u64, max_ms: u64) -> ReconnectPolicy {
        ReconnectPolicy {
            base_delay: Duration::from_millis(base_ms),
            max_delay: Duration::from_millis(max_ms),
            max_attempts: 8,
        }
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = policy(500, 30_000);
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2_000));
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let policy = policy(500, 4_000);
        assert_eq!(policy.delay_for(5), Duration::from_millis(4_000));
        assert_eq!(policy.delay_for(30), Duration::from_millis(4_000));
    }

    #[test]
    fn single_flight_rejects_second_claim() {
        let flight = Arc::new(SingleFlight::default());
        let guard = flight.begin().expect("first claim succeeds");
        assert_eq!(flight.in_flight(), 1);
        assert!(flight.begin().is_none());

        drop(guard);
        assert_eq!(flight.in_flight(), 0);
        assert!(flight.begin().is_some());
    }
}

//! Round-trip-time sampling and connection-quality classification.
//!
//! The Command Channel pings on a fixed cadence; each pong contributes a
//! sample to a rolling window. The windowed average feeds the UI's quality
//! indicator and the sync adapter's latency-aware reconciliation.

use std::collections::VecDeque;

use serde::Serialize;

use crate::config::SyncConfig;
use crate::constants::{MAX_MISSED_PONGS, RTT_WINDOW_SIZE};

/// Connection quality derived from rolling RTT samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionQuality {
    /// Low, stable RTT.
    Good,
    /// Elevated or jittery RTT.
    Moderate,
    /// High RTT or frequent sample loss.
    Poor,
    /// No response within the pong deadline.
    #[default]
    Disconnected,
}

/// Rolling window of round-trip samples.
///
/// Not thread-safe by itself; owned by the channel listener task, which is
/// the only writer.
#[derive(Debug)]
pub(crate) struct RttWindow {
    samples: VecDeque<u64>,
    /// Consecutive pings that missed their pong deadline.
    missed_streak: u32,
}

impl RttWindow {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(RTT_WINDOW_SIZE),
            missed_streak: 0,
        }
    }

    /// Records a successful round trip.
    pub fn record_sample(&mut self, rtt_ms: u64) {
        if self.samples.len() == RTT_WINDOW_SIZE {
            self.samples.pop_front();
        }
        self.samples.push_back(rtt_ms);
        self.missed_streak = 0;
    }

    /// Records a ping whose pong missed the deadline.
    pub fn record_missed(&mut self) {
        self.missed_streak = self.missed_streak.saturating_add(1);
    }

    /// Whether enough consecutive pongs were missed to declare the
    /// transport dead.
    pub fn is_dead(&self) -> bool {
        self.missed_streak >= MAX_MISSED_PONGS
    }

    /// Rolling average RTT, `None` until the first sample lands.
    pub fn average_rtt_ms(&self) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<u64>() / self.samples.len() as u64)
    }

    /// Classifies quality by thresholding the windowed average.
    ///
    /// Thresholds come from [`SyncConfig`]; they are policy, not contract.
    pub fn classify(&self, config: &SyncConfig) -> ConnectionQuality {
        if self.missed_streak > 0 {
            return if self.is_dead() {
                ConnectionQuality::Disconnected
            } else {
                ConnectionQuality::Poor
            };
        }

        let Some(average) = self.average_rtt_ms() else {
            return ConnectionQuality::Disconnected;
        };

        let spread = match (self.samples.iter().max(), self.samples.iter().min()) {
            (Some(max), Some(min)) => max - min,
            _ => 0,
        };

        if average < config.rtt_good_ms {
            if spread > config.rtt_jitter_ms {
                ConnectionQuality::Moderate
            } else {
                ConnectionQuality::Good
            }
        } else if average < config.rtt_moderate_ms {
            ConnectionQuality::Moderate
        } else {
            ConnectionQuality::Poor
        }
    }
}

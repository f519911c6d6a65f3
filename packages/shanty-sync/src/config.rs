//! Tunable sync policy configuration.
//!
//! Everything here is policy, not structural contract: thresholds and
//! budgets the embedding app may adjust per deployment. Structural
//! protocol values live in [`crate::constants`].

use serde::{Deserialize, Serialize};

/// Configuration for the sync core's timing and recovery behavior.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    /// Interval between pings on the Command Channel (ms).
    pub ping_interval_ms: u64,

    /// Deadline for a pong reply; a miss counts as a dropped sample (ms).
    pub pong_deadline_ms: u64,

    /// Average RTT below this is classified as good quality (ms).
    pub rtt_good_ms: u64,

    /// Average RTT below this (and above good) is moderate quality (ms).
    pub rtt_moderate_ms: u64,

    /// Spread between fastest and slowest windowed sample above which a
    /// nominally-good connection is downgraded to moderate (ms).
    pub rtt_jitter_ms: u64,

    /// Maximum consecutive reconnection attempts before the session goes
    /// terminally disconnected.
    pub max_reconnect_attempts: u32,

    /// First reconnection backoff delay (ms); doubles per attempt.
    pub reconnect_base_delay_ms: u64,

    /// Upper bound on the reconnection backoff delay (ms).
    pub reconnect_max_delay_ms: u64,

    /// Position drift a Sailor tolerates before issuing a corrective seek (ms).
    ///
    /// Corrections below this would cause audible stutter for sub-second
    /// jitter, so the Sailor lets small drift ride.
    pub drift_tolerance_ms: u64,

    /// Request timeout for Control API calls (ms).
    pub request_timeout_ms: u64,
}

impl SyncConfig {
    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value would cause runtime issues.
    pub fn validated(config: SyncConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.ping_interval_ms == 0 {
            return Err("ping_interval_ms must be greater than 0".into());
        }
        if self.pong_deadline_ms == 0 {
            return Err("pong_deadline_ms must be greater than 0".into());
        }
        if self.rtt_good_ms >= self.rtt_moderate_ms {
            return Err("rtt_good_ms must be below rtt_moderate_ms".into());
        }
        if self.max_reconnect_attempts == 0 {
            return Err("max_reconnect_attempts must be greater than 0".into());
        }
        if self.reconnect_base_delay_ms == 0 {
            return Err("reconnect_base_delay_ms must be greater than 0".into());
        }
        if self.reconnect_max_delay_ms < self.reconnect_base_delay_ms {
            return Err("reconnect_max_delay_ms must be at least the base delay".into());
        }
        if self.request_timeout_ms == 0 {
            return Err("request_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ping_interval_ms: 3_000,
            pong_deadline_ms: 5_000,
            rtt_good_ms: 150,
            rtt_moderate_ms: 400,
            rtt_jitter_ms: 250,
            max_reconnect_attempts: 8,
            reconnect_base_delay_ms: 500,
            reconnect_max_delay_ms: 30_000,
            drift_tolerance_ms: 1_000,
            request_timeout_ms: 15_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(SyncConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_ping_interval_is_rejected() {
        let config = SyncConfig {
            ping_interval_ms: 0,
            ..SyncConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_rtt_thresholds_are_rejected() {
        let config = SyncConfig {
            rtt_good_ms: 500,
            rtt_moderate_ms: 400,
            ..SyncConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

//! General utilities shared across the sync core.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::constants::TICKS_PER_MILLISECOND;

// ─────────────────────────────────────────────────────────────────────────────
// Time Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the current Unix timestamp in milliseconds.
///
/// Returns 0 if the system clock is before the Unix epoch (shouldn't happen in practice).
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tick Conversions
// ─────────────────────────────────────────────────────────────────────────────

/// Converts server position ticks (100ns units) to a `Duration`.
///
/// Negative tick values clamp to zero; the server never reports negative
/// positions but a defensive clamp is cheaper than a fallible conversion.
#[must_use]
pub fn ticks_to_duration(ticks: i64) -> Duration {
    Duration::from_millis((ticks.max(0) / TICKS_PER_MILLISECOND) as u64)
}

/// Converts a local playback position to server ticks.
#[must_use]
pub fn duration_to_ticks(position: Duration) -> i64 {
    position.as_millis() as i64 * TICKS_PER_MILLISECOND
}

/// Serde helper: serialize a `Duration` as integer milliseconds.
pub mod duration_millis {
    use std::time::Duration;

    use serde::{Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        (value.as_millis() as u64).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_round_trip_through_duration() {
        let position = Duration::from_millis(30_000);
        assert_eq!(ticks_to_duration(duration_to_ticks(position)), position);
    }

    #[test]
    fn negative_ticks_clamp_to_zero() {
        assert_eq!(ticks_to_duration(-5_000_000), Duration::ZERO);
    }
}

//! Fixed protocol constants that should NOT be changed.
//!
//! These values are structural contracts of the sync protocol. Tunable
//! policy (thresholds, intervals, budgets) lives in [`crate::config`]
//! instead.

// ─────────────────────────────────────────────────────────────────────────────
// Position Ticks
// ─────────────────────────────────────────────────────────────────────────────

/// Server position resolution: ticks per millisecond (100ns ticks).
///
/// All wire positions (seek targets, ready/buffering reports) are expressed
/// in ticks; local playback works in `Duration`. Conversions live in
/// [`crate::utils`].
pub const TICKS_PER_MILLISECOND: i64 = 10_000;

// ─────────────────────────────────────────────────────────────────────────────
// Channel Capacities
// ─────────────────────────────────────────────────────────────────────────────

/// Capacity of the inbound command broadcast channel.
///
/// Commands are small and consumed promptly by the UI and sync adapter;
/// a lagging subscriber loses oldest commands rather than blocking the
/// listener task.
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Capacity of the outbound client-message queue (ready/buffering signals
/// waiting for the socket writer).
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 32;

// ─────────────────────────────────────────────────────────────────────────────
// RTT Sampling
// ─────────────────────────────────────────────────────────────────────────────

/// Number of round-trip samples kept in the rolling window.
///
/// Eight samples at the default ping cadence covers ~24s of history, enough
/// to smooth jitter without hiding a genuine quality change.
pub const RTT_WINDOW_SIZE: usize = 8;

/// Consecutive missed pongs before the transport is declared dead and the
/// reconnection loop takes over.
pub const MAX_MISSED_PONGS: u32 = 3;

// ─────────────────────────────────────────────────────────────────────────────
// Queue Semantics
// ─────────────────────────────────────────────────────────────────────────────

/// Sentinel `current_index` for an empty queue.
pub const EMPTY_QUEUE_INDEX: i64 = -1;

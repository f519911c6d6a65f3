//! Control API: idempotent mutation requests to the server's HTTP
//! interface.
//!
//! Every mutation is fire-and-confirm: the call succeeds or raises a typed
//! failure, and the authoritative result later arrives asynchronously over
//! the Command Channel. The Control API never mutates local session state.

mod client;
mod types;

pub use client::ControlApi;
pub use types::{GroupSummary, PlaybackReport, QueueMode};

//! Command Channel: the persistent duplex connection to the server.
//!
//! One logical connection exists per group membership. The channel decodes
//! inbound messages once at the boundary, drives session mutations in
//! delivery order, samples round-trip time for quality classification, and
//! recovers from transport failures with bounded, single-flight
//! reconnection.

mod connection;
pub(crate) mod messages;
mod quality;
mod reconnect;

pub use connection::CommandChannel;
pub use quality::ConnectionQuality;
pub use reconnect::ReconnectionState;

pub(crate) use quality::RttWindow;
pub(crate) use reconnect::{ReconnectPolicy, SingleFlight};

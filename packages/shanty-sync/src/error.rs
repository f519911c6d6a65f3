//! Centralized error types for the Shanty sync core.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Separates request failures (typed non-2xx) from transport failures
//! - Exposes machine-readable error codes for the UI layer

use serde::Serialize;
use thiserror::Error;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code for UI consumption.
    fn code(&self) -> &'static str;
}

/// Application-wide error type for the sync core.
///
/// The taxonomy follows the recovery policy: request failures surface to the
/// caller, transport failures are absorbed by the reconnection state machine
/// until the retry budget is exhausted, and local playback failures never
/// tear down the session.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum SyncError {
    /// A Control API mutation returned a non-2xx status.
    ///
    /// Carries the operation name so the UI can decide whether to retry
    /// or surface the failure.
    #[error("{operation} failed with status {status}")]
    Request {
        /// Name of the Control API operation that failed.
        operation: &'static str,
        /// HTTP status returned by the server.
        status: u16,
    },

    /// Command Channel transport failure (connect, read, write).
    ///
    /// Handled internally by the reconnection loop; only observed by
    /// callers through [`SyncError::ReconnectFailed`].
    #[error("transport error: {0}")]
    Transport(String),

    /// The reconnection budget was exhausted; the session is terminally
    /// disconnected and the UI should offer a manual rejoin.
    #[error("reconnect budget exhausted after {attempts} attempt(s)")]
    ReconnectFailed {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// The server reported that the group no longer exists.
    #[error("session ended by server")]
    SessionEnded,

    /// Local audio playback failed (track load, seek, etc.).
    ///
    /// Reported upward but never fatal: the group continues and the next
    /// authoritative command resynchronizes this device.
    #[error("playback error: {0}")]
    Playback(String),

    /// Malformed wire payload or handshake failure on the Command Channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// The credentials collaborator could not supply a device profile.
    #[error("credentials error: {0}")]
    Credentials(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ErrorCode for SyncError {
    fn code(&self) -> &'static str {
        match self {
            Self::Request { .. } => "request_failed",
            Self::Transport(_) => "transport_error",
            Self::ReconnectFailed { .. } => "reconnect_failed",
            Self::SessionEnded => "session_ended",
            Self::Playback(_) => "playback_error",
            Self::Channel(_) => "channel_error",
            Self::Credentials(_) => "credentials_error",
            Self::Configuration(_) => "configuration_error",
        }
    }
}

impl SyncError {
    /// Whether the reconnection loop should absorb this error rather than
    /// surfacing it to the caller.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Channel(err.to_string())
    }
}

/// Convenient Result alias for sync-core operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_carries_operation_and_status() {
        let err = SyncError::Request {
            operation: "queue_add",
            status: 403,
        };
        assert_eq!(err.code(), "request_failed");
        assert_eq!(err.to_string(), "queue_add failed with status 403");
    }

    #[test]
    fn transport_errors_are_absorbable() {
        assert!(SyncError::Transport("socket closed".into()).is_transport());
        assert!(!SyncError::SessionEnded.is_transport());
    }
}

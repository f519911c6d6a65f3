//! Shanty Sync - collaborative playback synchronization core.
//!
//! This crate lets multiple Shanty client devices, connected to one
//! authoritative media server, share a single playback queue and stay
//! audibly in sync: one device (the Captain) actually drives audio output,
//! the rest (Sailors) mirror its position within a small tolerance.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`api`]: Control API - idempotent mutation requests to the server
//! - [`channel`]: Command Channel - persistent duplex connection, RTT
//!   sampling and bounded reconnection
//! - [`session`]: Session state machine - the single-writer projection of
//!   the active group
//! - [`playback`]: Sync adapter and local playback collaborator traits
//! - [`credentials`]: Identity collaborator supplying server URL and tokens
//! - [`bootstrap`]: Composition root wiring the services together
//! - [`error`]: Centralized error types
//!
//! # Data Flow
//!
//! Control API calls mutate server state; the server broadcasts the new
//! truth over the Command Channel to all participants; the session manager
//! replaces the affected state slice wholesale; the sync adapter applies
//! local audio effects (Sailors only - the Captain's player already
//! reflects its own intent); UI observers receive per-category change
//! notifications.
//!
//! # Abstraction Traits
//!
//! Collaborators owned by the embedding app are injected behind traits:
//!
//! - [`CredentialsProvider`](credentials::CredentialsProvider): identity
//! - [`LocalPlayback`](playback::LocalPlayback): audio output
//! - [`TrackResolver`](playback::TrackResolver): catalog lookup
//! - [`TrackCacheWarmer`](playback::TrackCacheWarmer): speculative prefetch

#![warn(clippy::all)]

pub mod api;
pub mod bootstrap;
pub mod channel;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod playback;
pub mod session;
pub mod utils;

// Re-export commonly used types at the crate root
pub use api::{ControlApi, GroupSummary, PlaybackReport, QueueMode};
pub use bootstrap::{bootstrap_sync, SyncCollaborators, SyncServices};
pub use channel::{CommandChannel, ConnectionQuality, ReconnectionState};
pub use config::SyncConfig;
pub use credentials::{CredentialsProvider, DeviceProfile, StaticCredentials};
pub use error::{ErrorCode, SyncError, SyncResult};
pub use playback::{
    CatalogTrack, LocalPlayback, NoopCacheWarmer, SyncAdapter, TrackCacheWarmer, TrackResolver,
};
pub use session::{
    Command, CommandKind, Group, Participant, PlayerRole, QualitySnapshot, QueueEntry, RepeatMode,
    Session, SessionManager, ShuffleMode,
};
pub use utils::now_millis;

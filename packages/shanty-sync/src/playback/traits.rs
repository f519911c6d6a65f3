//! Trait abstractions for the playback-side collaborators.
//!
//! These traits enable dependency injection for testability: the sync core
//! never links against the actual audio engine or catalog transport.
//! Everything here is constructor-injected — no process-wide singletons.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SyncResult;

/// Catalog metadata for one track, as resolved from a queue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTrack {
    /// Catalog identifier.
    pub track_id: String,
    /// Track title for display.
    pub title: String,
    /// Artist name, when the catalog knows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Track duration in milliseconds, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Resolves queue entries to catalog track metadata.
///
/// Backed by the media server's catalog interface; the sync core only
/// needs enough metadata to hand the local player something playable.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Resolves a catalog track id to its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SyncError::Playback`] when the track cannot be
    /// resolved; the caller treats this as a recoverable local failure.
    async fn resolve(&self, track_id: &str) -> SyncResult<CatalogTrack>;
}

/// Local audio output collaborator.
///
/// Implemented by the player engine of the embedding app. Only the Captain
/// path and the Sailor mirror path drive this; the sync core itself never
/// decodes audio.
#[async_trait]
pub trait LocalPlayback: Send + Sync {
    /// Loads and starts the given track from the beginning.
    async fn play(&self, track: &CatalogTrack) -> SyncResult<()>;

    /// Pauses playback, keeping the current position.
    async fn pause(&self) -> SyncResult<()>;

    /// Resumes playback of the loaded track.
    async fn resume(&self) -> SyncResult<()>;

    /// Seeks the loaded track to the given position.
    async fn seek(&self, position: Duration) -> SyncResult<()>;

    /// Stops playback and unloads the current track.
    async fn stop(&self) -> SyncResult<()>;

    /// Advances to the next locally queued track.
    async fn next(&self) -> SyncResult<()>;

    /// Returns to the previous locally queued track.
    async fn previous(&self) -> SyncResult<()>;

    /// The track currently loaded, if any.
    fn current_track(&self) -> Option<CatalogTrack>;

    /// Current playback position of the loaded track.
    fn position(&self) -> Duration;
}

/// Speculative prefetch of auxiliary track data (waveforms, artwork).
///
/// Purely a UX optimization issued alongside queue mutations; the warmed
/// cache is never treated as authoritative queue state. Injected rather
/// than reached through a global so the core stays testable in isolation.
#[async_trait]
pub trait TrackCacheWarmer: Send + Sync {
    /// Warms auxiliary data for the given tracks. Best-effort; failures
    /// are swallowed by implementations.
    async fn warm(&self, track_ids: &[String]);
}

/// No-op warmer for embedders without an auxiliary cache.
pub struct NoopCacheWarmer;

#[async_trait]
impl TrackCacheWarmer for NoopCacheWarmer {
    async fn warm(&self, _track_ids: &[String]) {
        // No-op: nothing to prefetch
    }
}

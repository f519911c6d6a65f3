//! Control API client.
//!
//! Translates high-level intents into authenticated HTTP mutations. Calls
//! are independent and may run concurrently with each other and with the
//! Command Channel listener; none of them blocks another, and none of them
//! writes session state — only the channel's broadcasts do that,
//! preserving single-writer semantics.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::config::SyncConfig;
use crate::credentials::CredentialsProvider;
use crate::error::{SyncError, SyncResult};
use crate::playback::TrackCacheWarmer;
use crate::session::{RepeatMode, ShuffleMode};

use super::types::{
    BufferingRequest, GroupSummary, ItemStepRequest, JoinGroupRequest, NewGroupRequest,
    PingRequest, PlaybackReport, QueueAddRequest, QueueMode, QueueMoveRequest, QueueRemoveRequest,
    QueueSetRequest, ReadyRequest, SeekRequest, SetRepeatRequest, SetShuffleRequest,
};

/// Client for the server's sync mutation endpoints.
pub struct ControlApi {
    http: Client,
    credentials: Arc<dyn CredentialsProvider>,
    /// Optional speculative prefetch for queue mutations (UX only).
    warmer: Option<Arc<dyn TrackCacheWarmer>>,
}

impl ControlApi {
    /// Creates a client with a shared connection pool and bounded timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] if the HTTP client cannot be
    /// built.
    pub fn new(
        config: &SyncConfig,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> SyncResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| SyncError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            http,
            credentials,
            warmer: None,
        })
    }

    /// Attaches a cache warmer invoked speculatively on queue mutations.
    #[must_use]
    pub fn with_cache_warmer(mut self, warmer: Arc<dyn TrackCacheWarmer>) -> Self {
        self.warmer = Some(warmer);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Group Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Creates a new group; the server assigns this device Captain.
    pub async fn create_group(&self, group_name: &str) -> SyncResult<()> {
        self.post(
            "create_group",
            "groups",
            &NewGroupRequest {
                group_name: group_name.to_string(),
            },
        )
        .await
    }

    /// Lists groups joinable by this user.
    pub async fn list_groups(&self) -> SyncResult<Vec<GroupSummary>> {
        let profile = self.credentials.device_profile().await?;
        let response = self
            .http
            .get(profile.api_url("groups"))
            .bearer_auth(&profile.access_token)
            .header("X-Shanty-Device-Id", &profile.device_id)
            .header("X-Shanty-User-Id", &profile.user_id)
            .send()
            .await?;

        let status = response.status();
        check_status("list_groups", status)?;
        Ok(response.json().await?)
    }

    /// Joins an existing group as Sailor.
    pub async fn join_group(&self, group_id: &str) -> SyncResult<()> {
        self.post(
            "join_group",
            "groups/join",
            &JoinGroupRequest {
                group_id: group_id.to_string(),
            },
        )
        .await
    }

    /// Leaves the active group.
    pub async fn leave_group(&self) -> SyncResult<()> {
        self.post_empty("leave_group", "groups/leave").await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queue Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Appends tracks to the shared queue in the given mode.
    pub async fn queue_add(&self, track_ids: Vec<String>, mode: QueueMode) -> SyncResult<()> {
        self.warm_tracks(&track_ids);
        self.post("queue_add", "queue/add", &QueueAddRequest { track_ids, mode })
            .await
    }

    /// Removes queue entries by playlist item id.
    pub async fn queue_remove(
        &self,
        playlist_item_ids: Vec<String>,
        clear_playing: bool,
        clear_queue: bool,
    ) -> SyncResult<()> {
        self.post(
            "queue_remove",
            "queue/remove",
            &QueueRemoveRequest {
                playlist_item_ids,
                clear_playing,
                clear_queue,
            },
        )
        .await
    }

    /// Moves one queue entry to a new index.
    pub async fn queue_move(&self, playlist_item_id: &str, new_index: usize) -> SyncResult<()> {
        self.post(
            "queue_move",
            "queue/move",
            &QueueMoveRequest {
                playlist_item_id: playlist_item_id.to_string(),
                new_index,
            },
        )
        .await
    }

    /// Replaces the entire queue, starting playback at `start_index`.
    pub async fn queue_set(&self, track_ids: Vec<String>, start_index: usize) -> SyncResult<()> {
        self.warm_tracks(&track_ids);
        self.post(
            "queue_set",
            "queue/set",
            &QueueSetRequest {
                track_ids,
                start_index,
            },
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transport Control
    // ─────────────────────────────────────────────────────────────────────────

    /// Requests a group-wide pause.
    pub async fn pause(&self) -> SyncResult<()> {
        self.post_empty("pause", "playback/pause").await
    }

    /// Requests a group-wide resume.
    pub async fn unpause(&self) -> SyncResult<()> {
        self.post_empty("unpause", "playback/unpause").await
    }

    /// Requests a group-wide stop.
    pub async fn stop(&self) -> SyncResult<()> {
        self.post_empty("stop", "playback/stop").await
    }

    /// Requests a group-wide seek.
    pub async fn seek(&self, position_ticks: i64) -> SyncResult<()> {
        self.post("seek", "playback/seek", &SeekRequest { position_ticks })
            .await
    }

    /// Advances to the next queue entry.
    ///
    /// `pinned` disambiguates races: when given, the server only advances
    /// if that entry is still the current one.
    pub async fn next_item(&self, pinned: Option<String>) -> SyncResult<()> {
        self.post(
            "next_item",
            "playback/next",
            &ItemStepRequest {
                playlist_item_id: pinned,
            },
        )
        .await
    }

    /// Returns to the previous queue entry; `pinned` as for [`Self::next_item`].
    pub async fn previous_item(&self, pinned: Option<String>) -> SyncResult<()> {
        self.post(
            "previous_item",
            "playback/previous",
            &ItemStepRequest {
                playlist_item_id: pinned,
            },
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State Signaling
    // ─────────────────────────────────────────────────────────────────────────

    /// Reports ready/not-ready with the current playback observation.
    ///
    /// Fallback path; the Command Channel carries the same signal while
    /// connected.
    pub async fn ready(&self, ready: bool, report: PlaybackReport) -> SyncResult<()> {
        self.post("ready", "ready", &ReadyRequest { ready, report })
            .await
    }

    /// Reports that this device is buffering.
    pub async fn buffering(&self, report: PlaybackReport) -> SyncResult<()> {
        self.post("buffering", "buffering", &BufferingRequest { report })
            .await
    }

    /// Ping with a sequence number (HTTP fallback for RTT sampling).
    pub async fn ping(&self, sequence: u64) -> SyncResult<()> {
        self.post("ping", "ping", &PingRequest { sequence }).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Preferences
    // ─────────────────────────────────────────────────────────────────────────

    /// Sets the group shuffle mode.
    pub async fn set_shuffle(&self, mode: ShuffleMode) -> SyncResult<()> {
        self.post("set_shuffle", "shuffle", &SetShuffleRequest { mode })
            .await
    }

    /// Sets the group repeat mode.
    pub async fn set_repeat(&self, mode: RepeatMode) -> SyncResult<()> {
        self.post("set_repeat", "repeat", &SetRepeatRequest { mode })
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Sends an authenticated POST with a JSON body.
    async fn post<B: Serialize>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> SyncResult<()> {
        let profile = self.credentials.device_profile().await?;
        let response = self
            .http
            .post(profile.api_url(path))
            .bearer_auth(&profile.access_token)
            .header("X-Shanty-Device-Id", &profile.device_id)
            .header("X-Shanty-User-Id", &profile.user_id)
            .json(body)
            .send()
            .await?;
        check_status(operation, response.status())
    }

    /// Sends an authenticated POST without a body.
    async fn post_empty(&self, operation: &'static str, path: &str) -> SyncResult<()> {
        self.post(operation, path, &serde_json::json!({})).await
    }

    /// Fires a speculative cache warm for the given tracks.
    ///
    /// Detached so queue mutations never block on prefetch; the warmed
    /// data is never authoritative.
    fn warm_tracks(&self, track_ids: &[String]) {
        if let Some(warmer) = &self.warmer {
            let warmer = Arc::clone(warmer);
            let track_ids = track_ids.to_vec();
            tokio::spawn(async move {
                warmer.warm(&track_ids).await;
            });
        }
    }
}

/// Maps an HTTP status to success or a typed request failure.
///
/// 200 and 204 are the only success statuses; anything else surfaces as
/// [`SyncError::Request`] for the caller (usually the UI) to handle.
fn check_status(operation: &'static str, status: StatusCode) -> SyncResult<()> {
    match status {
        StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
        other => {
            log::warn!("[ControlApi] {} failed with status {}", operation, other);
            Err(SyncError::Request {
                operation,
                status: other.as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_and_no_content_are_success() {
        assert!(check_status("pause", StatusCode::OK).is_ok());
        assert!(check_status("pause", StatusCode::NO_CONTENT).is_ok());
    }

    #[test]
    fn non_2xx_maps_to_typed_request_failure() {
        let err = check_status("seek", StatusCode::CONFLICT).unwrap_err();
        match err {
            SyncError::Request { operation, status } => {
                assert_eq!(operation, "seek");
                assert_eq!(status, 409);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn created_is_not_treated_as_success() {
        // The server contract is 200/204; anything else is a failure even
        // if it's a 2xx the server never sends.
        assert!(check_status("create_group", StatusCode::CREATED).is_err());
    }
}

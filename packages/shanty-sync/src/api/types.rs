//! Control API request/response payload types.
//!
//! Thin serde DTOs; the server's HTTP interface speaks camelCase JSON.

use serde::{Deserialize, Serialize};

use crate::session::{RepeatMode, ShuffleMode};

// ─────────────────────────────────────────────────────────────────────────────
// Queue Mutation
// ─────────────────────────────────────────────────────────────────────────────

/// Placement mode for queue-append operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueueMode {
    /// Append after the last entry.
    Append,
    /// Insert immediately after the current entry.
    PlayNext,
    /// Replace the current entry and start playing the first added track.
    ReplaceCurrent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueueAddRequest {
    pub track_ids: Vec<String>,
    pub mode: QueueMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueueRemoveRequest {
    pub playlist_item_ids: Vec<String>,
    /// Also stop and clear the currently playing entry.
    pub clear_playing: bool,
    /// Also clear the rest of the queue.
    pub clear_queue: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueueMoveRequest {
    pub playlist_item_id: String,
    pub new_index: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueueSetRequest {
    pub track_ids: Vec<String>,
    pub start_index: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Group Lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewGroupRequest {
    pub group_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JoinGroupRequest {
    pub group_id: String,
}

/// Summary of a joinable group, as returned by the list-groups call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    /// Server-assigned group identifier.
    pub group_id: String,
    /// Human-readable group name.
    pub group_name: String,
    /// Display names of current participants, for the join picker.
    #[serde(default)]
    pub participant_names: Vec<String>,
    /// Catalog id of the track currently playing, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_track_id: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport Control & State Signaling
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SeekRequest {
    pub position_ticks: i64,
}

/// Next/previous item, optionally pinned to a specific queue slot to
/// disambiguate races between the caller's view and the server's.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ItemStepRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_item_id: Option<String>,
}

/// Snapshot of this device's playback state, reported with ready and
/// buffering signals over either transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackReport {
    /// Current local position in server ticks.
    pub position_ticks: i64,
    /// Whether local playback is running.
    pub is_playing: bool,
    /// Client timestamp of the observation (Unix ms).
    pub when: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReadyRequest {
    pub ready: bool,
    #[serde(flatten)]
    pub report: PlaybackReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BufferingRequest {
    #[serde(flatten)]
    pub report: PlaybackReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PingRequest {
    pub sequence: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Preferences
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetShuffleRequest {
    pub mode: ShuffleMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetRepeatRequest {
    pub mode: RepeatMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_mode_serializes_camel_case() {
        let json = serde_json::to_string(&QueueMode::PlayNext).unwrap();
        assert_eq!(json, "\"playNext\"");
    }

    #[test]
    fn ready_request_flattens_report() {
        let request = ReadyRequest {
            ready: true,
            report: PlaybackReport {
                position_ticks: 300_000_000,
                is_playing: true,
                when: 1_700_000_000_000,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["ready"], true);
        assert_eq!(value["positionTicks"], 300_000_000i64);
        assert_eq!(value["isPlaying"], true);
    }

    #[test]
    fn group_summary_tolerates_missing_optional_fields() {
        let summary: GroupSummary =
            serde_json::from_str(r#"{"groupId":"g1","groupName":"Movie Night"}"#).unwrap();
        assert!(summary.participant_names.is_empty());
        assert!(summary.current_track_id.is_none());
    }
}

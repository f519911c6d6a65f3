//! Session data model: the client's local projection of one group.
//!
//! All types here are plain value types. Mutation is owned exclusively by
//! [`SessionManager`](manager::SessionManager); everything handed to
//! subscribers is an immutable snapshot.

mod manager;

pub use manager::{QualitySnapshot, SessionManager};

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::EMPTY_QUEUE_INDEX;
use crate::utils::duration_millis;

// ─────────────────────────────────────────────────────────────────────────────
// Roles & Participants
// ─────────────────────────────────────────────────────────────────────────────

/// This device's role within the active group.
///
/// The Captain actually drives audio output; Sailors mirror its position.
/// Role is server-assigned (group creator, or promoted on disconnect) —
/// the client never elects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerRole {
    /// Drives local audio and issues the group's playback intent.
    Captain,
    /// Mirrors the Captain's state via the Command Channel.
    #[default]
    Sailor,
}

/// One device/user participating in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Identifier of the participating user.
    pub user_id: String,
    /// Name shown in the group roster.
    pub display_name: String,
    /// Optional avatar image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    /// Whether this participant currently holds Captain.
    pub is_captain: bool,
}

/// A server-side shared session joining multiple devices to one queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Server-assigned group identifier.
    pub group_id: String,
    /// Human-readable group name.
    pub group_name: String,
    /// Current roster, in server order.
    pub participants: Vec<Participant>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Queue
// ─────────────────────────────────────────────────────────────────────────────

/// One slot in the shared queue.
///
/// `playlist_item_id` is the server-assigned identity for this slot; it is
/// distinct from `track_id` because the same catalog track may appear in
/// the queue more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// Stable per-slot identity used for reordering and removal.
    pub playlist_item_id: String,
    /// Catalog identifier of the underlying track.
    pub track_id: String,
    /// User that added this entry.
    pub added_by_user_id: String,
}

/// Shuffle preference for the shared queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShuffleMode {
    /// Play in queue order.
    #[default]
    Off,
    /// Play in server-shuffled order.
    Shuffled,
}

/// Repeat preference for the shared queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepeatMode {
    /// Stop at the end of the queue.
    #[default]
    Off,
    /// Restart the queue after the last entry.
    All,
    /// Repeat the current entry.
    One,
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Discriminant of a server-broadcast playback instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandKind {
    Play,
    Pause,
    Stop,
    Seek,
}

/// A discrete playback instruction broadcast by the server.
///
/// Commands are ordered by server receipt, not client send time; the
/// listener applies them in delivery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// Instruction type.
    pub kind: CommandKind,
    /// Target position in server ticks, when the instruction carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_ticks: Option<i64>,
    /// Queue slot the instruction targets (preferred addressing).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_item_id: Option<String>,
    /// Positional fallback when no slot id is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_index: Option<usize>,
    /// Server receipt timestamp (Unix ms), for diagnostics.
    pub when: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// The client's local projection of one group plus playback state.
///
/// Mutated only by applying server-sourced events; `position` is
/// authoritative only while `is_paused == false` — while paused it is
/// frozen at the last known value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Identifier of the joined group.
    pub group_id: String,
    /// Name of the joined group.
    pub group_name: String,
    /// This device's role.
    pub role: PlayerRole,
    /// Current roster, replaced wholesale from server payloads.
    pub participants: Vec<Participant>,
    /// Shared queue, replaced wholesale from server payloads.
    pub queue: Vec<QueueEntry>,
    /// Index of the current track, or [`EMPTY_QUEUE_INDEX`] when empty.
    pub current_index: i64,
    /// Whether group playback is paused.
    pub is_paused: bool,
    /// Last known playback position.
    #[serde(rename = "positionMs", serialize_with = "duration_millis::serialize")]
    pub position: Duration,
    /// Whether any participant reported buffering.
    pub is_buffering: bool,
    /// Shuffle preference.
    pub shuffle: ShuffleMode,
    /// Repeat preference.
    pub repeat: RepeatMode,
}

impl Session {
    /// Returns the queue entry at `current_index`, if any.
    pub fn current_entry(&self) -> Option<&QueueEntry> {
        if self.current_index < 0 {
            return None;
        }
        self.queue.get(self.current_index as usize)
    }

    /// Finds a queue entry by its playlist item id.
    pub fn entry_by_playlist_item(&self, playlist_item_id: &str) -> Option<(usize, &QueueEntry)> {
        self.queue
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.playlist_item_id == playlist_item_id)
    }

    /// The participant currently holding Captain, if the roster names one.
    pub fn captain(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_captain)
    }

    /// The group view of this session (identity plus roster).
    pub fn group(&self) -> Group {
        Group {
            group_id: self.group_id.clone(),
            group_name: self.group_name.clone(),
            participants: self.participants.clone(),
        }
    }

    /// Clamps an index from a server payload to a valid value.
    ///
    /// An index outside the queue is a semantic inconsistency; it resolves
    /// to [`EMPTY_QUEUE_INDEX`] rather than a panic downstream.
    pub(crate) fn clamp_index(queue_len: usize, index: i64) -> i64 {
        if index >= 0 && (index as usize) < queue_len {
            index
        } else {
            EMPTY_QUEUE_INDEX
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(playlist_item_id: &str, track_id: &str) -> QueueEntry {
        QueueEntry {
            playlist_item_id: playlist_item_id.into(),
            track_id: track_id.into(),
            added_by_user_id: "user-1".into(),
        }
    }

    fn session_with_queue(queue: Vec<QueueEntry>, current_index: i64) -> Session {
        Session {
            group_id: "group-1".into(),
            group_name: "Movie Night".into(),
            role: PlayerRole::Sailor,
            participants: vec![],
            queue,
            current_index,
            is_paused: true,
            position: Duration::ZERO,
            is_buffering: false,
            shuffle: ShuffleMode::Off,
            repeat: RepeatMode::Off,
        }
    }

    #[test]
    fn current_entry_is_none_for_empty_queue() {
        let session = session_with_queue(vec![], EMPTY_QUEUE_INDEX);
        assert!(session.current_entry().is_none());
    }

    #[test]
    fn entry_lookup_distinguishes_duplicate_tracks() {
        let session = session_with_queue(
            vec![entry("pli-1", "track-9"), entry("pli-2", "track-9")],
            0,
        );
        let (index, found) = session.entry_by_playlist_item("pli-2").unwrap();
        assert_eq!(index, 1);
        assert_eq!(found.track_id, "track-9");
    }

    #[test]
    fn out_of_range_index_clamps_to_empty_sentinel() {
        assert_eq!(Session::clamp_index(2, 5), EMPTY_QUEUE_INDEX);
        assert_eq!(Session::clamp_index(2, -3), EMPTY_QUEUE_INDEX);
        assert_eq!(Session::clamp_index(2, 1), 1);
    }
}

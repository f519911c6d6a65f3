//! Command Channel wire messages.
//!
//! Inbound and outbound payloads are closed tagged enums decoded exactly
//! once at the channel boundary; business logic never sees raw JSON maps.
//! Unknown inbound types deserialize to [`ServerMessage::Unknown`] and are
//! skipped with a diagnostic rather than crashing the listener.

use serde::{Deserialize, Serialize};

use crate::api::PlaybackReport;
use crate::session::{
    Command, CommandKind, Participant, QueueEntry, RepeatMode, ShuffleMode,
};

// ─────────────────────────────────────────────────────────────────────────────
// Inbound (server → client)
// ─────────────────────────────────────────────────────────────────────────────

/// Message envelope received on the Command Channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum ServerMessage {
    /// A discrete playback instruction.
    Command { payload: CommandPayload },
    /// Full group state delivered after a successful join or resubscribe.
    GroupJoined { payload: GroupStatePayload },
    /// Roster change: participant joined/left or a role reassignment.
    GroupUpdate { payload: ParticipantsPayload },
    /// A participant joined; carries the full replacement roster.
    UserJoined { payload: ParticipantsPayload },
    /// A participant left; carries the full replacement roster.
    UserLeft { payload: ParticipantsPayload },
    /// The shared queue changed; carries the full replacement queue.
    QueueUpdate { payload: QueuePayload },
    /// This device's membership ended (own leave confirmed).
    GroupLeft { payload: GroupRefPayload },
    /// The group no longer exists on the server.
    SessionEnded { payload: GroupRefPayload },
    /// Reply to a ping.
    Pong { payload: PongPayload },
    /// Forward-compatibility catch-all for unrecognized message types.
    #[serde(other)]
    Unknown,
}

/// Wire shape of a playback command.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommandPayload {
    pub group_id: String,
    pub command: CommandKind,
    #[serde(default)]
    pub position_ticks: Option<i64>,
    #[serde(default)]
    pub playlist_item_id: Option<String>,
    #[serde(default)]
    pub track_index: Option<usize>,
    pub when: u64,
}

impl CommandPayload {
    /// Converts the wire payload into the domain command handed to
    /// subscribers and the sync adapter.
    pub fn into_command(self) -> Command {
        Command {
            kind: self.command,
            position_ticks: self.position_ticks,
            playlist_item_id: self.playlist_item_id,
            track_index: self.track_index,
            when: self.when,
        }
    }
}

/// Full group state: roster, queue and playback position.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroupStatePayload {
    pub group_id: String,
    pub group_name: String,
    pub participants: Vec<Participant>,
    pub queue: Vec<QueueEntry>,
    pub current_index: i64,
    pub is_paused: bool,
    pub position_ticks: i64,
    #[serde(default)]
    pub shuffle: ShuffleMode,
    #[serde(default)]
    pub repeat: RepeatMode,
}

/// Replacement roster for the active group.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ParticipantsPayload {
    pub group_id: String,
    pub participants: Vec<Participant>,
}

/// Replacement queue for the active group.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueuePayload {
    pub group_id: String,
    pub queue: Vec<QueueEntry>,
    pub current_index: i64,
    #[serde(default)]
    pub shuffle: ShuffleMode,
    #[serde(default)]
    pub repeat: RepeatMode,
}

/// Reference to a group with an optional human-readable reason.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroupRefPayload {
    pub group_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PongPayload {
    pub sequence: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Outbound (client → server)
// ─────────────────────────────────────────────────────────────────────────────

/// Message envelope sent on the Command Channel.
///
/// Ready/buffering are also exposed via the Control API as a resilience
/// fallback; the socket path is preferred while connected.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum ClientMessage {
    Ping { payload: PingPayload },
    Ready { payload: ReadyPayload },
    Buffering { payload: BufferingPayload },
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PingPayload {
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReadyPayload {
    pub ready: bool,
    #[serde(flatten)]
    pub report: PlaybackReport,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BufferingPayload {
    #[serde(flatten)]
    pub report: PlaybackReport,
}

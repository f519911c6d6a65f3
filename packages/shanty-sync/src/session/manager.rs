//! Single-writer owner of the session projection.
//!
//! All mutation entry points are `pub(crate)` and called only from the
//! Command Channel listener task, so session fields need no fine-grained
//! locking: writers never race, and readers only ever observe immutable
//! snapshots published through per-category watch channels.
//!
//! Server broadcasts always replace the relevant slice of state wholesale;
//! the manager never diff-and-patches partial updates.

use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::{BroadcastStream, WatchStream};

use crate::channel::{ConnectionQuality, ReconnectionState};
use crate::constants::COMMAND_CHANNEL_CAPACITY;
use crate::session::{
    Command, CommandKind, Participant, PlayerRole, QueueEntry, RepeatMode, Session, ShuffleMode,
};
use crate::utils::ticks_to_duration;

/// Connection quality snapshot published to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitySnapshot {
    /// Thresholded classification of the rolling RTT average.
    pub quality: ConnectionQuality,
    /// Rolling average RTT in milliseconds, `None` before the first pong.
    pub average_rtt_ms: Option<u64>,
}

/// Owns the canonical in-memory view of the active group.
///
/// Constructed once per signed-in user; group membership comes and goes
/// within one manager's lifetime. Readers subscribe per category so they
/// re-render only on the changes they care about.
pub struct SessionManager {
    local_user_id: String,
    session: RwLock<Option<Session>>,
    session_tx: watch::Sender<Option<Session>>,
    participants_tx: watch::Sender<Vec<Participant>>,
    quality_tx: watch::Sender<QualitySnapshot>,
    reconnection_tx: watch::Sender<ReconnectionState>,
    command_tx: broadcast::Sender<Command>,
}

impl SessionManager {
    /// Creates a manager for the given signed-in user.
    pub fn new(local_user_id: impl Into<String>) -> Self {
        let (session_tx, _) = watch::channel(None);
        let (participants_tx, _) = watch::channel(Vec::new());
        let (quality_tx, _) = watch::channel(QualitySnapshot::default());
        let (reconnection_tx, _) = watch::channel(ReconnectionState::Idle);
        let (command_tx, _) = broadcast::channel(COMMAND_CHANNEL_CAPACITY);
        Self {
            local_user_id: local_user_id.into(),
            session: RwLock::new(None),
            session_tx,
            participants_tx,
            quality_tx,
            reconnection_tx,
            command_tx,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Subscriptions (read side)
    // ─────────────────────────────────────────────────────────────────────────

    /// Current session snapshot, `None` when no group is joined.
    pub fn snapshot(&self) -> Option<Session> {
        self.session.read().clone()
    }

    /// Stream of session snapshots.
    pub fn subscribe_session(&self) -> watch::Receiver<Option<Session>> {
        self.session_tx.subscribe()
    }

    /// Stream of participant rosters.
    pub fn subscribe_participants(&self) -> watch::Receiver<Vec<Participant>> {
        self.participants_tx.subscribe()
    }

    /// Stream of connection-quality snapshots.
    pub fn subscribe_quality(&self) -> watch::Receiver<QualitySnapshot> {
        self.quality_tx.subscribe()
    }

    /// Stream of reconnection progress.
    pub fn subscribe_reconnection(&self) -> watch::Receiver<ReconnectionState> {
        self.reconnection_tx.subscribe()
    }

    /// Stream of inbound commands, in server-delivery order.
    pub fn subscribe_commands(&self) -> broadcast::Receiver<Command> {
        self.command_tx.subscribe()
    }

    /// Session snapshots as a `Stream`, for combinator-style consumers.
    pub fn session_stream(&self) -> WatchStream<Option<Session>> {
        WatchStream::new(self.session_tx.subscribe())
    }

    /// Inbound commands as a `Stream`; lagging consumers observe an error
    /// item and continue from the oldest retained command.
    pub fn command_stream(&self) -> BroadcastStream<Command> {
        BroadcastStream::new(self.command_tx.subscribe())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation (listener task only)
    // ─────────────────────────────────────────────────────────────────────────

    /// Installs the full session state after a join or resubscribe.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn replace_session(
        &self,
        group_id: String,
        group_name: String,
        participants: Vec<Participant>,
        queue: Vec<QueueEntry>,
        current_index: i64,
        is_paused: bool,
        position: Duration,
        shuffle: ShuffleMode,
        repeat: RepeatMode,
    ) {
        let role = self.role_in(&participants);
        let current_index = Session::clamp_index(queue.len(), current_index);
        let session = Session {
            group_id,
            group_name,
            role,
            participants,
            queue,
            current_index,
            is_paused,
            position,
            is_buffering: false,
            shuffle,
            repeat,
        };
        log::info!(
            "[Session] Joined group {} ({}) as {:?}",
            session.group_id,
            session.group_name,
            session.role
        );
        *self.session.write() = Some(session);
        self.publish();
    }

    /// Replaces the participant roster wholesale.
    ///
    /// Drops the update with a diagnostic when it references a group other
    /// than the active one (stale-subscription guard).
    pub(crate) fn replace_participants(&self, group_id: &str, participants: Vec<Participant>) {
        {
            let mut guard = self.session.write();
            let Some(session) = guard.as_mut() else {
                log::debug!("[Session] Participant update with no active session, ignoring");
                return;
            };
            if session.group_id != group_id {
                log::warn!(
                    "[Session] Dropping stale participant update for group {} (active: {})",
                    group_id,
                    session.group_id
                );
                return;
            }
            session.role = self.role_in(&participants);
            session.participants = participants;
        }
        self.publish();
    }

    /// Replaces the queue wholesale.
    pub(crate) fn replace_queue(
        &self,
        group_id: &str,
        queue: Vec<QueueEntry>,
        current_index: i64,
        shuffle: ShuffleMode,
        repeat: RepeatMode,
    ) {
        {
            let mut guard = self.session.write();
            let Some(session) = guard.as_mut() else {
                log::debug!("[Session] Queue update with no active session, ignoring");
                return;
            };
            if session.group_id != group_id {
                log::warn!(
                    "[Session] Dropping stale queue update for group {} (active: {})",
                    group_id,
                    session.group_id
                );
                return;
            }
            session.current_index = Session::clamp_index(queue.len(), current_index);
            session.queue = queue;
            session.shuffle = shuffle;
            session.repeat = repeat;
        }
        self.publish();
    }

    /// Applies an inbound command to the session projection and broadcasts
    /// it to subscribers.
    ///
    /// Returns the command paired with the post-application snapshot, or
    /// `None` when the command was stale or targeted a queue entry that no
    /// longer exists (recoverable no-op).
    pub(crate) fn apply_command(
        &self,
        group_id: &str,
        command: Command,
    ) -> Option<(Command, Session)> {
        let snapshot = {
            let mut guard = self.session.write();
            let Some(session) = guard.as_mut() else {
                log::debug!("[Session] Command with no active session, ignoring");
                return None;
            };
            if session.group_id != group_id {
                log::warn!(
                    "[Session] Dropping stale command for group {} (active: {})",
                    group_id,
                    session.group_id
                );
                return None;
            }

            match command.kind {
                CommandKind::Play => {
                    // Resolve the target slot: explicit playlist item id wins,
                    // positional index is the fallback.
                    let target_index = match &command.playlist_item_id {
                        Some(item_id) => match session.entry_by_playlist_item(item_id) {
                            Some((index, _)) => Some(index as i64),
                            None => {
                                log::warn!(
                                    "[Session] Play command for unknown playlist item {}, ignoring",
                                    item_id
                                );
                                return None;
                            }
                        },
                        None => command.track_index.map(|i| i as i64),
                    };
                    if let Some(index) = target_index {
                        session.current_index = Session::clamp_index(session.queue.len(), index);
                    }
                    session.is_paused = false;
                    session.is_buffering = false;
                    if let Some(ticks) = command.position_ticks {
                        session.position = ticks_to_duration(ticks);
                    }
                }
                CommandKind::Pause => {
                    session.is_paused = true;
                    if let Some(ticks) = command.position_ticks {
                        session.position = ticks_to_duration(ticks);
                    }
                }
                CommandKind::Stop => {
                    session.is_paused = true;
                    session.is_buffering = false;
                    session.position = Duration::ZERO;
                }
                CommandKind::Seek => {
                    let Some(ticks) = command.position_ticks else {
                        log::warn!("[Session] Seek command without a position, ignoring");
                        return None;
                    };
                    session.position = ticks_to_duration(ticks);
                }
            }
            session.clone()
        };

        self.publish();
        tracing::debug!(kind = ?command.kind, group = %group_id, "command applied");
        if let Err(e) = self.command_tx.send(command.clone()) {
            log::trace!("[Session] No command subscribers: {}", e);
        }
        Some((command, snapshot))
    }

    /// Marks this device buffering (or recovered) in the active session.
    ///
    /// Local-device state reported alongside the buffering/ready signals;
    /// inbound play commands also clear it.
    pub(crate) fn set_buffering(&self, buffering: bool) {
        {
            let mut guard = self.session.write();
            let Some(session) = guard.as_mut() else {
                return;
            };
            if session.is_buffering == buffering {
                return;
            }
            session.is_buffering = buffering;
        }
        self.publish();
    }

    /// Clears the session after leave or server-side group teardown.
    pub(crate) fn clear_session(&self, reason: &str) {
        let cleared = self.session.write().take();
        if let Some(session) = cleared {
            log::info!(
                "[Session] Left group {} ({}): {}",
                session.group_id,
                session.group_name,
                reason
            );
        }
        self.publish();
    }

    /// Publishes a connection-quality snapshot.
    pub(crate) fn set_quality(&self, snapshot: QualitySnapshot) {
        self.quality_tx.send_replace(snapshot);
    }

    /// Publishes reconnection progress.
    pub(crate) fn set_reconnection(&self, state: ReconnectionState) {
        self.reconnection_tx.send_replace(state);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Derives this device's role from a server roster.
    ///
    /// The latest server-sourced assertion always wins; transient
    /// dual-Captain windows during promotion resolve here.
    fn role_in(&self, participants: &[Participant]) -> PlayerRole {
        let is_captain = participants
            .iter()
            .any(|p| p.user_id == self.local_user_id && p.is_captain);
        if is_captain {
            PlayerRole::Captain
        } else {
            PlayerRole::Sailor
        }
    }

    /// Publishes the current session and roster snapshots.
    fn publish(&self) {
        let snapshot = self.session.read().clone();
        let participants = snapshot
            .as_ref()
            .map(|s| s.participants.clone())
            .unwrap_or_default();
        self.session_tx.send_replace(snapshot);
        self.participants_tx.send_replace(participants);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(playlist_item_id: &str, track_id: &str) -> QueueEntry {
        QueueEntry {
            playlist_item_id: playlist_item_id.into(),
            track_id: track_id.into(),
            added_by_user_id: "captain".into(),
        }
    }

    fn participant(user_id: &str, is_captain: bool) -> Participant {
        Participant {
            user_id: user_id.into(),
            display_name: user_id.into(),
            image_ref: None,
            is_captain,
        }
    }

    fn joined_manager(local_user_id: &str) -> SessionManager {
        let manager = SessionManager::new(local_user_id);
        manager.replace_session(
            "group-1".into(),
            "Movie Night".into(),
            vec![participant("captain", true), participant("sailor", false)],
            vec![entry("pli-1", "t1"), entry("pli-2", "t2"), entry("pli-3", "t3")],
            0,
            true,
            Duration::ZERO,
            ShuffleMode::Off,
            RepeatMode::Off,
        );
        manager
    }

    #[test]
    fn queue_replace_is_last_write_wins() {
        let manager = joined_manager("sailor");
        let replacement = vec![entry("pli-9", "t9")];
        manager.replace_queue("group-1", replacement.clone(), 0, ShuffleMode::Off, RepeatMode::Off);
        manager.replace_queue("group-1", replacement.clone(), 0, ShuffleMode::Off, RepeatMode::Off);

        let session = manager.snapshot().unwrap();
        assert_eq!(session.queue, replacement);
        assert_eq!(session.current_index, 0);
    }

    #[test]
    fn stale_group_updates_are_dropped() {
        let manager = joined_manager("sailor");
        manager.replace_queue("group-OLD", vec![], -1, ShuffleMode::Off, RepeatMode::Off);

        let session = manager.snapshot().unwrap();
        assert_eq!(session.queue.len(), 3);
    }

    #[test]
    fn role_follows_latest_server_assertion() {
        let manager = joined_manager("sailor");
        assert_eq!(manager.snapshot().unwrap().role, PlayerRole::Sailor);

        // Captain disconnects; server promotes this device.
        manager.replace_participants(
            "group-1",
            vec![participant("sailor", true)],
        );
        let session = manager.snapshot().unwrap();
        assert_eq!(session.role, PlayerRole::Captain);
        assert_eq!(session.participants.iter().filter(|p| p.is_captain).count(), 1);
    }

    #[test]
    fn play_command_for_missing_item_is_a_no_op() {
        let manager = joined_manager("sailor");
        let command = Command {
            kind: CommandKind::Play,
            position_ticks: None,
            playlist_item_id: Some("pli-GONE".into()),
            track_index: None,
            when: 0,
        };
        assert!(manager.apply_command("group-1", command).is_none());
        assert_eq!(manager.snapshot().unwrap().current_index, 0);
    }

    #[test]
    fn seek_command_updates_frozen_position() {
        let manager = joined_manager("sailor");
        let command = Command {
            kind: CommandKind::Seek,
            position_ticks: Some(300_000_000),
            playlist_item_id: None,
            track_index: None,
            when: 0,
        };
        let (_, session) = manager.apply_command("group-1", command).unwrap();
        assert_eq!(session.position, Duration::from_millis(30_000));
        assert!(session.is_paused);
    }

    #[test]
    fn play_command_selects_target_and_unpauses() {
        let manager = joined_manager("sailor");
        let command = Command {
            kind: CommandKind::Play,
            position_ticks: Some(0),
            playlist_item_id: Some("pli-2".into()),
            track_index: None,
            when: 0,
        };
        let (_, session) = manager.apply_command("group-1", command).unwrap();
        assert_eq!(session.current_index, 1);
        assert!(!session.is_paused);
    }

    #[test]
    fn commands_are_broadcast_in_order() {
        let manager = joined_manager("sailor");
        let mut commands = manager.subscribe_commands();

        for kind in [CommandKind::Pause, CommandKind::Stop] {
            manager.apply_command(
                "group-1",
                Command {
                    kind,
                    position_ticks: None,
                    playlist_item_id: None,
                    track_index: None,
                    when: 0,
                },
            );
        }

        assert_eq!(commands.try_recv().unwrap().kind, CommandKind::Pause);
        assert_eq!(commands.try_recv().unwrap().kind, CommandKind::Stop);
    }

    #[test]
    fn clear_session_publishes_empty_snapshot() {
        let manager = joined_manager("sailor");
        let receiver = manager.subscribe_session();
        manager.clear_session("user left");
        assert!(manager.snapshot().is_none());
        assert!(receiver.borrow().is_none());
    }
}

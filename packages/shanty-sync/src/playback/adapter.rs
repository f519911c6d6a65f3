//! Role-aware playback driver.
//!
//! Bridges inbound commands to the local audio collaborator, honoring the
//! Captain/Sailor asymmetry: the Captain issued the Control API calls that
//! produced the commands, so its local audio state already reflects the
//! intent and inbound commands are ignored; Sailors mirror the command
//! stream against their local player.

use std::sync::Arc;
use std::time::Duration;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::session::{Command, CommandKind, PlayerRole, Session};
use crate::utils::ticks_to_duration;

use super::traits::{LocalPlayback, TrackResolver};

/// Applies inbound commands to local playback according to role.
pub struct SyncAdapter {
    playback: Arc<dyn LocalPlayback>,
    resolver: Arc<dyn TrackResolver>,
    /// Drift beyond this triggers a corrective seek; below it the Sailor
    /// lets the jitter ride to avoid audible stutter.
    drift_tolerance: Duration,
}

impl SyncAdapter {
    /// Creates an adapter over the injected playback collaborators.
    pub fn new(
        playback: Arc<dyn LocalPlayback>,
        resolver: Arc<dyn TrackResolver>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            playback,
            resolver,
            drift_tolerance: Duration::from_millis(config.drift_tolerance_ms),
        }
    }

    /// Applies one command against the given session snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Playback`] when the local player rejects an
    /// operation. Callers log and continue: a failing device lags until
    /// the next command resynchronizes it, it never tears down the session.
    pub async fn apply_command(&self, session: &Session, command: &Command) -> SyncResult<()> {
        if session.role == PlayerRole::Captain {
            self.note_captain_divergence(command);
            return Ok(());
        }

        match command.kind {
            CommandKind::Play => self.apply_play(session, command).await,
            CommandKind::Pause => self.playback.pause().await,
            CommandKind::Stop => self.playback.stop().await,
            CommandKind::Seek => match command.position_ticks {
                Some(ticks) => self.playback.seek(ticks_to_duration(ticks)).await,
                None => {
                    log::warn!("[SyncAdapter] Seek command without a position, ignoring");
                    Ok(())
                }
            },
        }
    }

    /// Sailor-side handling of a play command.
    ///
    /// Resolves the target slot (explicit playlist item id preferred,
    /// positional index as fallback); loads the track if it differs from
    /// what is playing locally, otherwise resumes and reconciles position
    /// only when drift exceeds the tolerance.
    async fn apply_play(&self, session: &Session, command: &Command) -> SyncResult<()> {
        let target = match &command.playlist_item_id {
            Some(item_id) => session.entry_by_playlist_item(item_id).map(|(_, e)| e),
            None => match command.track_index {
                Some(index) => session.queue.get(index),
                None => session.current_entry(),
            },
        };
        let Some(target) = target else {
            log::warn!("[SyncAdapter] Play command target not in queue snapshot, ignoring");
            return Ok(());
        };

        let commanded_position = command.position_ticks.map(ticks_to_duration);
        let same_track = self
            .playback
            .current_track()
            .is_some_and(|t| t.track_id == target.track_id);

        if same_track {
            self.playback.resume().await?;
            if let Some(commanded) = commanded_position {
                let local = self.playback.position();
                if Self::drift(local, commanded) > self.drift_tolerance {
                    log::debug!(
                        "[SyncAdapter] Reconciling {}ms drift on {}",
                        Self::drift(local, commanded).as_millis(),
                        target.track_id
                    );
                    self.playback.seek(commanded).await?;
                }
            }
            return Ok(());
        }

        let track = self
            .resolver
            .resolve(&target.track_id)
            .await
            .map_err(|e| SyncError::Playback(format!("resolve {}: {}", target.track_id, e)))?;
        self.playback.play(&track).await?;
        if let Some(commanded) = commanded_position {
            if commanded > Duration::ZERO {
                self.playback.seek(commanded).await?;
            }
        }
        Ok(())
    }

    /// Captain-side divergence check.
    ///
    /// The Captain ignores its own broadcast commands, assuming local
    /// playback and the Control API call were issued together. If local
    /// state visibly disagrees with the command, that assumption broke
    /// (e.g. the local call failed after the network call succeeded) —
    /// make it visible instead of silently desyncing; the next
    /// authoritative broadcast remains the recovery path.
    fn note_captain_divergence(&self, command: &Command) {
        log::debug!("[SyncAdapter] Captain ignoring own {:?} command", command.kind);
        if let Some(ticks) = command.position_ticks {
            let commanded = ticks_to_duration(ticks);
            let local = self.playback.position();
            if Self::drift(local, commanded) > self.drift_tolerance {
                log::warn!(
                    "[SyncAdapter] Captain local position {}ms diverges from own command {}ms",
                    local.as_millis(),
                    commanded.as_millis()
                );
            }
        }
    }

    fn drift(a: Duration, b: Duration) -> Duration {
        if a > b {
            a - b
        } else {
            b - a
        }
    }
}

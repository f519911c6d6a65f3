//! Command Channel connection driver.
//!
//! Owns the WebSocket client, the listener loop, the ping timer and the
//! reconnection state machine. The listener task is the sole writer of
//! session state; everything it learns from the server flows through
//! [`SessionManager`] mutation calls, in delivery order.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::sink::SinkExt;
use futures::stream::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::api::PlaybackReport;
use crate::config::SyncConfig;
use crate::constants::OUTBOUND_CHANNEL_CAPACITY;
use crate::credentials::CredentialsProvider;
use crate::error::{SyncError, SyncResult};
use crate::playback::SyncAdapter;
use crate::session::{QualitySnapshot, SessionManager};
use crate::utils::ticks_to_duration;

use super::messages::{
    BufferingPayload, ClientMessage, PingPayload, ReadyPayload, ServerMessage,
};
use super::reconnect::{ReconnectPolicy, SingleFlight};
use super::{ConnectionQuality, ReconnectionState, RttWindow};

/// Why a connected session stopped without a transport error.
enum SessionExit {
    /// Own leave confirmed by the server.
    Left,
    /// The group no longer exists on the server.
    Ended,
    /// Local cancellation (leave/logout teardown).
    Cancelled,
}

/// Persistent, auto-reconnecting duplex channel to the server.
///
/// Created per group membership and driven by [`CommandChannel::run`],
/// typically from a spawned task. Leaving the group or logging out cancels
/// the token, which tears down the listener, the ping timer and any
/// in-flight backoff wait; a manager holding the previous group's channel
/// can never leak updates into a newly joined group because session
/// mutations are group-id guarded.
pub struct CommandChannel {
    config: SyncConfig,
    policy: ReconnectPolicy,
    credentials: Arc<dyn CredentialsProvider>,
    sessions: Arc<SessionManager>,
    adapter: Arc<SyncAdapter>,
    cancel: CancellationToken,
    flight: Arc<SingleFlight>,
    outbound_tx: mpsc::Sender<ClientMessage>,
    /// Taken by the first `run()` call.
    outbound_rx: Mutex<Option<mpsc::Receiver<ClientMessage>>>,
}

impl CommandChannel {
    /// Creates a channel; no connection is made until [`Self::run`].
    pub fn new(
        config: SyncConfig,
        credentials: Arc<dyn CredentialsProvider>,
        sessions: Arc<SessionManager>,
        adapter: Arc<SyncAdapter>,
    ) -> Self {
        let policy = ReconnectPolicy::from_config(&config);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
        Self {
            config,
            policy,
            credentials,
            sessions,
            adapter,
            cancel: CancellationToken::new(),
            flight: Arc::new(SingleFlight::default()),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
        }
    }

    /// Signals terminal teardown (user left the group or logged out).
    ///
    /// Cancels the listener, the ping timer and any backoff wait. No
    /// further reconnection is attempted.
    pub fn shutdown(&self) {
        log::info!("[Channel] Shutdown requested");
        self.cancel.cancel();
    }

    /// Queues a ready/not-ready signal for the socket writer.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Channel`] when the outbound queue is full or
    /// the channel has shut down; callers may fall back to the Control API
    /// endpoint.
    pub fn send_ready(&self, ready: bool, report: PlaybackReport) -> SyncResult<()> {
        self.queue_outbound(ClientMessage::Ready {
            payload: ReadyPayload { ready, report },
        })?;
        if ready {
            self.sessions.set_buffering(false);
        }
        Ok(())
    }

    /// Queues a buffering signal; errors as for [`Self::send_ready`].
    pub fn send_buffering(&self, report: PlaybackReport) -> SyncResult<()> {
        self.queue_outbound(ClientMessage::Buffering {
            payload: BufferingPayload { report },
        })?;
        self.sessions.set_buffering(true);
        Ok(())
    }

    /// Number of reconnection attempts currently in progress (0 or 1).
    ///
    /// Exposed so tests can observe the single-flight property.
    pub fn reconnects_in_flight(&self) -> usize {
        self.flight.in_flight()
    }

    /// Drives the channel until terminal disconnect.
    ///
    /// Outer loop of the connection state machine: connect, drive the
    /// session, and on transport failure back off and retry up to the
    /// configured budget. Runs on the caller's task; embedders usually
    /// `tokio::spawn` it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ReconnectFailed`] when the reconnection budget
    /// is exhausted (the UI should offer a manual rejoin) and
    /// [`SyncError::Credentials`] on terminal auth loss. Ordinary exits
    /// (leave, session ended, shutdown) return `Ok`.
    pub async fn run(&self) -> SyncResult<()> {
        let Some(mut outbound_rx) = self.outbound_rx.lock().take() else {
            log::error!("[Channel] run() called twice, ignoring");
            return Err(SyncError::Channel("run() called twice".into()));
        };

        let mut outcome: SyncResult<()> = Ok(());
        let mut attempt: u32 = 0;
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            match self.connect_and_drive(&mut attempt, &mut outbound_rx).await {
                Ok(SessionExit::Left) => {
                    self.sessions.clear_session("left group");
                    break;
                }
                Ok(SessionExit::Ended) => {
                    self.sessions.clear_session("session ended by server");
                    break;
                }
                Ok(SessionExit::Cancelled) => {
                    self.sessions.clear_session("local teardown");
                    break;
                }
                Err(SyncError::Credentials(reason)) => {
                    // Auth loss is fatal to the whole app session and is
                    // handled by the surrounding auth layer, not retried here.
                    log::error!("[Channel] Terminal credentials failure: {}", reason);
                    self.sessions.clear_session("credentials lost");
                    outcome = Err(SyncError::Credentials(reason));
                    break;
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > self.policy.max_attempts {
                        log::error!(
                            "[Channel] Reconnect budget exhausted after {} attempt(s): {}",
                            self.policy.max_attempts,
                            e
                        );
                        self.sessions.set_reconnection(ReconnectionState::Idle);
                        self.sessions.clear_session("connection lost");
                        outcome = Err(SyncError::ReconnectFailed {
                            attempts: self.policy.max_attempts,
                        });
                        break;
                    }

                    log::warn!(
                        "[Channel] Transport failure ({}), reconnecting (attempt {}/{})",
                        e,
                        attempt,
                        self.policy.max_attempts
                    );
                    self.sessions.set_quality(QualitySnapshot {
                        quality: ConnectionQuality::Disconnected,
                        average_rtt_ms: None,
                    });
                    self.sessions.set_reconnection(ReconnectionState::Reconnecting {
                        attempt,
                        max_attempts: self.policy.max_attempts,
                    });

                    // Single-flight: the loop structure already serializes
                    // attempts; the guard makes that observable.
                    let Some(_guard) = self.flight.begin() else {
                        log::error!("[Channel] Reconnect already in flight, skipping");
                        continue;
                    };
                    let delay = self.policy.delay_for(attempt);
                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            self.sessions.clear_session("local teardown");
                            break;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        self.sessions.set_quality(QualitySnapshot {
            quality: ConnectionQuality::Disconnected,
            average_rtt_ms: None,
        });
        log::info!("[Channel] Listener stopped");
        outcome
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Connected session
    // ─────────────────────────────────────────────────────────────────────────

    /// Connects once and drives the session until exit or transport error.
    async fn connect_and_drive(
        &self,
        attempt: &mut u32,
        outbound_rx: &mut mpsc::Receiver<ClientMessage>,
    ) -> SyncResult<SessionExit> {
        let profile = self.credentials.device_profile().await?;
        let (socket, _) = connect_async(profile.socket_url()).await?;

        // Connection established: reset the attempt counter and tell the UI.
        *attempt = 0;
        self.sessions.set_reconnection(ReconnectionState::Idle);
        log::info!("[Channel] Connected as device {}", profile.device_id);

        let (mut ws_tx, mut ws_rx) = socket.split();
        let mut rtt = RttWindow::new();
        let mut sequence: u64 = 0;
        let mut pending_pong: Option<(u64, Instant)> = None;
        let pong_deadline = Duration::from_millis(self.config.pong_deadline_ms);

        let mut ping_timer = interval(Duration::from_millis(self.config.ping_interval_ms));
        ping_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    return Ok(SessionExit::Cancelled);
                }

                _ = ping_timer.tick() => {
                    if let Some((_, sent_at)) = pending_pong {
                        if sent_at.elapsed() >= pong_deadline {
                            // Dropped sample: no pong within the deadline.
                            rtt.record_missed();
                            pending_pong = None;
                            self.publish_quality(&rtt);
                            if rtt.is_dead() {
                                return Err(SyncError::Transport(
                                    "pong deadline exceeded".into(),
                                ));
                            }
                        }
                    }
                    if pending_pong.is_none() {
                        sequence += 1;
                        let message = ClientMessage::Ping {
                            payload: PingPayload { sequence },
                        };
                        ws_tx.send(Message::Text(serde_json::to_string(&message)?)).await?;
                        pending_pong = Some((sequence, Instant::now()));
                    }
                }

                outbound = outbound_rx.recv() => {
                    if let Some(message) = outbound {
                        ws_tx.send(Message::Text(serde_json::to_string(&message)?)).await?;
                    }
                }

                inbound = ws_rx.next() => {
                    match inbound {
                        None => return Err(SyncError::Transport("socket closed".into())),
                        Some(Err(e)) => return Err(e.into()),
                        Some(Ok(Message::Text(text))) => {
                            match self.handle_text(&text, &mut rtt, &mut pending_pong).await {
                                ControlFlow::Continue(()) => {}
                                ControlFlow::Break(exit) => return Ok(exit),
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            ws_tx.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            return Err(SyncError::Transport(format!(
                                "server closed connection: {:?}",
                                frame
                            )));
                        }
                        Some(Ok(_)) => {}
                    }
                }
            }
        }
    }

    /// Decodes and dispatches one inbound text frame.
    ///
    /// Malformed frames and unknown types are logged and skipped — a bad
    /// message must never take the listener down.
    async fn handle_text(
        &self,
        text: &str,
        rtt: &mut RttWindow,
        pending_pong: &mut Option<(u64, Instant)>,
    ) -> ControlFlow<SessionExit> {
        let message: ServerMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("[Channel] Undecodable message ({}), skipping", e);
                return ControlFlow::Continue(());
            }
        };

        match message {
            ServerMessage::Command { payload } => {
                let group_id = payload.group_id.clone();
                let command = payload.into_command();
                if let Some((command, snapshot)) = self.sessions.apply_command(&group_id, command) {
                    if let Err(e) = self.adapter.apply_command(&snapshot, &command).await {
                        // Local playback failure: this device lags until the
                        // next command resynchronizes it; the session lives on.
                        log::warn!("[Channel] Local playback failed: {}", e);
                    }
                }
            }
            ServerMessage::GroupJoined { payload } => {
                self.sessions.replace_session(
                    payload.group_id,
                    payload.group_name,
                    payload.participants,
                    payload.queue,
                    payload.current_index,
                    payload.is_paused,
                    ticks_to_duration(payload.position_ticks),
                    payload.shuffle,
                    payload.repeat,
                );
            }
            ServerMessage::GroupUpdate { payload }
            | ServerMessage::UserJoined { payload }
            | ServerMessage::UserLeft { payload } => {
                self.sessions
                    .replace_participants(&payload.group_id, payload.participants);
            }
            ServerMessage::QueueUpdate { payload } => {
                self.sessions.replace_queue(
                    &payload.group_id,
                    payload.queue,
                    payload.current_index,
                    payload.shuffle,
                    payload.repeat,
                );
            }
            ServerMessage::GroupLeft { payload } => {
                log::info!(
                    "[Channel] Leave confirmed for group {} ({})",
                    payload.group_id,
                    payload.reason.as_deref().unwrap_or("user request")
                );
                return ControlFlow::Break(SessionExit::Left);
            }
            ServerMessage::SessionEnded { payload } => {
                log::info!(
                    "[Channel] Group {} ended by server ({})",
                    payload.group_id,
                    payload.reason.as_deref().unwrap_or("no reason given")
                );
                return ControlFlow::Break(SessionExit::Ended);
            }
            ServerMessage::Pong { payload } => {
                match pending_pong.take() {
                    Some((sequence, sent_at)) if sequence == payload.sequence => {
                        rtt.record_sample(sent_at.elapsed().as_millis() as u64);
                        self.publish_quality(rtt);
                    }
                    Some(other) => {
                        // Stale pong from before a reconnect; keep waiting.
                        log::debug!(
                            "[Channel] Pong sequence mismatch ({} != {})",
                            payload.sequence,
                            other.0
                        );
                        *pending_pong = Some(other);
                    }
                    None => {
                        log::debug!("[Channel] Unsolicited pong, ignoring");
                    }
                }
            }
            ServerMessage::Unknown => {
                log::debug!("[Channel] Ignoring unknown message type");
            }
        }
        ControlFlow::Continue(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn publish_quality(&self, rtt: &RttWindow) {
        self.sessions.set_quality(QualitySnapshot {
            quality: rtt.classify(&self.config),
            average_rtt_ms: rtt.average_rtt_ms(),
        });
    }

    fn queue_outbound(&self, message: ClientMessage) -> SyncResult<()> {
        self.outbound_tx
            .try_send(message)
            .map_err(|e| SyncError::Channel(format!("outbound queue: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::credentials::{DeviceProfile, StaticCredentials};
    use crate::playback::{CatalogTrack, LocalPlayback, TrackResolver};
    use crate::session::PlayerRole;
    use async_trait::async_trait;

    struct IdlePlayback;

    #[async_trait]
    impl LocalPlayback for IdlePlayback {
        async fn play(&self, _track: &CatalogTrack) -> SyncResult<()> {
            Ok(())
        }
        async fn pause(&self) -> SyncResult<()> {
            Ok(())
        }
        async fn resume(&self) -> SyncResult<()> {
            Ok(())
        }
        async fn seek(&self, _position: Duration) -> SyncResult<()> {
            Ok(())
        }
        async fn stop(&self) -> SyncResult<()> {
            Ok(())
        }
        async fn next(&self) -> SyncResult<()> {
            Ok(())
        }
        async fn previous(&self) -> SyncResult<()> {
            Ok(())
        }
        fn current_track(&self) -> Option<CatalogTrack> {
            None
        }
        fn position(&self) -> Duration {
            Duration::ZERO
        }
    }

    struct IdleResolver;

    #[async_trait]
    impl TrackResolver for IdleResolver {
        async fn resolve(&self, track_id: &str) -> SyncResult<CatalogTrack> {
            Ok(CatalogTrack {
                track_id: track_id.into(),
                title: track_id.into(),
                artist: None,
                duration_ms: None,
            })
        }
    }

    fn profile(server_url: &str, access_token: &str) -> DeviceProfile {
        DeviceProfile {
            server_url: server_url.into(),
            device_id: "device-1".into(),
            user_id: "user-1".into(),
            display_name: "Test".into(),
            access_token: access_token.into(),
        }
    }

    fn channel(config: SyncConfig, profile: DeviceProfile) -> CommandChannel {
        channel_with(config, profile, Arc::new(IdlePlayback))
    }

    fn channel_with(
        config: SyncConfig,
        profile: DeviceProfile,
        playback: Arc<dyn LocalPlayback>,
    ) -> CommandChannel {
        let sessions = Arc::new(SessionManager::new(profile.user_id.clone()));
        let adapter = Arc::new(SyncAdapter::new(playback, Arc::new(IdleResolver), &config));
        CommandChannel::new(config, Arc::new(StaticCredentials::new(profile)), sessions, adapter)
    }

    #[tokio::test]
    async fn cancelled_channel_exits_without_connecting() {
        let channel = channel(SyncConfig::default(), profile("http://127.0.0.1:9", "token"));
        channel.shutdown();
        assert!(channel.run().await.is_ok());
        assert_eq!(channel.reconnects_in_flight(), 0);
    }

    #[tokio::test]
    async fn credentials_failure_is_terminal() {
        // Empty token makes StaticCredentials fail; the run loop must not
        // enter the reconnection path for an auth failure.
        let config = SyncConfig::default();
        let channel = channel(config, profile("http://127.0.0.1:9", ""));
        let reconnection = channel.sessions.subscribe_reconnection();

        let outcome = channel.run().await;

        assert!(matches!(outcome, Err(SyncError::Credentials(_))));
        assert_eq!(*reconnection.borrow(), ReconnectionState::Idle);
        assert_eq!(channel.reconnects_in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_reconnect_budget_goes_terminally_disconnected() {
        // Port 9 (discard) refuses immediately; every attempt fails.
        let config = SyncConfig {
            max_reconnect_attempts: 2,
            reconnect_base_delay_ms: 10,
            reconnect_max_delay_ms: 20,
            ..SyncConfig::default()
        };
        let channel = channel(config, profile("http://127.0.0.1:9", "token"));
        let quality = channel.sessions.subscribe_quality();
        let reconnection = channel.sessions.subscribe_reconnection();

        let outcome = channel.run().await;

        assert!(matches!(
            outcome,
            Err(SyncError::ReconnectFailed { attempts: 2 })
        ));
        assert_eq!(quality.borrow().quality, ConnectionQuality::Disconnected);
        assert_eq!(*reconnection.borrow(), ReconnectionState::Idle);
        assert_eq!(channel.reconnects_in_flight(), 0);
    }

    #[tokio::test]
    async fn outbound_queue_overflow_surfaces_as_channel_error() {
        let channel = channel(SyncConfig::default(), profile("http://127.0.0.1:9", "token"));
        let report = PlaybackReport {
            position_ticks: 0,
            is_playing: false,
            when: 0,
        };

        // Nothing drains the queue (run() not started); fill it.
        for _ in 0..OUTBOUND_CHANNEL_CAPACITY {
            channel.send_ready(true, report).unwrap();
        }
        let overflow = channel.send_buffering(report);
        assert!(matches!(overflow, Err(SyncError::Channel(_))));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scripted-server scenario
    // ─────────────────────────────────────────────────────────────────────────

    /// Player mock that records seeks so convergence can be asserted.
    struct SeekRecorder {
        seeks: parking_lot::Mutex<Vec<u64>>,
        position: parking_lot::Mutex<Duration>,
    }

    impl SeekRecorder {
        fn new() -> Self {
            Self {
                seeks: parking_lot::Mutex::new(Vec::new()),
                position: parking_lot::Mutex::new(Duration::ZERO),
            }
        }
    }

    #[async_trait]
    impl LocalPlayback for SeekRecorder {
        async fn play(&self, _track: &CatalogTrack) -> SyncResult<()> {
            Ok(())
        }
        async fn pause(&self) -> SyncResult<()> {
            Ok(())
        }
        async fn resume(&self) -> SyncResult<()> {
            Ok(())
        }
        async fn seek(&self, position: Duration) -> SyncResult<()> {
            self.seeks.lock().push(position.as_millis() as u64);
            *self.position.lock() = position;
            Ok(())
        }
        async fn stop(&self) -> SyncResult<()> {
            Ok(())
        }
        async fn next(&self) -> SyncResult<()> {
            Ok(())
        }
        async fn previous(&self) -> SyncResult<()> {
            Ok(())
        }
        fn current_track(&self) -> Option<CatalogTrack> {
            None
        }
        fn position(&self) -> Duration {
            *self.position.lock()
        }
    }

    fn group_joined_json(position_ticks: i64) -> String {
        serde_json::json!({
            "type": "GROUP_JOINED",
            "payload": {
                "groupId": "g1",
                "groupName": "Movie Night",
                "participants": [
                    {"userId": "captain", "displayName": "Cap", "isCaptain": true},
                    {"userId": "user-1", "displayName": "Me", "isCaptain": false}
                ],
                "queue": [
                    {"playlistItemId": "pli-1", "trackId": "t1", "addedByUserId": "captain"},
                    {"playlistItemId": "pli-2", "trackId": "t2", "addedByUserId": "captain"},
                    {"playlistItemId": "pli-3", "trackId": "t3", "addedByUserId": "captain"}
                ],
                "currentIndex": 0,
                "isPaused": true,
                "positionTicks": position_ticks
            }
        })
        .to_string()
    }

    fn seek_command_json() -> String {
        serde_json::json!({
            "type": "COMMAND",
            "payload": {
                "groupId": "g1",
                "command": "seek",
                "positionTicks": 300_000_000i64,
                "when": 1u64
            }
        })
        .to_string()
    }

    /// Waits until the watched value satisfies the predicate.
    async fn wait_for<T>(
        rx: &mut tokio::sync::watch::Receiver<T>,
        pred: impl Fn(&T) -> bool,
    ) {
        loop {
            if pred(&rx.borrow()) {
                return;
            }
            rx.changed().await.expect("watch sender dropped");
        }
    }

    /// Captain creates "Movie Night", this Sailor joins, mirrors a seek,
    /// survives a transport drop, and recovers the server's state.
    #[tokio::test]
    async fn sailor_converges_and_recovers_across_reconnect() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            // First connection: full state, a seek command, then a drop.
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Text(group_joined_json(0))).await.unwrap();
            ws.send(Message::Text(seek_command_json())).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            drop(ws);

            // Second connection: the client reconnected; restore the
            // (meanwhile advanced) server state and hold the socket open
            // until the client tears down.
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Text(group_joined_json(450_000_000)))
                .await
                .unwrap();
            while let Some(Ok(message)) = ws.next().await {
                if matches!(message, Message::Close(_)) {
                    break;
                }
            }
        });

        // Long ping interval keeps the pong deadline out of this test;
        // short backoff keeps the reconnect fast.
        let config = SyncConfig {
            ping_interval_ms: 60_000,
            reconnect_base_delay_ms: 50,
            reconnect_max_delay_ms: 100,
            ..SyncConfig::default()
        };
        let playback = Arc::new(SeekRecorder::new());
        let channel = Arc::new(channel_with(
            config,
            profile(&format!("http://{}", addr), "token"),
            Arc::clone(&playback) as Arc<dyn LocalPlayback>,
        ));

        let mut session_rx = channel.sessions.subscribe_session();
        let reconnection_rx = channel.sessions.subscribe_reconnection();

        let runner = {
            let channel = Arc::clone(&channel);
            tokio::spawn(async move { channel.run().await })
        };

        tokio::time::timeout(Duration::from_secs(10), async {
            // Queue snapshot arrives with exactly the broadcast entries, in order.
            wait_for(&mut session_rx, |s| {
                s.as_ref().is_some_and(|s| s.queue.len() == 3)
            })
            .await;
            let session = channel.sessions.snapshot().unwrap();
            assert_eq!(
                session.queue.iter().map(|e| e.playlist_item_id.as_str()).collect::<Vec<_>>(),
                vec!["pli-1", "pli-2", "pli-3"]
            );
            assert_eq!(session.role, PlayerRole::Sailor);

            // The seek command converges local playback to ~30s.
            while playback.seeks.lock().is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }

            // Transport drop: the channel reconnects and the advanced
            // server state replaces the local projection wholesale.
            wait_for(&mut session_rx, |s| {
                s.as_ref()
                    .is_some_and(|s| s.position == Duration::from_millis(45_000))
            })
            .await;
        })
        .await
        .expect("scenario timed out");

        assert_eq!(playback.position(), Duration::from_millis(30_000));
        assert_eq!(*playback.seeks.lock(), vec![30_000]);
        assert_eq!(*reconnection_rx.borrow(), ReconnectionState::Idle);
        assert_eq!(channel.reconnects_in_flight(), 0);

        channel.shutdown();
        runner.await.unwrap().unwrap();
        server.await.unwrap();
    }
}

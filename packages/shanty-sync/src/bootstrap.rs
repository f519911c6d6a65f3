//! Sync core bootstrap and dependency wiring.
//!
//! This module contains the composition root - the single place where the
//! sync services are instantiated and wired together. This pattern provides:
//!
//! - **Clarity**: All dependency relationships are visible in one place
//! - **Testability**: Easy to swap collaborator implementations for testing
//! - **Maintainability**: Service creation logic is isolated from usage

use std::sync::Arc;

use crate::api::ControlApi;
use crate::channel::CommandChannel;
use crate::config::SyncConfig;
use crate::credentials::CredentialsProvider;
use crate::error::SyncResult;
use crate::playback::{LocalPlayback, SyncAdapter, TrackCacheWarmer, TrackResolver};
use crate::session::SessionManager;

/// Container for all wired sync services.
///
/// Constructed once per signed-in user via [`bootstrap_sync`]; group
/// membership comes and goes within its lifetime. The UI layer subscribes
/// through [`SyncServices::sessions`] and issues intents through
/// [`SyncServices::api`].
#[derive(Clone)]
pub struct SyncServices {
    /// Control API for group/queue/transport mutations.
    pub api: Arc<ControlApi>,
    /// Session state owner and subscription hub.
    pub sessions: Arc<SessionManager>,
    /// Role-aware playback driver.
    pub adapter: Arc<SyncAdapter>,
    /// The Command Channel for the active group membership.
    pub channel: Arc<CommandChannel>,
}

impl SyncServices {
    /// Starts the Command Channel listener on the current runtime.
    ///
    /// Call after a successful group create/join; the server's
    /// `GROUP_JOINED` broadcast installs the session state. Terminal
    /// failures (reconnect budget exhausted, auth loss) are logged; the UI
    /// observes them through the session and reconnection subscriptions.
    pub fn start_channel(&self) -> tokio::task::JoinHandle<()> {
        let channel = Arc::clone(&self.channel);
        tokio::spawn(async move {
            if let Err(e) = channel.run().await {
                log::error!("[Bootstrap] Command Channel terminated: {}", e);
            }
        })
    }

    /// Leaves the active group: confirms with the server, then tears the
    /// channel down.
    ///
    /// Teardown proceeds even when the leave call fails — the server
    /// expires the membership on disconnect.
    pub async fn leave_group(&self) -> SyncResult<()> {
        let result = self.api.leave_group().await;
        if let Err(ref e) = result {
            log::warn!("[Bootstrap] Leave call failed ({}), tearing down anyway", e);
        }
        self.channel.shutdown();
        result
    }

    /// Initiates graceful shutdown of all sync services (logout path).
    pub fn shutdown(&self) {
        log::info!("[Bootstrap] Beginning sync core shutdown");
        self.channel.shutdown();
    }
}

/// Dependencies the embedding app must supply.
pub struct SyncCollaborators {
    /// Identity/auth layer.
    pub credentials: Arc<dyn CredentialsProvider>,
    /// Local audio output.
    pub playback: Arc<dyn LocalPlayback>,
    /// Catalog track lookup.
    pub resolver: Arc<dyn TrackResolver>,
    /// Optional speculative auxiliary-data cache.
    pub cache_warmer: Option<Arc<dyn TrackCacheWarmer>>,
}

/// Bootstraps the sync core with its collaborators.
///
/// Wiring order follows dependency order: session manager, adapter,
/// Control API, then the Command Channel over all three.
///
/// # Errors
///
/// Returns an error when the configuration is invalid or the HTTP client
/// cannot be constructed.
pub async fn bootstrap_sync(
    config: SyncConfig,
    collaborators: SyncCollaborators,
) -> SyncResult<SyncServices> {
    config
        .validate()
        .map_err(crate::error::SyncError::Configuration)?;

    let profile = collaborators.credentials.device_profile().await?;
    let sessions = Arc::new(SessionManager::new(profile.user_id));

    let adapter = Arc::new(SyncAdapter::new(
        Arc::clone(&collaborators.playback),
        Arc::clone(&collaborators.resolver),
        &config,
    ));

    let mut api = ControlApi::new(&config, Arc::clone(&collaborators.credentials))?;
    if let Some(warmer) = &collaborators.cache_warmer {
        api = api.with_cache_warmer(Arc::clone(warmer));
    }
    let api = Arc::new(api);

    let channel = Arc::new(CommandChannel::new(
        config,
        collaborators.credentials,
        Arc::clone(&sessions),
        Arc::clone(&adapter),
    ));

    Ok(SyncServices {
        api,
        sessions,
        adapter,
        channel,
    })
}

//! Identity and credentials collaborator.
//!
//! The sync core never owns authentication: the surrounding app supplies
//! server URL, device identity and access token through the
//! [`CredentialsProvider`] trait. Tokens can rotate, so the provider is
//! queried per connection/request rather than captured once.

use async_trait::async_trait;

use crate::error::{SyncError, SyncResult};

/// Identity material for one signed-in device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Base server URL, e.g. `https://media.example.com`.
    pub server_url: String,
    /// Stable identifier for this client device.
    pub device_id: String,
    /// Identifier of the signed-in user.
    pub user_id: String,
    /// Display name shown to other group participants.
    pub display_name: String,
    /// Bearer token for the server's HTTP and socket interfaces.
    pub access_token: String,
}

impl DeviceProfile {
    /// Creates a profile with a freshly generated device id.
    ///
    /// Embedders that persist a device id across launches should construct
    /// the struct directly instead; a new id makes the server treat this
    /// as a brand-new device.
    pub fn new(
        server_url: impl Into<String>,
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            device_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            display_name: display_name.into(),
            access_token: access_token.into(),
        }
    }

    /// Builds the Command Channel socket URL for this profile.
    ///
    /// The HTTP scheme is mapped to its WebSocket counterpart; device id
    /// and token ride as query parameters because the socket handshake
    /// cannot carry custom headers from every embedder.
    pub fn socket_url(&self) -> String {
        let base = self.server_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!(
            "{}/sync/socket?deviceId={}&token={}",
            ws_base, self.device_id, self.access_token
        )
    }

    /// Builds a Control API endpoint URL from a relative path.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/sync/{}",
            self.server_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Supplies the current device identity to the sync core.
///
/// Implemented by the surrounding app's auth layer. Loss of authentication
/// is fatal to the whole app session and handled there, not here.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Returns the current device profile.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Credentials`] when no valid identity is
    /// available (signed out, token refresh failed).
    async fn device_profile(&self) -> SyncResult<DeviceProfile>;
}

/// Fixed-credentials provider for tests and simple embedders.
pub struct StaticCredentials {
    profile: DeviceProfile,
}

impl StaticCredentials {
    /// Creates a provider that always returns the given profile.
    pub fn new(profile: DeviceProfile) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentials {
    async fn device_profile(&self) -> SyncResult<DeviceProfile> {
        if self.profile.access_token.is_empty() {
            return Err(SyncError::Credentials("empty access token".into()));
        }
        Ok(self.profile.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(server_url: &str) -> DeviceProfile {
        DeviceProfile {
            server_url: server_url.to_string(),
            device_id: "device-1".into(),
            user_id: "user-1".into(),
            display_name: "Test Device".into(),
            access_token: "token".into(),
        }
    }

    #[test]
    fn socket_url_maps_https_to_wss() {
        let url = profile("https://media.example.com/").socket_url();
        assert_eq!(
            url,
            "wss://media.example.com/sync/socket?deviceId=device-1&token=token"
        );
    }

    #[test]
    fn socket_url_maps_http_to_ws() {
        let url = profile("http://10.0.0.2:8096").socket_url();
        assert!(url.starts_with("ws://10.0.0.2:8096/sync/socket"));
    }

    #[test]
    fn api_url_joins_without_double_slash() {
        let url = profile("https://media.example.com/").api_url("/queue/add");
        assert_eq!(url, "https://media.example.com/sync/queue/add");
    }
}

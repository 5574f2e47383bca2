//! Authentication — credentials, the bearer token and its lifecycle.
//!
//! ## Token model
//!
//! - One [`AccessToken`] per client instance, absent until the first call needs it.
//! - It is kept until explicitly invalidated. No expiry is tracked locally; the
//!   service rejecting a call (403 `not_authorized`) is the only staleness signal.
//! - The token and client secret never appear in `Debug` output or logs.

#[cfg(feature = "http")]
pub mod client;

#[cfg(feature = "http")]
pub mod manager;

#[cfg(feature = "http")]
pub use manager::TokenManager;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque bearer credential.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Client identifier and secret exchanged for an [`AccessToken`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Wire types (caller convention; the dispatcher converts keys)
// ============================================================================

/// Body of `POST auth/token`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

impl<'a> From<&'a Credentials> for TokenRequest<'a> {
    fn from(c: &'a Credentials) -> Self {
        Self {
            client_id: &c.client_id,
            client_secret: &c.client_secret,
        }
    }
}

/// Decoded response of `POST auth/token`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    /// Anything else the service returns (token type, expiry, ...). Kept for
    /// inspection, never acted on.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

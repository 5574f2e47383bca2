//! High-level client — `CanopyClient` and its builder.
//!
//! Per-resource calls (accounts, customers, products, line items) are thin
//! mappings over [`CanopyClient::fire`] / [`CanopyClient::request`]: build a
//! path, dispatch, reshape the decoded payload.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::client::Authentication;
use crate::auth::{Credentials, TokenManager};
use crate::error::SdkError;
use crate::http::{Body, CanopyHttp, Method, Query, ResponseEnvelope, ReqwestTransport, Transport};

// Re-export sub-client types for convenience.
pub use crate::auth::client::Authentication as AuthenticationClient;

/// Environment variable holding the client id.
pub const ENV_CLIENT_ID: &str = "CANOPY_CLIENT_ID";
/// Environment variable holding the client secret.
pub const ENV_CLIENT_SECRET: &str = "CANOPY_CLIENT_SECRET";
/// Environment variable holding an optional host override.
pub const ENV_HOST: &str = "CANOPY_HOST";

/// The primary entry point for the Canopy SDK.
///
/// Cloning is cheap and clones share the cached token.
#[derive(Clone, Debug)]
pub struct CanopyClient {
    pub(crate) http: CanopyHttp,
}

impl CanopyClient {
    pub fn builder() -> CanopyClientBuilder {
        CanopyClientBuilder::default()
    }

    /// Client against the default host.
    pub fn new(client_id: &str, client_secret: &str) -> Result<Self, SdkError> {
        Self::builder()
            .client_id(client_id)
            .client_secret(client_secret)
            .build()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn authentication(&self) -> Authentication<'_> {
        Authentication { client: self }
    }

    /// The underlying dispatcher.
    pub fn http(&self) -> &CanopyHttp {
        &self.http
    }

    pub fn host(&self) -> &str {
        self.http.host()
    }

    // ── Dispatch ─────────────────────────────────────────────────────────

    /// Issue one logical call and return the raw envelope.
    pub async fn fire(
        &self,
        method: Method,
        path: &str,
        query: Option<&Query>,
        body: Option<Body>,
    ) -> Result<ResponseEnvelope, SdkError> {
        self.http.fire(method, path, query, body).await
    }

    /// Issue one logical call and deserialize the decoded payload.
    ///
    /// Any error the service reports becomes [`SdkError::Api`]. A missing
    /// payload deserializes from `null`, so `Option<T>` and `()` work for
    /// calls that return no body.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Query>,
        body: Option<Body>,
    ) -> Result<T, SdkError> {
        let payload = self
            .fire(method, path, query, body)
            .await?
            .into_result()
            .map_err(SdkError::Api)?;
        Ok(serde_json::from_value(payload.unwrap_or(Value::Null))?)
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct CanopyClientBuilder {
    host: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for CanopyClientBuilder {
    fn default() -> Self {
        Self {
            host: crate::network::DEFAULT_HOST.to_string(),
            client_id: None,
            client_secret: None,
            timeout: None,
            transport: None,
        }
    }
}

impl CanopyClientBuilder {
    /// Builder seeded from `CANOPY_CLIENT_ID`, `CANOPY_CLIENT_SECRET` and,
    /// when set, `CANOPY_HOST`. Later setters override.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let mut builder = Self::default();
        builder.client_id = var(ENV_CLIENT_ID);
        builder.client_secret = var(ENV_CLIENT_SECRET);
        if let Some(host) = var(ENV_HOST) {
            builder.host = host;
        }
        builder
    }

    /// Host, optionally with a path prefix (`uat.canopyservicing.com/api`).
    /// No scheme: every call uses https.
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn client_id(mut self, client_id: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self
    }

    pub fn client_secret(mut self, client_secret: &str) -> Self {
        self.client_secret = Some(client_secret.to_string());
        self
    }

    /// Deadline for each logical call, covering token acquisition and every
    /// network exchange. Unset by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the default reqwest transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<CanopyClient, SdkError> {
        let host = self
            .host
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_matches('/')
            .to_string();
        if host.is_empty() {
            return Err(SdkError::Validation("host is required".to_string()));
        }
        let client_id = self
            .client_id
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SdkError::Validation("client id is required".to_string()))?;
        let client_secret = self
            .client_secret
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SdkError::Validation("client secret is required".to_string()))?;

        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let tokens = TokenManager::new(Credentials::new(client_id, client_secret));

        Ok(CanopyClient {
            http: CanopyHttp::new(&host, transport, tokens, self.timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_credentials() {
        let err = CanopyClient::builder().client_id("id").build().unwrap_err();
        assert!(matches!(err, SdkError::Validation(msg) if msg.contains("secret")));

        let err = CanopyClient::builder()
            .client_id("")
            .client_secret("s")
            .build()
            .unwrap_err();
        assert!(matches!(err, SdkError::Validation(msg) if msg.contains("client id")));
    }

    #[test]
    fn test_build_defaults() {
        let client = CanopyClient::new("id", "secret").unwrap();
        assert_eq!(client.host(), "api.canopyservicing.com");
        assert!(client.http().timeout().is_none());
        assert_eq!(client.http().tokens().client_id(), "id");
    }

    #[test]
    fn test_build_normalizes_host() {
        let client = CanopyClient::builder()
            .host("https://uat.canopyservicing.com/api/")
            .client_id("id")
            .client_secret("secret")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(client.host(), "uat.canopyservicing.com/api");
        assert_eq!(client.http().timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_setters_override_env() {
        let client = CanopyClientBuilder::from_env()
            .client_id("explicit-id")
            .client_secret("explicit-secret")
            .build()
            .unwrap();
        assert_eq!(client.http().tokens().client_id(), "explicit-id");
    }
}

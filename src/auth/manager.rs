//! Token manager — the client's single cached bearer token.

use std::sync::atomic::{AtomicU64, Ordering};

use async_lock::{Mutex, RwLock};
use reqwest::Method;
use tracing;

use crate::auth::{AccessToken, Credentials, TokenRequest, TokenResponse};
use crate::error::{AuthError, SdkError};
use crate::http::request::Body;
use crate::http::CanopyHttp;
use crate::network::TOKEN_PATH;

/// Owns the cached token for one client instance.
///
/// Fetches are single-flight: concurrent callers that find no token wait for
/// one exchange instead of each running their own. Reads of a cached token
/// never wait on a fetch in progress elsewhere.
pub struct TokenManager {
    credentials: Credentials,
    token: RwLock<Option<AccessToken>>,
    refresh: Mutex<()>,
    invalidations: AtomicU64,
}

impl TokenManager {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            token: RwLock::new(None),
            refresh: Mutex::new(()),
            invalidations: AtomicU64::new(0),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    /// The cached token, if any. No freshness check.
    pub async fn current(&self) -> Option<AccessToken> {
        self.token.read().await.clone()
    }

    /// How many times a cached token has been dropped.
    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }

    /// Drop the cached token. Safe to call with nothing cached.
    pub async fn invalidate(&self) {
        if self.token.write().await.take().is_some() {
            self.invalidations.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(client_id = %self.client_id(), "access token invalidated");
        }
    }

    /// The cached token, fetching and caching one first if there is none.
    pub async fn ensure(&self, http: &CanopyHttp) -> Result<AccessToken, AuthError> {
        if let Some(token) = self.current().await {
            return Ok(token);
        }

        let _guard = self.refresh.lock().await;
        // filled by whoever held the guard before us
        if let Some(token) = self.current().await {
            return Ok(token);
        }

        let token = self.fetch(http).await?;
        *self.token.write().await = Some(token.clone());
        Ok(token)
    }

    /// Replace `stale` with a fresh token.
    ///
    /// If another call already swapped `stale` out, its replacement is returned
    /// without a second invalidation or fetch.
    pub async fn refresh(
        &self,
        http: &CanopyHttp,
        stale: Option<&AccessToken>,
    ) -> Result<AccessToken, AuthError> {
        {
            let _guard = self.refresh.lock().await;
            match self.current().await {
                Some(current) if Some(&current) != stale => return Ok(current),
                Some(_) => self.invalidate().await,
                None => {}
            }
        }
        self.ensure(http).await
    }

    /// Exchange the credentials for a new token. Does not touch the cache.
    ///
    /// This is the one call sent without Authorization, so it never goes
    /// through [`ensure`](Self::ensure).
    pub async fn fetch(&self, http: &CanopyHttp) -> Result<AccessToken, AuthError> {
        tracing::debug!(client_id = %self.client_id(), "fetching access token");

        let body = serde_json::to_value(TokenRequest::from(&self.credentials))
            .map_err(|e| AuthError::Exchange(e.to_string()))?;
        let envelope = http
            .fire_unauthenticated(Method::POST, TOKEN_PATH, None, Some(Body::Json(body)))
            .await
            .map_err(|e| match e {
                SdkError::Auth(auth) => auth,
                other => AuthError::Exchange(other.to_string()),
            })?;

        if let Some(mut error) = envelope.error() {
            if error.is_blank() {
                error.message = Some(format!(
                    "token request failed with status {}",
                    envelope.status
                ));
            }
            tracing::warn!(status = envelope.status, code = ?error.code, "token request rejected");
            return Err(AuthError::Rejected {
                status: envelope.status,
                error,
            });
        }

        let response: TokenResponse = envelope
            .payload
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| AuthError::Exchange(e.to_string()))?
            .ok_or(AuthError::MissingToken)?;

        match response.access_token {
            Some(token) if !token.is_empty() => Ok(AccessToken::new(token)),
            _ => Err(AuthError::MissingToken),
        }
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("invalidations", &self.invalidations())
            .finish_non_exhaustive()
    }
}

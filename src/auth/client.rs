//! Authentication sub-client — check, reset and fetch the bearer token.

use crate::auth::AccessToken;
use crate::client::CanopyClient;
use crate::error::SdkError;

/// Sub-client for token operations.
pub struct Authentication<'a> {
    pub(crate) client: &'a CanopyClient,
}

impl<'a> Authentication<'a> {
    /// Return the cached token, fetching one first if there is none.
    ///
    /// No expiry check is made; only the service can say a token is stale.
    pub async fn check_token(&self) -> Result<AccessToken, SdkError> {
        self.client.http.ensure_token().await
    }

    /// Force a refetch: drop the cached token, then fetch and cache a new one.
    pub async fn reset_token(&self) -> Result<AccessToken, SdkError> {
        self.client.http.reset_token().await
    }

    /// Exchange the credentials for a token without caching it.
    pub async fn get_token(&self) -> Result<AccessToken, SdkError> {
        self.client.http.fetch_token().await
    }

    /// Whether a token is currently cached.
    pub async fn has_token(&self) -> bool {
        self.client.http.tokens().current().await.is_some()
    }

    /// Drop the cached token without fetching another.
    pub async fn invalidate(&self) {
        self.client.http.tokens().invalidate().await;
    }
}

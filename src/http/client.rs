//! Low-level dispatcher — `CanopyHttp`.
//!
//! One logical call is a bounded run of attempts:
//!
//! ```text
//! Attempt(1) ─► Done(..)                        common case
//!     │ 403 not_authorized: invalidate + refetch
//!     ▼
//! Attempt(2) ─► Done(..)
//!     │ 403 not_authorized: invalidate + refetch
//!     ▼
//! Attempt(3) ─► Done(..)                        403 again: returned as is
//! ```
//!
//! Only the stale-token condition is retried. Transport failures, auth
//! failures and every other status end the call on the attempt that saw them.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use tracing;

use crate::auth::{AccessToken, TokenManager};
use crate::error::{HttpError, SdkError};
use crate::http::deadline::Deadline;
use crate::http::request::{is_token_exchange, Body, PreparedRequest, Query};
use crate::http::response::ResponseEnvelope;
use crate::http::transport::Transport;

/// Total attempts per logical call, first one included.
pub const MAX_ATTEMPTS: u32 = 3;

/// Where a logical call stands.
#[derive(Debug)]
enum DispatchState {
    Attempt(u32),
    Done(Result<ResponseEnvelope, SdkError>),
}

/// Authenticated dispatcher for the Canopy REST API.
#[derive(Clone)]
pub struct CanopyHttp {
    host: String,
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenManager>,
    timeout: Option<Duration>,
}

impl CanopyHttp {
    pub fn new(
        host: &str,
        transport: Arc<dyn Transport>,
        tokens: TokenManager,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            transport,
            tokens: Arc::new(tokens),
            timeout,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    // ── Token lifecycle ──────────────────────────────────────────────────

    /// Cached token, fetched first if needed.
    pub async fn ensure_token(&self) -> Result<AccessToken, SdkError> {
        let deadline = Deadline::after(self.timeout);
        Ok(deadline.run(self.tokens.ensure(self)).await??)
    }

    /// Drop the cached token and fetch a new one.
    pub async fn reset_token(&self) -> Result<AccessToken, SdkError> {
        self.tokens.invalidate().await;
        self.ensure_token().await
    }

    /// Run the credential exchange without caching the result.
    pub async fn fetch_token(&self) -> Result<AccessToken, SdkError> {
        let deadline = Deadline::after(self.timeout);
        Ok(deadline.run(self.tokens.fetch(self)).await??)
    }

    // ── Dispatch ─────────────────────────────────────────────────────────

    /// Issue one logical call.
    ///
    /// `Err` for transport failures, timeouts and failed token acquisition.
    /// Every response from the service, error statuses included, comes back as
    /// an `Ok` envelope with its payload in caller convention.
    pub async fn fire(
        &self,
        method: Method,
        path: &str,
        query: Option<&Query>,
        body: Option<Body>,
    ) -> Result<ResponseEnvelope, SdkError> {
        let authenticate = !is_token_exchange(&method, path);
        let template = PreparedRequest::new(&self.host, method, path, query, body.as_ref())?;
        let deadline = Deadline::after(self.timeout);

        if !authenticate {
            return Ok(self.exchange(template.attempt(None), &deadline).await?);
        }

        let mut state = DispatchState::Attempt(1);
        loop {
            state = match state {
                DispatchState::Attempt(n) => self.attempt(n, &template, &deadline).await,
                DispatchState::Done(result) => return result,
            };
        }
    }

    /// Single exchange with no Authorization and no retry. Used for the
    /// credential exchange.
    pub async fn fire_unauthenticated(
        &self,
        method: Method,
        path: &str,
        query: Option<&Query>,
        body: Option<Body>,
    ) -> Result<ResponseEnvelope, SdkError> {
        let template = PreparedRequest::new(&self.host, method, path, query, body.as_ref())?;
        let deadline = Deadline::after(self.timeout);
        Ok(self.exchange(template.attempt(None), &deadline).await?)
    }

    async fn attempt(
        &self,
        n: u32,
        template: &PreparedRequest,
        deadline: &Deadline,
    ) -> DispatchState {
        let token = match deadline.run(self.tokens.ensure(self)).await {
            Ok(Ok(token)) => token,
            Ok(Err(e)) => return DispatchState::Done(Err(e.into())),
            Err(e) => return DispatchState::Done(Err(e.into())),
        };

        let envelope = match self.exchange(template.attempt(Some(&token)), deadline).await {
            Ok(envelope) => envelope,
            Err(e) => return DispatchState::Done(Err(e.into())),
        };

        if !envelope.is_stale_authorization() {
            return DispatchState::Done(Ok(envelope));
        }
        if n >= MAX_ATTEMPTS {
            tracing::warn!(
                attempts = n,
                url = %template.url,
                "Access token still rejected, giving up"
            );
            return DispatchState::Done(Ok(envelope));
        }

        tracing::warn!(attempt = n, url = %template.url, "Access token rejected, refreshing");
        match deadline.run(self.tokens.refresh(self, Some(&token))).await {
            Ok(Ok(_)) => DispatchState::Attempt(n + 1),
            Ok(Err(e)) => DispatchState::Done(Err(e.into())),
            Err(e) => DispatchState::Done(Err(e.into())),
        }
    }

    async fn exchange(
        &self,
        request: PreparedRequest,
        deadline: &Deadline,
    ) -> Result<ResponseEnvelope, HttpError> {
        tracing::debug!(method = %request.method, url = %request.url, "Sending request");

        let raw = deadline.run(self.transport.execute(request)).await??;
        tracing::debug!(status = raw.status, bytes = raw.body.len(), "Received response");

        Ok(ResponseEnvelope::from_wire(raw.status, &raw.body))
    }
}

impl std::fmt::Debug for CanopyHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanopyHttp")
            .field("host", &self.host)
            .field("tokens", &self.tokens)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

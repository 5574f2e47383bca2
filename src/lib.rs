//! # Canopy SDK
//!
//! A Rust client for the Canopy Servicing lending API.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core** — Key casing, emptiness helpers, error types (always available)
//! 2. **Auth** — Credentials, the bearer token, `TokenManager`
//! 3. **HTTP** — Request builder, response normalizer, `CanopyHttp` dispatcher
//!    with transparent recovery from a stale token
//! 4. **High-Level Client** — `CanopyClient` with its builder and sub-clients
//!
//! Callers speak camelCase (`startingAfter`); the wire speaks snake_case
//! (`starting_after`). Every outbound body and query key and every inbound
//! body is converted at the dispatcher boundary.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use canopy_sdk::prelude::*;
//!
//! let client = CanopyClient::builder()
//!     .client_id("54321dcba77884")
//!     .client_secret("4433221")
//!     .build()?;
//!
//! let query = Query::new().with("limit", 25).with("startingAfter", None::<String>);
//! let page = client.fire(Method::GET, "customers", Some(&query), None).await?;
//! match page.error() {
//!     None => println!("{:?} / {:?}", page.payload, page.paging()),
//!     Some(err) => eprintln!("{err}"),
//! }
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Key casing and emptiness helpers.
pub mod shared;

/// Unified SDK error types.
pub mod error;

/// Host, header and path constants.
pub mod network;

// ── Layer 2: Auth ────────────────────────────────────────────────────────────

/// Credentials, access token, token lifecycle.
pub mod auth;

// ── Layer 3: HTTP ────────────────────────────────────────────────────────────

/// Request building, response normalization, dispatch with token refresh.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 4: High-Level Client ───────────────────────────────────────────────

/// `CanopyClient` — the primary entry point.
#[cfg(feature = "http")]
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Core
    pub use crate::shared::case::{decode, encode};
    pub use crate::shared::{is_empty, remove_empty};

    // Errors
    pub use crate::error::{
        AuthError, CanopyError, CanopyErrorDetail, ErrorKind, HttpError, SdkError,
    };

    // Network
    pub use crate::network::{DEFAULT_HOST, NOT_AUTHORIZED};

    // Auth
    pub use crate::auth::{AccessToken, Credentials};
    #[cfg(feature = "http")]
    pub use crate::auth::TokenManager;

    // HTTP
    #[cfg(feature = "http")]
    pub use crate::http::{
        Body, CanopyHttp, Method, MultipartForm, PagingInfo, Query, QueryValue,
        ResponseEnvelope, Transport,
    };

    // Client + sub-clients
    #[cfg(feature = "http")]
    pub use crate::client::{AuthenticationClient, CanopyClient, CanopyClientBuilder};
}

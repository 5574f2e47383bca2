//! Network constants for the Canopy SDK.

/// Default API host. May carry a path prefix, e.g. `uat.canopyservicing.com/api`.
pub const DEFAULT_HOST: &str = "api.canopyservicing.com";

/// Scheme used for every call. Not configurable.
pub const PROTOCOL: &str = "https";

/// Version of this client, sent with every request.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header carrying [`CLIENT_VERSION`].
pub const CLIENT_VERSION_HEADER: &str = "X-Client-Ver";

/// Resource path of the credential exchange.
pub const TOKEN_PATH: &str = "auth/token";

/// Error code the service returns (with a 403) when the bearer token is stale.
pub const NOT_AUTHORIZED: &str = "not_authorized";

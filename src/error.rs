//! Unified SDK error types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// `extra` key holding the `type` a service detail reported for itself.
pub const DETAIL_TYPE_KEY: &str = "detailType";

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Canopy error: {0}")]
    Api(CanopyError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl SdkError {
    /// The uniform error shape for this failure, where one applies.
    ///
    /// Transport failures have no payload and return `None`.
    pub fn canopy_error(&self) -> Option<CanopyError> {
        match self {
            SdkError::Api(e) => Some(e.clone()),
            SdkError::Auth(e) => Some(e.canopy_error()),
            SdkError::Validation(msg) | SdkError::Other(msg) => Some(CanopyError::client(msg)),
            _ => None,
        }
    }
}

/// Failures of the network exchange itself. Never retried.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Timeout")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Could not encode request body: {0}")]
    Encode(serde_json::Error),
}

/// Failures of the credential exchange.
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    #[error("Token request rejected with status {status}: {error}")]
    Rejected { status: u16, error: CanopyError },

    #[error("Token response did not carry an access token")]
    MissingToken,

    #[error("Token request failed: {0}")]
    Exchange(String),
}

impl AuthError {
    /// Always a `type: "canopy"` error: the server's detail when it sent one,
    /// otherwise a locally written message.
    pub fn canopy_error(&self) -> CanopyError {
        match self {
            AuthError::Rejected { error, .. } => error.clone(),
            other => CanopyError {
                message: Some(other.to_string()),
                ..CanopyError::empty(ErrorKind::Canopy)
            },
        }
    }
}

/// Where a [`CanopyError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Reported by the service.
    Canopy,
    /// Synthesized by calling code.
    Client,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Canopy => "canopy",
            Self::Client => "client",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The uniform error shape handed to callers, in caller convention.
///
/// Fields outside the standard set (from malformed or non-standard error
/// bodies) are kept in `extra` and serialized alongside the named ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanopyError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<CanopyErrorDetail>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of a schema-validation failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanopyErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CanopyError {
    fn empty(kind: ErrorKind) -> Self {
        Self {
            kind,
            code: None,
            message: None,
            help_url: None,
            details: None,
            extra: Map::new(),
        }
    }

    /// Build a service-reported error from a decoded (caller convention) detail.
    ///
    /// Standard fields land in their named slots. Anything else, including
    /// standard keys whose values have an unexpected shape, is kept in `extra`.
    /// The detail's own `type` moves to `extra` under [`DETAIL_TYPE_KEY`].
    /// A bare string detail becomes the message.
    pub fn canopy(detail: Value) -> Self {
        let mut error = Self::empty(ErrorKind::Canopy);
        let map = match detail {
            Value::Object(map) => map,
            Value::String(message) => {
                error.message = Some(message);
                return error;
            }
            _ => return error,
        };

        for (key, value) in map {
            if key == "type" {
                if !value.is_null() {
                    tracing::debug!(reported = %value, "keeping service error type as detailType");
                    error.extra.insert(DETAIL_TYPE_KEY.to_string(), value);
                }
                continue;
            }
            let unplaced = match (key.as_str(), &value) {
                ("code" | "message" | "helpUrl" | "details", Value::Null) => false,
                ("code", Value::String(s)) => {
                    error.code = Some(s.clone());
                    false
                }
                ("message", Value::String(s)) => {
                    error.message = Some(s.clone());
                    false
                }
                ("helpUrl", Value::String(s)) => {
                    error.help_url = Some(s.clone());
                    false
                }
                ("details", Value::Array(items)) => match parse_details(items) {
                    Some(details) => {
                        error.details = Some(details);
                        false
                    }
                    None => true,
                },
                _ => true,
            };
            if unplaced {
                error.extra.insert(key, value);
            }
        }
        error
    }

    /// No code, message, details or extra fields: nothing the caller can act on.
    pub fn is_blank(&self) -> bool {
        self.code.is_none()
            && self.message.is_none()
            && self.help_url.is_none()
            && self.details.is_none()
            && self.extra.is_empty()
    }

    /// A locally synthesized error with just a message.
    pub fn client(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::empty(ErrorKind::Client)
        }
    }

    /// Whether this is the service's stale-token signal.
    pub fn is_not_authorized(&self) -> bool {
        self.code.as_deref() == Some(crate::network::NOT_AUTHORIZED)
    }

    fn summary(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(msg)) => format!("[{}] {}: {}", self.kind, code, msg),
            (Some(code), None) => format!("[{}] {}", self.kind, code),
            (None, Some(msg)) => format!("[{}] {}", self.kind, msg),
            (None, None) if !self.extra.is_empty() => {
                format!("[{}] {}", self.kind, Value::Object(self.extra.clone()))
            }
            (None, None) => format!("[{}] unknown error", self.kind),
        }
    }
}

impl std::fmt::Display for CanopyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.summary())
    }
}

impl std::error::Error for CanopyError {}

fn parse_details(items: &[Value]) -> Option<Vec<CanopyErrorDetail>> {
    items
        .iter()
        .map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

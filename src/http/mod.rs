//! HTTP layer — request builder, response normalizer, transport and the
//! retrying dispatcher `CanopyHttp`.

pub mod client;
pub mod deadline;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{CanopyHttp, MAX_ATTEMPTS};
pub use deadline::Deadline;
pub use request::{Body, MultipartForm, PreparedRequest, Query, QueryValue};
pub use response::{PagingInfo, ResponseEnvelope};
pub use transport::{RawResponse, ReqwestTransport, Transport};

/// Re-exported so callers need not depend on `reqwest` directly.
pub use reqwest::Method;

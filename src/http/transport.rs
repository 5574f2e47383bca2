//! The network seam. Everything above it is transport-agnostic, so tests drive
//! the dispatcher with an in-memory transport.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::HttpError;
use crate::http::request::{PreparedBody, PreparedRequest};

/// Status and undecoded body of one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Performs one network exchange.
///
/// An `Err` means the exchange itself failed (no response to decode). Any
/// HTTP status, including 4xx and 5xx, is an `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: PreparedRequest) -> Result<RawResponse, HttpError>;
}

/// Default transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, HttpError> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// Use a caller-configured client (proxies, TLS roots, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: PreparedRequest) -> Result<RawResponse, HttpError> {
        let mut req = self.client.request(request.method, request.url);
        for (name, value) in request.headers {
            req = req.header(name, value);
        }

        req = match request.body {
            PreparedBody::Empty => req,
            PreparedBody::Json(bytes) => req.body(bytes),
            // reqwest sets the multipart Content-Type with its boundary
            PreparedBody::Multipart(form) => req.multipart(form.to_reqwest()?),
        };

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();

        Ok(RawResponse { status, body })
    }
}

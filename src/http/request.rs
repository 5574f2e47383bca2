//! Request construction — URL, query string, headers and body for one call.
//!
//! A [`PreparedRequest`] is built once per logical call. Each attempt takes a
//! copy through [`PreparedRequest::attempt`], which is the only place the
//! `Authorization` header is attached, since the token may have just been
//! refreshed.

use reqwest::{Method, Url};
use serde_json::Value;

use crate::auth::AccessToken;
use crate::error::HttpError;
use crate::network::{CLIENT_VERSION, CLIENT_VERSION_HEADER, PROTOCOL, TOKEN_PATH};
use crate::shared::case;

// ============================================================================
// Query
// ============================================================================

/// A single query-string value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
    /// Never sent. What `None` converts into.
    Absent,
}

impl QueryValue {
    /// Whether the value goes on the wire.
    ///
    /// Falsy-but-meaningful values (`false`, `0`, `""`) and every list, even an
    /// empty one, are kept. Only absent values and `NaN` are dropped.
    pub fn is_present(&self) -> bool {
        match self {
            QueryValue::Absent => false,
            QueryValue::Float(f) => !f.is_nan(),
            _ => true,
        }
    }

    /// String form as sent on the wire. Lists are comma-joined.
    pub fn render(&self) -> String {
        match self {
            QueryValue::Str(s) => s.clone(),
            QueryValue::Int(i) => i.to_string(),
            QueryValue::UInt(u) => u.to_string(),
            QueryValue::Float(f) if f.is_infinite() => {
                let sign = if *f > 0.0 { "" } else { "-" };
                format!("{}Infinity", sign)
            }
            QueryValue::Float(f) => f.to_string(),
            QueryValue::Bool(b) => b.to_string(),
            QueryValue::List(items) => items.join(","),
            QueryValue::Absent => String::new(),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        QueryValue::Str(v.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        QueryValue::Str(v)
    }
}

impl From<&String> for QueryValue {
    fn from(v: &String) -> Self {
        QueryValue::Str(v.clone())
    }
}

impl From<i32> for QueryValue {
    fn from(v: i32) -> Self {
        QueryValue::Int(v.into())
    }
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        QueryValue::Int(v)
    }
}

impl From<u32> for QueryValue {
    fn from(v: u32) -> Self {
        QueryValue::UInt(v.into())
    }
}

impl From<u64> for QueryValue {
    fn from(v: u64) -> Self {
        QueryValue::UInt(v)
    }
}

impl From<f64> for QueryValue {
    fn from(v: f64) -> Self {
        QueryValue::Float(v)
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        QueryValue::Bool(v)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(v: Vec<String>) -> Self {
        QueryValue::List(v)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(v: Vec<&str>) -> Self {
        QueryValue::List(v.into_iter().map(str::to_string).collect())
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(QueryValue::Absent)
    }
}

/// Flat query mapping in caller convention. Insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    params: Vec<(String, QueryValue)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// The pairs that go on the wire: present values only, keys in wire
    /// convention, values stringified.
    pub fn wire_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .filter(|(_, v)| v.is_present())
            .map(|(k, v)| (case::to_snake_case(k), v.render()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Query::new();
        for (k, v) in iter {
            query.insert(k, v);
        }
        query
    }
}

// ============================================================================
// Body
// ============================================================================

/// Request body as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Object or array in caller convention. Keys are rewritten to wire
    /// convention and the result sent as JSON.
    Json(Value),
    /// Sent untouched; the transport supplies the boundary and content type.
    Multipart(MultipartForm),
}

impl From<Value> for Body {
    fn from(v: Value) -> Self {
        Body::Json(v)
    }
}

impl From<MultipartForm> for Body {
    fn from(v: MultipartForm) -> Self {
        Body::Multipart(v)
    }
}

/// A multipart form for file-bearing calls.
///
/// Kept as plain data so every attempt can resend the whole form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    pub parts: Vec<MultipartPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPart {
    pub name: String,
    pub data: PartData,
}

#[derive(Clone, PartialEq)]
pub enum PartData {
    Text(String),
    File {
        file_name: String,
        bytes: Vec<u8>,
        mime: Option<String>,
    },
}

impl std::fmt::Debug for PartData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartData::Text(t) => f.debug_tuple("Text").field(t).finish(),
            PartData::File { file_name, bytes, mime } => f
                .debug_struct("File")
                .field("file_name", file_name)
                .field("len", &bytes.len())
                .field("mime", mime)
                .finish(),
        }
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            data: PartData::Text(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        mime: Option<&str>,
    ) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            data: PartData::File {
                file_name: file_name.into(),
                bytes,
                mime: mime.map(str::to_string),
            },
        });
        self
    }

    /// Convert into a reqwest form with a fresh boundary.
    pub(crate) fn to_reqwest(&self) -> Result<reqwest::multipart::Form, HttpError> {
        let mut form = reqwest::multipart::Form::new();
        for part in &self.parts {
            form = match &part.data {
                PartData::Text(value) => form.text(part.name.clone(), value.clone()),
                PartData::File { file_name, bytes, mime } => {
                    let mut p = reqwest::multipart::Part::bytes(bytes.clone())
                        .file_name(file_name.clone());
                    if let Some(m) = mime {
                        p = p.mime_str(m)?;
                    }
                    form.part(part.name.clone(), p)
                }
            };
        }
        Ok(form)
    }
}

// ============================================================================
// Prepared request
// ============================================================================

/// Encoded body ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedBody {
    Empty,
    Json(Vec<u8>),
    Multipart(MultipartForm),
}

/// One fully-built request.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
    pub body: PreparedBody,
}

impl PreparedRequest {
    /// Compose URL, query, headers and body. No Authorization yet.
    pub fn new(
        host: &str,
        method: Method,
        path: &str,
        query: Option<&Query>,
        body: Option<&Body>,
    ) -> Result<Self, HttpError> {
        let url = build_url(host, path, query)?;

        let mut headers = vec![
            ("Accept", "application/json".to_string()),
            (CLIENT_VERSION_HEADER, CLIENT_VERSION.to_string()),
        ];

        let body = match body {
            Some(Body::Multipart(form)) => PreparedBody::Multipart(form.clone()),
            Some(Body::Json(Value::Null)) | None => PreparedBody::Empty,
            Some(Body::Json(value)) => {
                let encoded = case::encode(value.clone());
                PreparedBody::Json(serde_json::to_vec(&encoded).map_err(HttpError::Encode)?)
            }
        };
        if !matches!(body, PreparedBody::Multipart(_)) {
            headers.push(("Content-Type", "application/json".to_string()));
        }

        Ok(Self { method, url, headers, body })
    }

    /// A copy for one attempt, carrying the bearer token when given one.
    pub fn attempt(&self, token: Option<&AccessToken>) -> PreparedRequest {
        let mut request = self.clone();
        if let Some(token) = token {
            request
                .headers
                .push(("Authorization", format!("Bearer {}", token.as_str())));
        }
        request
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Whether this call is the credential exchange, the one call sent without
/// Authorization.
pub fn is_token_exchange(method: &Method, path: &str) -> bool {
    *method == Method::POST && path.trim_matches('/') == TOKEN_PATH
}

/// `https://` + host joined with path, plus the filtered query string.
pub fn build_url(host: &str, path: &str, query: Option<&Query>) -> Result<Url, HttpError> {
    let joined = join_path(host, path);
    let mut url = Url::parse(&format!("{}://{}", PROTOCOL, joined))
        .map_err(|e| HttpError::InvalidUrl(format!("{}: {}", joined, e)))?;

    let pairs = query.map(Query::wire_pairs).unwrap_or_default();
    if !pairs.is_empty() {
        let mut serializer = url.query_pairs_mut();
        for (k, v) in &pairs {
            serializer.append_pair(k, v);
        }
    }
    Ok(url)
}

/// Slash-normalizing join: duplicate separators collapse, `.` segments vanish
/// and `..` climbs one segment (never above the host).
fn join_path(host: &str, path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in host.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.len() > 1 {
                    segments.pop();
                }
            }
            s => segments.push(s),
        }
    }
    let mut joined = segments.join("/");
    if path.ends_with('/') && segments.len() > 1 {
        joined.push('/');
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_presence_filter() {
        let query = Query::new()
            .with("a", None::<String>)
            .with("b", QueryValue::Absent)
            .with("c", false)
            .with("d", 0)
            .with("e", "")
            .with("f", "x")
            .with("g", Vec::<String>::new());

        let kept: Vec<String> = query.wire_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(kept, vec!["c", "d", "e", "f", "g"]);
    }

    #[test]
    fn test_query_nan_dropped() {
        let query = Query::new().with("rate", f64::NAN).with("limit", 2.5);
        assert_eq!(query.wire_pairs(), vec![("limit".to_string(), "2.5".to_string())]);
    }

    #[test]
    fn test_query_rendering() {
        assert_eq!(QueryValue::from(1.0).render(), "1");
        assert_eq!(QueryValue::from(-3).render(), "-3");
        assert_eq!(QueryValue::from(true).render(), "true");
        assert_eq!(QueryValue::from(vec!["a", "b"]).render(), "a,b");
        assert_eq!(QueryValue::from(f64::INFINITY).render(), "Infinity");
    }

    #[test]
    fn test_query_keys_to_wire_convention() {
        let query = Query::new().with("startingAfter", "acct_1").with("limit", 10u32);
        assert_eq!(
            query.wire_pairs(),
            vec![
                ("starting_after".to_string(), "acct_1".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_insert_replaces() {
        let mut query = Query::new().with("limit", 10);
        query.insert("limit", 20);
        assert_eq!(query.get("limit"), Some(&QueryValue::Int(20)));
        assert_eq!(query.wire_pairs().len(), 1);
    }

    #[test]
    fn test_build_url() {
        let url = build_url("api.canopyservicing.com", "accounts/123", None).unwrap();
        assert_eq!(url.as_str(), "https://api.canopyservicing.com/accounts/123");

        let url = build_url("uat.canopyservicing.com/api/", "/customers", None).unwrap();
        assert_eq!(url.as_str(), "https://uat.canopyservicing.com/api/customers");

        let query = Query::new().with("searchTerm", "a b&c").with("skip", None::<i64>);
        let url = build_url("api.canopyservicing.com", "customers", Some(&query)).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.canopyservicing.com/customers?search_term=a+b%26c"
        );
    }

    #[test]
    fn test_build_url_without_present_params_has_no_query() {
        let query = Query::new().with("skip", None::<i64>);
        let url = build_url("api.canopyservicing.com", "customers", Some(&query)).unwrap();
        assert!(url.query().is_none());
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("h.com", "a//b/./c"), "h.com/a/b/c");
        assert_eq!(join_path("h.com/api", "../x"), "h.com/x");
        assert_eq!(join_path("h.com", "../../x"), "h.com/x");
        assert_eq!(join_path("h.com", "a/"), "h.com/a/");
    }

    #[test]
    fn test_json_body_encoded_with_headers() {
        let body = Body::Json(json!({ "accountId": "a1", "lineItems": [{ "lineItemType": "CHARGE" }] }));
        let req = PreparedRequest::new(
            "api.canopyservicing.com",
            Method::POST,
            "accounts",
            None,
            Some(&body),
        )
        .unwrap();

        let PreparedBody::Json(bytes) = &req.body else {
            panic!("expected a JSON body");
        };
        let sent: Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(sent, json!({ "account_id": "a1", "line_items": [{ "line_item_type": "CHARGE" }] }));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("Accept"), Some("application/json"));
        assert_eq!(req.header(CLIENT_VERSION_HEADER), Some(CLIENT_VERSION));
        assert!(req.header("Authorization").is_none());
    }

    #[test]
    fn test_multipart_body_untouched_without_content_type() {
        let form = MultipartForm::new()
            .text("fileType", "statement")
            .file("file", "s.pdf", vec![1, 2, 3], Some("application/pdf"));
        let req = PreparedRequest::new(
            "api.canopyservicing.com",
            Method::POST,
            "accounts/a1/documents",
            None,
            Some(&Body::Multipart(form.clone())),
        )
        .unwrap();

        assert_eq!(req.body, PreparedBody::Multipart(form));
        assert!(req.header("Content-Type").is_none());
    }

    #[test]
    fn test_null_json_body_sends_nothing() {
        let body = Body::Json(Value::Null);
        let req = PreparedRequest::new("h.com", Method::POST, "accounts", None, Some(&body)).unwrap();
        assert_eq!(req.body, PreparedBody::Empty);

        let empty_object = Body::Json(json!({}));
        let req = PreparedRequest::new("h.com", Method::POST, "accounts", None, Some(&empty_object)).unwrap();
        assert_eq!(req.body, PreparedBody::Json(b"{}".to_vec()));
    }

    #[test]
    fn test_attempt_attaches_bearer() {
        let req = PreparedRequest::new("h.com", Method::GET, "products", None, None).unwrap();
        let token = AccessToken::new("tok-1");

        let with = req.attempt(Some(&token));
        assert_eq!(with.header("authorization"), Some("Bearer tok-1"));

        let without = req.attempt(None);
        assert!(without.header("Authorization").is_none());
        assert_eq!(req.body, PreparedBody::Empty);
    }

    #[test]
    fn test_is_token_exchange() {
        assert!(is_token_exchange(&Method::POST, "auth/token"));
        assert!(is_token_exchange(&Method::POST, "/auth/token"));
        assert!(!is_token_exchange(&Method::GET, "auth/token"));
        assert!(!is_token_exchange(&Method::POST, "auth/token/extra"));
    }
}

//! Response normalization — decode, declutter, extract errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CanopyError;
use crate::network::NOT_AUTHORIZED;
use crate::shared::{case, is_empty, remove_empty};

/// Paging metadata embedded under `paging` in list responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingInfo {
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_before: Option<String>,
}

/// Parse a raw wire body and rewrite its keys to caller convention.
///
/// Empty and non-JSON bodies decode to `None`.
pub fn decode(raw: &[u8]) -> Option<Value> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice::<Value>(raw).ok().map(case::decode)
}

/// Strip empty entries from the `paging` field, leaving everything else as is.
pub fn declutter(decoded: Value) -> Value {
    if is_empty(&decoded) {
        return decoded;
    }
    match decoded {
        Value::Object(mut map) => {
            if let Some(paging) = map.get_mut("paging") {
                if !is_empty(paging) {
                    *paging = remove_empty(paging.take());
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// The uniform error for a decoded payload.
///
/// A non-empty `error` field is the detail; otherwise the whole payload is.
pub fn extract_error(decoded: &Value) -> CanopyError {
    match decoded.get("error") {
        Some(detail) if !is_empty(detail) => CanopyError::canopy(detail.clone()),
        _ => CanopyError::canopy(decoded.clone()),
    }
}

/// Status plus decoded payload of one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub status: u16,
    /// Caller convention. `None` when the body was empty or not JSON.
    pub payload: Option<Value>,
}

impl ResponseEnvelope {
    /// Decode and declutter a raw body.
    pub fn from_wire(status: u16, raw: &[u8]) -> Self {
        Self {
            status,
            payload: decode(raw).map(declutter),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn error_field(&self) -> Option<&Value> {
        self.payload
            .as_ref()
            .and_then(|p| p.get("error"))
            .filter(|e| !is_empty(e))
    }

    /// `None` for a clean success. Otherwise the extracted error: any non-2xx
    /// status, or a 2xx whose payload carries a non-empty `error`.
    pub fn error(&self) -> Option<CanopyError> {
        if self.is_success() && self.error_field().is_none() {
            return None;
        }
        Some(extract_error(self.payload.as_ref().unwrap_or(&Value::Null)))
    }

    /// 403 with the `not_authorized` code: the bearer token went stale.
    pub fn is_stale_authorization(&self) -> bool {
        self.status == 403
            && self
                .error_field()
                .and_then(|e| e.get("code"))
                .and_then(Value::as_str)
                == Some(NOT_AUTHORIZED)
    }

    /// Decoded paging metadata, if the payload has any.
    pub fn paging(&self) -> Option<PagingInfo> {
        let paging = self.payload.as_ref()?.get("paging")?;
        serde_json::from_value(paging.clone()).ok()
    }

    /// Payload on success, extracted error otherwise.
    pub fn into_result(self) -> Result<Option<Value>, CanopyError> {
        match self.error() {
            Some(error) => Err(error),
            None => Ok(self.payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_decode_to_caller_convention() {
        let raw = br#"{"access_token":"abc","expires_in":3600,"scopes":[{"scope_name":"all"}]}"#;
        assert_eq!(
            decode(raw),
            Some(json!({ "accessToken": "abc", "expiresIn": 3600, "scopes": [{ "scopeName": "all" }] }))
        );
    }

    #[test]
    fn test_decode_empty_or_invalid() {
        assert_eq!(decode(b""), None);
        assert_eq!(decode(b"  \n"), None);
        assert_eq!(decode(b"<html>Bad Gateway</html>"), None);
    }

    #[test]
    fn test_declutter_paging() {
        let decoded = json!({
            "results": [{ "accountId": "a1", "note": "" }],
            "paging": { "hasMore": true, "startingAfter": "", "endingBefore": null },
        });
        let cleaned = declutter(decoded);
        assert_eq!(cleaned["paging"], json!({ "hasMore": true }));
        assert_eq!(cleaned["results"], json!([{ "accountId": "a1", "note": "" }]));
    }

    #[test]
    fn test_declutter_keeps_has_more_false() {
        let cleaned = declutter(json!({ "paging": { "hasMore": false, "endingBefore": "x" } }));
        assert_eq!(cleaned["paging"], json!({ "hasMore": false, "endingBefore": "x" }));
    }

    #[test]
    fn test_declutter_passthrough() {
        assert_eq!(declutter(json!({})), json!({}));
        assert_eq!(declutter(json!([1, 2])), json!([1, 2]));
        assert_eq!(declutter(json!("text")), json!("text"));
        assert_eq!(declutter(Value::Null), Value::Null);
        assert_eq!(declutter(json!({ "paging": {} })), json!({ "paging": {} }));
    }

    #[test]
    fn test_extract_error_precedence() {
        let error = extract_error(&json!({ "error": { "code": "x" }, "other": 1 }));
        assert_eq!(serde_json::to_value(&error).unwrap(), json!({ "type": "canopy", "code": "x" }));

        let error = extract_error(&json!({ "other": 1 }));
        assert_eq!(serde_json::to_value(&error).unwrap(), json!({ "type": "canopy", "other": 1 }));

        let error = extract_error(&json!({ "error": {}, "message": "boom" }));
        assert_eq!(error.message.as_deref(), Some("boom"));
        assert_eq!(error.kind, ErrorKind::Canopy);
    }

    #[test]
    fn test_envelope_error() {
        let ok = ResponseEnvelope::from_wire(200, br#"{"account_id":"a1"}"#);
        assert!(ok.error().is_none());
        assert_eq!(ok.clone().into_result().unwrap(), Some(json!({ "accountId": "a1" })));

        let bad = ResponseEnvelope::from_wire(404, br#"{"other":1}"#);
        assert_eq!(
            serde_json::to_value(bad.error().unwrap()).unwrap(),
            json!({ "type": "canopy", "other": 1 })
        );

        let embedded = ResponseEnvelope::from_wire(200, br#"{"error":{"code":"conflict"}}"#);
        assert_eq!(embedded.error().unwrap().code.as_deref(), Some("conflict"));

        let no_body = ResponseEnvelope::from_wire(502, b"");
        assert_eq!(no_body.payload, None);
        assert_eq!(no_body.error().unwrap().kind, ErrorKind::Canopy);
    }

    #[test]
    fn test_envelope_stale_authorization() {
        let stale = ResponseEnvelope::from_wire(403, br#"{"error":{"code":"not_authorized"}}"#);
        assert!(stale.is_stale_authorization());

        let wrong_status = ResponseEnvelope::from_wire(401, br#"{"error":{"code":"not_authorized"}}"#);
        assert!(!wrong_status.is_stale_authorization());

        let other_code = ResponseEnvelope::from_wire(403, br#"{"error":{"code":"forbidden"}}"#);
        assert!(!other_code.is_stale_authorization());

        let top_level_code = ResponseEnvelope::from_wire(403, br#"{"code":"not_authorized"}"#);
        assert!(!top_level_code.is_stale_authorization());
    }

    #[test]
    fn test_envelope_paging() {
        let page = ResponseEnvelope::from_wire(
            200,
            br#"{"results":[],"paging":{"has_more":true,"starting_after":"c9","ending_before":""}}"#,
        );
        assert_eq!(
            page.paging(),
            Some(PagingInfo {
                has_more: true,
                starting_after: Some("c9".into()),
                ending_before: None,
            })
        );
    }
}

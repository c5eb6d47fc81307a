//! Maps a decoded HTTP request onto an [`InvocationDescriptor`].

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::request::IncomingRequest;
use crate::invocation::descriptor::{InvocationDescriptor, InvocationType, LogType};
use crate::invocation::headers::{X_FUNCTION_NAME, X_LOG_TYPE, X_QUALIFIER};

/// The JSON document a function receives as its event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
    pub cookies: Map<String, Value>,
    pub url: String,
    pub path: String,
    pub protocol: String,
    pub query: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("missing x-FunctionName header")]
    MissingFunctionName,
    #[error("failed to encode request envelope: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Strip every leading and trailing slash, then prepend exactly one.
pub fn normalize_path(raw: &str) -> String {
    format!("/{}", raw.trim_matches('/'))
}

/// Build the envelope sent as the invocation payload.
pub fn request_envelope(req: &IncomingRequest) -> RequestEnvelope {
    RequestEnvelope {
        method: req.method.as_str().to_string(),
        headers: req.header_map(),
        body: req.body.clone(),
        cookies: req.cookies.clone(),
        url: req.original_url.clone(),
        path: normalize_path(&req.path),
        protocol: req.protocol.clone(),
        query: req.query.clone(),
    }
}

/// Build the invocation for `req`. Callers reject requests without a
/// function name before getting here.
pub fn map_request(req: &IncomingRequest) -> Result<InvocationDescriptor, MapError> {
    let function_name = req
        .header(X_FUNCTION_NAME)
        .ok_or(MapError::MissingFunctionName)?;

    let log_type = req
        .header(X_LOG_TYPE)
        .map(LogType::from_header)
        .unwrap_or_default();

    let payload = serde_json::to_vec(&request_envelope(req))?;

    Ok(InvocationDescriptor {
        function_name: function_name.to_string(),
        invocation_type: InvocationType::RequestResponse,
        log_type,
        payload: Bytes::from(payload),
        qualifier: req.header(X_QUALIFIER).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde_json::json;

    fn incoming(req: Request<()>, body: &[u8]) -> IncomingRequest {
        let (parts, ()) = req.into_parts();
        IncomingRequest::from_parts(&parts, body, false).unwrap()
    }

    #[test]
    fn path_always_has_one_leading_slash() {
        assert_eq!(normalize_path("/map-request"), "/map-request");
        assert_eq!(normalize_path("///a/b///"), "/a/b");
        assert_eq!(normalize_path("a/b/"), "/a/b");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn maps_headers_and_payload() {
        let req = Request::builder()
            .method("POST")
            .uri("/map-request?param1=yes&param2=no")
            .header("x-FunctionName", "function-name")
            .header("x-Qualifier", "qualifier")
            .header("x-LogType", "Tail")
            .header("Cookie", "cookie1=12345667")
            .header("content-type", "application/json")
            .body(())
            .unwrap();
        let descriptor = map_request(&incoming(req, br#"{"foo":"bar"}"#)).unwrap();

        assert_eq!(descriptor.function_name, "function-name");
        assert_eq!(descriptor.qualifier.as_deref(), Some("qualifier"));
        assert_eq!(descriptor.log_type, LogType::Tail);
        assert_eq!(descriptor.invocation_type, InvocationType::RequestResponse);

        let envelope: RequestEnvelope = serde_json::from_slice(&descriptor.payload).unwrap();
        assert_eq!(envelope.method, "POST");
        assert_eq!(envelope.body, json!({"foo": "bar"}));
        assert_eq!(envelope.path, "/map-request");
        assert_eq!(envelope.url, "/map-request?param1=yes&param2=no");
        assert_eq!(envelope.query["param1"], "yes");
        assert_eq!(envelope.cookies["cookie1"], "12345667");
        assert_eq!(envelope.headers["x-functionname"], "function-name");
        assert_eq!(envelope.protocol, "http");
    }

    #[test]
    fn defaults_log_type_and_omits_qualifier() {
        let req = Request::builder()
            .uri("/a/b/?a=1&b=2")
            .header("X-FUNCTIONNAME", "fn")
            .body(())
            .unwrap();
        let descriptor = map_request(&incoming(req, b"")).unwrap();

        assert_eq!(descriptor.log_type, LogType::None);
        assert!(descriptor.qualifier.is_none());

        let envelope: RequestEnvelope = serde_json::from_slice(&descriptor.payload).unwrap();
        assert_eq!(envelope.path, "/a/b");
        assert_eq!(envelope.query, json!({"a": "1", "b": "2"}).as_object().cloned().unwrap());
        assert_eq!(envelope.body, json!({}));
    }

    #[test]
    fn missing_function_name_is_an_error() {
        let req = Request::builder().uri("/").body(()).unwrap();
        assert!(matches!(
            map_request(&incoming(req, b"")),
            Err(MapError::MissingFunctionName)
        ));
    }
}

//! Request extraction.
//!
//! # Responsibilities
//! - Read the request id assigned by the request-id layer
//! - Decode the body (JSON or URL-encoded form), cookies and query string
//! - Expose the decoded request as an [`IncomingRequest`] for the mapper
//!
//! # Design Decisions
//! - Unknown content types decode to an empty object rather than failing
//! - Repeated query/form keys collapse into arrays, single keys stay scalar
//! - Cookie values prefixed with `j:` are decoded as JSON when they parse

use std::collections::BTreeMap;

use axum::{
    http::{header, request::Parts, HeaderMap, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
};
use cookie::Cookie;
use http_body_util::LengthLimitError;
use serde_json::{Map, Value};

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request id assigned by the request-id layer, or `unknown`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Errors raised while decoding an incoming request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Request body exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("Failed to read request body: {0}")]
    BodyRead(#[from] axum::Error),
}

impl RequestError {
    /// Classify a body read failure. A length limit tripped anywhere in the
    /// body stack (the limit layer or the buffering read) becomes `TooLarge`.
    pub fn from_body_error(err: axum::Error, limit: usize) -> Self {
        let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
        while let Some(e) = source {
            if e.is::<LengthLimitError>() {
                return RequestError::TooLarge { limit };
            }
            source = e.source();
        }
        RequestError::BodyRead(err)
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = match &self {
            RequestError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            RequestError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RequestError::BodyRead(_) => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

/// A fully decoded HTTP request, ready to be mapped onto an invocation.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Value,
    pub cookies: Map<String, Value>,
    /// Path and query exactly as received.
    pub original_url: String,
    /// Raw request path.
    pub path: String,
    pub protocol: String,
    pub query: Map<String, Value>,
}

impl IncomingRequest {
    /// Decode request parts and a buffered body.
    pub fn from_parts(parts: &Parts, body: &[u8], trust_proxy: bool) -> Result<Self, RequestError> {
        let original_url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        Ok(Self {
            method: parts.method.clone(),
            headers: parts.headers.clone(),
            body: parse_body(&parts.headers, body)?,
            cookies: parse_cookies(&parts.headers),
            original_url,
            path: parts.uri.path().to_string(),
            protocol: protocol(&parts.headers, trust_proxy),
            query: parse_pairs(parts.uri.query().unwrap_or_default().as_bytes()),
        })
    }

    /// Case-insensitive header lookup. Non UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Headers as a flat name → value map. Repeated headers are joined with
    /// `", "`, except `cookie` which is joined with `"; "`.
    pub fn header_map(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for name in self.headers.keys() {
            let separator = if name == header::COOKIE { "; " } else { ", " };
            let joined = self
                .headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(separator);
            out.insert(name.as_str().to_string(), joined);
        }
        out
    }
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let essence = raw.split(';').next().unwrap_or_default().trim();
    Some(essence.to_ascii_lowercase())
}

fn parse_body(headers: &HeaderMap, body: &[u8]) -> Result<Value, RequestError> {
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    match content_type(headers).as_deref() {
        Some("application/json") => Ok(serde_json::from_slice(body)?),
        Some("application/x-www-form-urlencoded") => Ok(Value::Object(parse_pairs(body))),
        _ => Ok(Value::Object(Map::new())),
    }
}

/// Decode `a=1&b=2&a=3` style input. Repeated keys become arrays.
fn parse_pairs(input: &[u8]) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        let value = Value::String(value.into_owned());
        match out.get_mut(&*key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                out.insert(key.into_owned(), value);
            }
        }
    }
    out
}

fn parse_cookies(headers: &HeaderMap) -> Map<String, Value> {
    let mut out = Map::new();
    for raw in headers.get_all(header::COOKIE) {
        let Ok(raw) = raw.to_str() else { continue };
        for cookie in Cookie::split_parse_encoded(raw).flatten() {
            if out.contains_key(cookie.name()) {
                continue;
            }
            out.insert(cookie.name().to_string(), cookie_value(cookie.value()));
        }
    }
    out
}

fn cookie_value(value: &str) -> Value {
    if let Some(json) = value.strip_prefix("j:") {
        if let Ok(decoded) = serde_json::from_str(json) {
            return decoded;
        }
    }
    Value::String(value.to_string())
}

fn protocol(headers: &HeaderMap, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(proto) = forwarded {
            return proto.to_ascii_lowercase();
        }
    }
    "http".to_string()
}

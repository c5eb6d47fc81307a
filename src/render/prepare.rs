//! Processing shared by every view type.

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use cookie::Cookie;
use serde_json::{Map, Value};

use crate::invocation::InvocationResult;
use crate::render::cookies::cookies_from_payload;

/// The parts of a response that do not depend on the view type.
#[derive(Debug, Default)]
pub struct Prepared {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub cookies: Vec<Cookie<'static>>,
    pub redirect: Option<String>,
    /// `body` field of the payload, else the whole payload, else null.
    pub body: Value,
}

/// Decode the payload. Invalid JSON is kept as a string holding the raw text.
pub fn decode_payload(result: &InvocationResult) -> Value {
    match &result.payload {
        None => Value::Null,
        Some(bytes) => serde_json::from_slice(bytes).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Function payload is not valid JSON, passing it through as text");
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }),
    }
}

/// Non-null field of an object payload.
fn field<'a>(payload: &'a Value, name: &str) -> Option<&'a Value> {
    payload.get(name).filter(|v| !v.is_null())
}

fn status_from_value(value: &Value) -> Option<StatusCode> {
    let code = match value {
        Value::Number(n) => u16::try_from(n.as_u64()?).ok()?,
        Value::String(s) => s.trim().parse::<u16>().ok()?,
        _ => return None,
    };
    StatusCode::from_u16(code).ok()
}

/// Resolve the status the client sees.
///
/// A 200 from the transport defers to the payload's `statusCode`; a
/// function error always wins with 500.
pub fn effective_status(result: &InvocationResult, payload: &Value) -> StatusCode {
    if result.function_error.is_some() {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    let transport =
        StatusCode::from_u16(result.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if result.status_code != 200 {
        return transport;
    }

    field(payload, "statusCode")
        .and_then(status_from_value)
        .unwrap_or(transport)
}

fn header_values(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Number(n) => vec![n.to_string()],
        Value::Bool(b) => vec![b.to_string()],
        Value::Array(items) => items.iter().flat_map(header_values).collect(),
        Value::Null | Value::Object(_) => Vec::new(),
    }
}

/// Turn the payload's `headers` object into a header map.
pub fn headers_from_payload(headers: &Map<String, Value>) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            tracing::warn!(header = %name, "Skipping invalid header name from function");
            continue;
        };
        for raw in header_values(value) {
            match HeaderValue::from_str(&raw) {
                Ok(value) => {
                    out.append(name.clone(), value);
                }
                Err(_) => tracing::warn!(header = %name, "Skipping invalid header value from function"),
            }
        }
    }
    out
}

/// Run the steps common to both view types.
pub fn prepare(result: &InvocationResult) -> Prepared {
    let payload = decode_payload(result);
    let status = effective_status(result, &payload);

    let headers = match field(&payload, "headers") {
        Some(Value::Object(map)) if !map.is_empty() => headers_from_payload(map),
        _ => HeaderMap::new(),
    };

    let cookies = match field(&payload, "cookies") {
        Some(Value::Array(entries)) if !entries.is_empty() => cookies_from_payload(entries),
        _ => Vec::new(),
    };

    let redirect = field(&payload, "redirect").map(|target| match target {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });

    let body = match field(&payload, "body").cloned() {
        Some(body) => body,
        None => payload,
    };

    Prepared {
        status,
        headers,
        cookies,
        redirect,
        body,
    }
}

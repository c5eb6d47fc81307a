//! Response rendering.
//!
//! # Data Flow
//! ```text
//! Result<InvocationResult, TransportError>
//!     → transport error? 500 with the error as body
//!     → prepare (decode payload, effective status, headers, cookies, redirect)
//!     → ViewType::Default (envelope.rs) | ViewType::Simple (raw body)
//!     → RenderedResponse → axum Response
//! ```
//!
//! # Design Decisions
//! - The mode is chosen per request by `x-ViewType`; unknown values render as `Default`
//! - `functionError` forces a 500 but headers and cookies are still applied
//! - A `redirect` field short-circuits body rendering in both modes

pub mod cookies;
pub mod envelope;
pub mod prepare;

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use cookie::Cookie;
use serde_json::Value;

use crate::invocation::{InvocationResult, TransportError};
use self::prepare::{prepare, Prepared};

/// Which response shape to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewType {
    /// `{StatusCode, FunctionError, LogResult, Payload}` envelope.
    #[default]
    Default,
    /// The function's body, unwrapped.
    Simple,
}

impl ViewType {
    /// Parse an `x-ViewType` value; anything unrecognised is `Default`.
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("simple") => ViewType::Simple,
            _ => ViewType::Default,
        }
    }

    fn render_body(self, prepared: Prepared, result: &InvocationResult) -> Value {
        match self {
            ViewType::Default => envelope::envelope(result, prepared.body),
            ViewType::Simple => prepared.body,
        }
    }
}

/// What ends up on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedBody {
    Json(Value),
    Redirect(String),
}

/// A response fully determined by the invocation outcome and the view type.
#[derive(Debug, Clone)]
pub struct RenderedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub cookies: Vec<Cookie<'static>>,
    pub body: RenderedBody,
}

impl RenderedResponse {
    /// Value of a rendered response header, if set.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The JSON body, unless this is a redirect.
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            RenderedBody::Json(value) => Some(value),
            RenderedBody::Redirect(_) => None,
        }
    }
}

/// Render the outcome of one invocation.
pub fn render(view: ViewType, outcome: Result<InvocationResult, TransportError>) -> RenderedResponse {
    let result = match outcome {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(error = %err, "Lambda invocation failed");
            return RenderedResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                headers: HeaderMap::new(),
                cookies: Vec::new(),
                body: RenderedBody::Json(
                    serde_json::to_value(&err).unwrap_or_else(|_| Value::String(err.to_string())),
                ),
            };
        }
    };

    let mut prepared = prepare(&result);
    let status = prepared.status;
    let headers = std::mem::take(&mut prepared.headers);
    let cookies = std::mem::take(&mut prepared.cookies);

    let body = match prepared.redirect.take() {
        Some(target) => RenderedBody::Redirect(target),
        None => RenderedBody::Json(view.render_body(prepared, &result)),
    };

    RenderedResponse {
        status,
        headers,
        cookies,
        body,
    }
}

impl IntoResponse for RenderedResponse {
    fn into_response(self) -> Response {
        let mut response = match &self.body {
            RenderedBody::Json(value) => Json(value).into_response(),
            RenderedBody::Redirect(target) => {
                let reason = self.status.canonical_reason().unwrap_or("Redirecting");
                format!("{reason}. Redirecting to {target}").into_response()
            }
        };
        *response.status_mut() = self.status;

        // Framing headers describe the body axum writes, not the function's.
        let out = response.headers_mut();
        let payload_headers = || {
            self.headers
                .iter()
                .filter(|(name, _)| **name != header::CONTENT_LENGTH && **name != header::TRANSFER_ENCODING)
        };
        for (name, _) in payload_headers() {
            out.remove(name);
        }
        for (name, value) in payload_headers() {
            out.append(name.clone(), value.clone());
        }

        for cookie in &self.cookies {
            match HeaderValue::from_str(&cookie.encoded().to_string()) {
                Ok(value) => {
                    out.append(header::SET_COOKIE, value);
                }
                Err(_) => tracing::warn!(cookie = %cookie.name(), "Dropping cookie with invalid header value"),
            }
        }

        if let RenderedBody::Redirect(target) = &self.body {
            match HeaderValue::from_str(target) {
                Ok(location) => {
                    out.insert(header::LOCATION, location);
                }
                Err(_) => tracing::warn!(target = %target, "Redirect target is not a valid header value"),
            }
        }

        response
    }
}

//! What the transport hands back after a completed invocation.

use bytes::Bytes;

/// Outcome of an invocation that reached the function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationResult {
    pub status_code: u16,
    /// Set when the function itself raised.
    pub function_error: Option<String>,
    /// Base64 tail of the execution log, when requested.
    pub log_result: Option<String>,
    pub payload: Option<Bytes>,
}

impl InvocationResult {
    /// A plain 200 result carrying `payload`.
    pub fn ok(payload: impl Into<Bytes>) -> Self {
        Self {
            status_code: 200,
            payload: Some(payload.into()),
            ..Self::default()
        }
    }
}

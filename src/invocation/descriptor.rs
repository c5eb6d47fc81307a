//! The invocation descriptor handed to the transport.

use std::fmt;

use bytes::Bytes;
use serde::{Serialize, Serializer};

/// How the function is invoked. Only synchronous request/response is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InvocationType {
    RequestResponse,
}

impl InvocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationType::RequestResponse => "RequestResponse",
        }
    }
}

/// Whether the transport should return the tail of the execution log.
///
/// Values other than `None`/`Tail` are forwarded verbatim and left for the
/// transport to reject.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogType {
    #[default]
    None,
    Tail,
    Other(String),
}

impl LogType {
    /// Parse an `x-LogType` header value.
    pub fn from_header(value: &str) -> Self {
        if value.eq_ignore_ascii_case("none") {
            LogType::None
        } else if value.eq_ignore_ascii_case("tail") {
            LogType::Tail
        } else {
            LogType::Other(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LogType::None => "None",
            LogType::Tail => "Tail",
            LogType::Other(raw) => raw,
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LogType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single function invocation, built fresh for every request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationDescriptor {
    pub function_name: String,
    pub invocation_type: InvocationType,
    pub log_type: LogType,
    /// JSON-encoded request envelope.
    #[serde(serialize_with = "serialize_payload")]
    pub payload: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

fn serialize_payload<S: Serializer>(payload: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(payload))
}

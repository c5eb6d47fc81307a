//! The default view: an envelope around the function's body.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::Value;

use crate::invocation::InvocationResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Envelope<'a> {
    status_code: u16,
    function_error: Option<&'a str>,
    log_result: Option<String>,
    payload: Value,
}

/// Decode a base64 log tail. Undecodable input is returned unchanged.
pub fn decode_log_result(raw: &str) -> String {
    match STANDARD.decode(raw) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to decode LogResult, passing it through");
            raw.to_string()
        }
    }
}

/// Wrap `body` with the transport's status, function error and log tail.
pub fn envelope(result: &InvocationResult, body: Value) -> Value {
    let envelope = Envelope {
        status_code: result.status_code,
        function_error: result.function_error.as_deref(),
        log_result: result.log_result.as_deref().map(decode_log_result),
        payload: body,
    };
    serde_json::to_value(envelope).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_log_tail() {
        let encoded = STANDARD.encode("START RequestId: 1\nEND RequestId: 1\n");
        assert_eq!(decode_log_result(&encoded), "START RequestId: 1\nEND RequestId: 1\n");
    }

    #[test]
    fn keeps_undecodable_log_tail() {
        assert_eq!(decode_log_result("logresult!"), "logresult!");
    }

    #[test]
    fn envelope_always_carries_every_key() {
        let result = InvocationResult {
            status_code: 200,
            ..InvocationResult::default()
        };
        assert_eq!(
            envelope(&result, json!({"foo": "bar"})),
            json!({
                "StatusCode": 200,
                "FunctionError": null,
                "LogResult": null,
                "Payload": {"foo": "bar"},
            })
        );
    }

    #[test]
    fn envelope_reports_transport_status_and_error() {
        let result = InvocationResult {
            status_code: 200,
            function_error: Some("Unhandled".into()),
            log_result: Some(STANDARD.encode("boom")),
            payload: None,
        };
        let value = envelope(&result, Value::Null);
        assert_eq!(value["StatusCode"], 200);
        assert_eq!(value["FunctionError"], "Unhandled");
        assert_eq!(value["LogResult"], "boom");
        assert_eq!(value["Payload"], Value::Null);
    }
}

//! The transport seam between the dispatcher and AWS Lambda.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::LambdaConfig;
use crate::invocation::descriptor::InvocationDescriptor;
use crate::invocation::result::InvocationResult;

/// The call itself failed: network, credentials, unknown function or region.
///
/// This is rendered verbatim as the body of a 500 response.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{}", describe(.code, .message))]
pub struct TransportError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

fn describe(code: &Option<String>, message: &str) -> String {
    match code {
        Some(code) => format!("{code}: {message}"),
        None => message.to_string(),
    }
}

/// Where and how a single invocation is sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvokeTarget {
    pub region: String,
    pub endpoint_url: Option<String>,
}

impl InvokeTarget {
    /// Resolve the target from an optional `x-Region` value and the current settings.
    pub fn resolve(region: Option<&str>, settings: &LambdaConfig) -> Self {
        Self {
            region: region.unwrap_or(&settings.default_region).to_string(),
            endpoint_url: settings.endpoint_url.clone(),
        }
    }
}

/// Abstract invoker so the dispatcher can run without AWS.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(
        &self,
        descriptor: InvocationDescriptor,
        target: &InvokeTarget,
    ) -> Result<InvocationResult, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_region_wins_over_default() {
        let settings = LambdaConfig::default();
        assert_eq!(InvokeTarget::resolve(Some("eu-central-1"), &settings).region, "eu-central-1");
        assert_eq!(InvokeTarget::resolve(None, &settings).region, "us-east-1");
    }

    #[test]
    fn error_serializes_without_missing_code() {
        let plain = serde_json::to_value(TransportError::new("boom")).unwrap();
        assert_eq!(plain, serde_json::json!({"message": "boom"}));

        let coded = TransportError::with_code("ResourceNotFoundException", "Function not found");
        assert_eq!(coded.to_string(), "ResourceNotFoundException: Function not found");
    }
}

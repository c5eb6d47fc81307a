//! Request dispatch: validate, map, invoke, render.
//!
//! # Data Flow
//! ```text
//! IncomingRequest
//!     → x-FunctionName present? otherwise 400
//!     → region (x-Region | lambda.default_region), view (x-ViewType)
//!     → map_request → Invoker::invoke
//!     → render(view, outcome)
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::config::LambdaConfig;
use crate::http::request::{request_id, IncomingRequest};
use crate::invocation::headers::{X_FUNCTION_NAME, X_REGION, X_VIEW_TYPE};
use crate::invocation::{map_request, InvokeTarget, Invoker};
use crate::observability::metrics;
use crate::render::{render, ViewType};

/// Body of the 400 sent when no function is named.
pub const MISSING_FUNCTION_MESSAGE: &str =
    "Please provide an AWS Lambda function name in the form of a 'x-FunctionName' header.";

/// Turns requests into invocations through an [`Invoker`].
#[derive(Clone)]
pub struct Dispatcher {
    invoker: Arc<dyn Invoker>,
}

impl Dispatcher {
    pub fn new(invoker: Arc<dyn Invoker>) -> Self {
        Self { invoker }
    }

    /// Handle one request with the given Lambda settings snapshot.
    pub async fn dispatch(&self, req: &IncomingRequest, settings: &LambdaConfig) -> Response {
        let request_id = request_id(&req.headers);

        let Some(function) = req.header(X_FUNCTION_NAME) else {
            tracing::debug!(request_id = %request_id, "Rejecting request without x-FunctionName");
            metrics::record_rejected("missing_function_name");
            return (StatusCode::BAD_REQUEST, MISSING_FUNCTION_MESSAGE).into_response();
        };

        let target = InvokeTarget::resolve(req.header(X_REGION), settings);
        let view = ViewType::from_header(req.header(X_VIEW_TYPE));

        let descriptor = match map_request(req) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Failed to map request");
                return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
            }
        };

        tracing::debug!(
            request_id = %request_id,
            function = %function,
            region = %target.region,
            qualifier = ?descriptor.qualifier,
            view = ?view,
            "Invoking function"
        );

        let start = Instant::now();
        let outcome = self.invoker.invoke(descriptor, &target).await;
        metrics::record_invocation(metrics::outcome_label(&outcome), start);

        let rendered = render(view, outcome);
        tracing::info!(
            request_id = %request_id,
            function = %function,
            region = %target.region,
            status = rendered.status.as_u16(),
            "Invocation complete"
        );
        rendered.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::{InvocationDescriptor, InvocationResult, TransportError};
    use async_trait::async_trait;
    use axum::http::Request;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<(InvocationDescriptor, InvokeTarget)>>,
    }

    #[async_trait]
    impl Invoker for Recording {
        async fn invoke(
            &self,
            descriptor: InvocationDescriptor,
            target: &InvokeTarget,
        ) -> Result<InvocationResult, TransportError> {
            self.calls.lock().unwrap().push((descriptor, target.clone()));
            Ok(InvocationResult::ok(r#"{"body":{"ok":true}}"#))
        }
    }

    fn incoming(req: Request<()>) -> IncomingRequest {
        let (parts, ()) = req.into_parts();
        IncomingRequest::from_parts(&parts, b"", false).unwrap()
    }

    #[tokio::test]
    async fn missing_function_never_reaches_invoker() {
        let invoker = Arc::new(Recording::default());
        let dispatcher = Dispatcher::new(invoker.clone());

        let req = incoming(Request::builder().uri("/api").header("x-Region", "eu-west-1").body(()).unwrap());
        let response = dispatcher.dispatch(&req, &LambdaConfig::default()).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(invoker.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn region_defaults_from_settings() {
        let invoker = Arc::new(Recording::default());
        let dispatcher = Dispatcher::new(invoker.clone());
        let settings = LambdaConfig {
            default_region: "ap-northeast-1".into(),
            endpoint_url: None,
        };

        let req = incoming(Request::builder().uri("/").header("x-FunctionName", "fn").body(()).unwrap());
        let response = dispatcher.dispatch(&req, &settings).await;
        assert_eq!(response.status(), StatusCode::OK);

        let req = incoming(
            Request::builder()
                .uri("/")
                .header("x-FunctionName", "fn")
                .header("x-Region", "sa-east-1")
                .body(())
                .unwrap(),
        );
        dispatcher.dispatch(&req, &settings).await;

        let calls = invoker.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1.region, "ap-northeast-1");
        assert_eq!(calls[1].1.region, "sa-east-1");
        assert_eq!(calls[0].0.function_name, "fn");
    }
}

//! AWS SDK implementation of [`Invoker`].

use async_trait::async_trait;
use aws_sdk_lambda::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{InvocationType as SdkInvocationType, LogType as SdkLogType};
use bytes::Bytes;
use dashmap::DashMap;

use crate::invocation::descriptor::InvocationDescriptor;
use crate::invocation::result::InvocationResult;
use crate::invocation::transport::{InvokeTarget, Invoker, TransportError};

/// Invokes functions through the Lambda `Invoke` API.
///
/// One SDK client is kept per target so connection pools survive across
/// requests. Credentials follow the standard AWS provider chain.
#[derive(Default)]
pub struct AwsLambdaInvoker {
    clients: DashMap<InvokeTarget, aws_sdk_lambda::Client>,
}

impl AwsLambdaInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    async fn client_for(&self, target: &InvokeTarget) -> aws_sdk_lambda::Client {
        if let Some(client) = self.clients.get(target).map(|c| c.clone()) {
            return client;
        }

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(target.region.clone()));
        if let Some(endpoint) = &target.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let cfg = loader.load().await;
        let client = aws_sdk_lambda::Client::new(&cfg);

        tracing::debug!(region = %target.region, "Created Lambda client");
        self.clients
            .entry(target.clone())
            .or_insert(client)
            .clone()
    }

    /// Number of cached clients.
    pub fn cached_clients(&self) -> usize {
        self.clients.len()
    }
}

#[async_trait]
impl Invoker for AwsLambdaInvoker {
    async fn invoke(
        &self,
        descriptor: InvocationDescriptor,
        target: &InvokeTarget,
    ) -> Result<InvocationResult, TransportError> {
        let client = self.client_for(target).await;

        let out = client
            .invoke()
            .function_name(descriptor.function_name)
            .invocation_type(SdkInvocationType::from(descriptor.invocation_type.as_str()))
            .log_type(SdkLogType::from(descriptor.log_type.as_str()))
            .payload(Blob::new(descriptor.payload))
            .set_qualifier(descriptor.qualifier)
            .send()
            .await
            .map_err(|err| {
                let message = err
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
                TransportError {
                    code: err.code().map(str::to_string),
                    message,
                }
            })?;

        Ok(InvocationResult {
            status_code: u16::try_from(out.status_code()).unwrap_or(500),
            function_error: out.function_error().map(str::to_string),
            log_result: out.log_result().map(str::to_string),
            payload: out.payload().map(|b| Bytes::copy_from_slice(b.as_ref())),
        })
    }
}

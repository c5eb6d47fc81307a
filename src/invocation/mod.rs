//! Function invocation subsystem.
//!
//! # Data Flow
//! ```text
//! IncomingRequest
//!     → mapper.rs (envelope + headers → InvocationDescriptor)
//!     → transport.rs (Invoker trait, region/endpoint target)
//!     → aws.rs (Lambda Invoke API)
//!     → InvocationResult | TransportError
//! ```
//!
//! # Design Decisions
//! - Invocations are always synchronous (RequestResponse)
//! - Region and endpoint travel with each call, never as process state
//! - No retries: a failed call is reported once

pub mod aws;
pub mod descriptor;
pub mod headers;
pub mod mapper;
pub mod result;
pub mod transport;

pub use aws::AwsLambdaInvoker;
pub use descriptor::{InvocationDescriptor, InvocationType, LogType};
pub use mapper::{map_request, MapError, RequestEnvelope};
pub use result::InvocationResult;
pub use transport::{InvokeTarget, Invoker, TransportError};

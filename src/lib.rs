//! Lambda HTTP proxy library.
//!
//! Translates each HTTP request into one synchronous AWS Lambda invocation
//! and the invocation result back into an HTTP response.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod invocation;
pub mod lifecycle;
pub mod observability;
pub mod render;

pub use config::schema::ProxyConfig;
pub use dispatch::Dispatcher;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, timeout, body limit)
//!     → request.rs (decode body, cookies, query into IncomingRequest)
//!     → dispatch (map, invoke, render)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{request_id, IncomingRequest, RequestError, X_REQUEST_ID};
pub use server::{AppState, HttpServer};

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler and `/healthz`
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Publish configuration reloads to in-flight handlers
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::dispatch::Dispatcher;
use crate::http::request::{IncomingRequest, RequestError};
use crate::invocation::{AwsLambdaInvoker, Invoker};
use crate::lifecycle::shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<ProxyConfig>>,
    pub dispatcher: Dispatcher,
}

/// HTTP server for the Lambda proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ArcSwap<ProxyConfig>>,
}

impl HttpServer {
    /// Create a server that invokes functions through AWS Lambda.
    pub fn new(config: ProxyConfig) -> Self {
        Self::with_invoker(config, Arc::new(AwsLambdaInvoker::new()))
    }

    /// Create a server backed by a custom invoker.
    pub fn with_invoker(config: ProxyConfig, invoker: Arc<dyn Invoker>) -> Self {
        let shared = Arc::new(ArcSwap::from_pointee(config.clone()));
        let state = AppState {
            config: shared.clone(),
            dispatcher: Dispatcher::new(invoker),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config: shared,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/healthz", get(|| async { "ok" }))
            .route("/", any(invoke_handler))
            .route("/{*path}", any(invoke_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for embedding or in-process testing.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<ProxyConfig> {
        self.config.load_full()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configurations received on `config_updates` replace the Lambda and
    /// request-decoding settings for subsequent requests. Listener, limit and
    /// timeout settings are fixed at startup.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shared = self.config.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                tracing::info!(
                    default_region = %new_config.lambda.default_region,
                    "Applying reloaded configuration"
                );
                shared.store(Arc::new(new_config));
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Decode the request and hand it to the dispatcher.
async fn invoke_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let config = state.config.load_full();
    let (parts, body) = request.into_parts();

    let limit = config.security.max_body_size;
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = RequestError::from_body_error(e, limit);
            tracing::debug!(error = %err, "Failed to read request body");
            return err.into_response();
        }
    };

    let incoming = match IncomingRequest::from_parts(&parts, &bytes, config.listener.trust_proxy) {
        Ok(incoming) => incoming,
        Err(e) => {
            tracing::debug!(error = %e, "Rejecting undecodable request");
            return e.into_response();
        }
    };

    state.dispatcher.dispatch(&incoming, &config.lambda).await
}

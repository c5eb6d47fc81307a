//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lambda_http_proxy::config::ProxyConfig;
use lambda_http_proxy::invocation::{
    InvocationDescriptor, InvocationResult, InvokeTarget, Invoker, TransportError,
};
use lambda_http_proxy::{HttpServer, Shutdown};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// An invoker that answers from a table keyed by function name and records calls.
#[derive(Default)]
pub struct ScriptedInvoker {
    responses: Mutex<HashMap<String, Result<InvocationResult, TransportError>>>,
    calls: Mutex<Vec<(InvocationDescriptor, InvokeTarget)>>,
}

#[allow(dead_code)]
impl ScriptedInvoker {
    pub fn respond(&self, function: &str, outcome: Result<InvocationResult, TransportError>) {
        self.responses
            .lock()
            .unwrap()
            .insert(function.to_string(), outcome);
    }

    pub fn calls(&self) -> Vec<(InvocationDescriptor, InvokeTarget)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Invoker for ScriptedInvoker {
    async fn invoke(
        &self,
        descriptor: InvocationDescriptor,
        target: &InvokeTarget,
    ) -> Result<InvocationResult, TransportError> {
        let outcome = self
            .responses
            .lock()
            .unwrap()
            .get(&descriptor.function_name)
            .cloned()
            .unwrap_or_else(|| {
                Err(TransportError::with_code(
                    "ResourceNotFoundException",
                    format!("Function not found: {}", descriptor.function_name),
                ))
            });
        self.calls.lock().unwrap().push((descriptor, target.clone()));
        outcome
    }
}

/// A running proxy bound to an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub invoker: Arc<ScriptedInvoker>,
    pub config_tx: mpsc::UnboundedSender<ProxyConfig>,
    shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestProxy {
    pub async fn start(config: ProxyConfig) -> Self {
        let invoker = Arc::new(ScriptedInvoker::default());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let (config_tx, config_updates) = mpsc::unbounded_channel();
        let server = HttpServer::with_invoker(config, invoker.clone());
        let server_shutdown = shutdown.subscribe();

        tokio::spawn(async move {
            let _ = server.run(listener, config_updates, server_shutdown).await;
        });

        Self {
            addr,
            invoker,
            config_tx,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// A client that neither pools connections nor follows redirects.
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()
            .unwrap()
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

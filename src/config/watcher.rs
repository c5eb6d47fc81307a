//! Configuration file watcher for hot reload.
//!
//! Only the Lambda transport settings and `listener.trust_proxy` apply to a
//! running proxy. Everything else (bind address, timeouts, body limit,
//! observability) is wired into the listener and middleware at startup, so
//! edits to those fields are reported and otherwise ignored.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventHandler, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ProxyConfig;

/// Outcome of comparing the running configuration with a revision from disk.
#[derive(Debug, PartialEq)]
pub struct Reload {
    /// Running configuration with the reloadable settings taken from disk.
    pub config: ProxyConfig,
    /// Settings that changed on disk but only apply at startup.
    pub ignored: Vec<&'static str>,
}

impl Reload {
    pub fn between(current: &ProxyConfig, next: ProxyConfig) -> Self {
        let mut ignored = Vec::new();
        if current.listener.bind_address != next.listener.bind_address {
            ignored.push("listener.bind_address");
        }
        if current.timeouts != next.timeouts {
            ignored.push("timeouts");
        }
        if current.security != next.security {
            ignored.push("security");
        }
        if current.observability != next.observability {
            ignored.push("observability");
        }

        let mut config = current.clone();
        config.lambda = next.lambda;
        config.listener.trust_proxy = next.listener.trust_proxy;

        Self { config, ignored }
    }
}

/// Watches the configuration file and publishes revisions that change
/// reloadable settings.
pub struct ConfigWatcher {
    path: PathBuf,
    current: ProxyConfig,
    update_tx: mpsc::UnboundedSender<ProxyConfig>,
}

impl ConfigWatcher {
    /// `current` is the configuration the server started with.
    pub fn new(path: &Path, current: ProxyConfig) -> (Self, mpsc::UnboundedReceiver<ProxyConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                current,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let mut watcher = RecommendedWatcher::new(self, Config::default().with_poll_interval(Duration::from_secs(2)))?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Watching configuration file");
        Ok(watcher)
    }

    fn reload(&mut self) {
        let next = match load_config(&self.path) {
            Ok(next) => next,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Ignoring invalid configuration revision");
                return;
            }
        };

        let Reload { config, ignored } = Reload::between(&self.current, next);
        for setting in ignored {
            tracing::warn!(setting, "Setting changed on disk but only applies at startup");
        }
        if config == self.current {
            tracing::debug!(path = %self.path.display(), "No reloadable settings changed");
            return;
        }

        tracing::info!(
            default_region = %config.lambda.default_region,
            endpoint_url = ?config.lambda.endpoint_url,
            trust_proxy = config.listener.trust_proxy,
            "Publishing reloaded configuration"
        );
        self.current = config.clone();
        if self.update_tx.send(config).is_err() {
            tracing::debug!("Configuration receiver gone, dropping update");
        }
    }
}

impl EventHandler for ConfigWatcher {
    fn handle_event(&mut self, event: notify::Result<Event>) {
        match event {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => self.reload(),
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Configuration watch error"),
        }
    }
}

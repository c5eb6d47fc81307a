//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → published through ArcSwap; each request loads one snapshot
//!
//! On file change (--watch):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → reloadable settings (lambda.*, listener.trust_proxy) merged onto the running config
//!     → atomic swap of Arc<ProxyConfig>
//!     → requests started afterwards observe the new snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a reload publishes a new snapshot
//! - Listener, timeout, limit and observability settings only apply at startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{LambdaConfig, ListenerConfig, ProxyConfig, DEFAULT_REGION};

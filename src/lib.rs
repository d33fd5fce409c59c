//! # layerstack-config
//!
//! Layered configuration: merge in-memory values and JSON/YAML/TOML files by
//! explicit priority and read the result through path expressions.
//!
//! ## Overview
//!
//! - Sources are an ordered list; later sources win key conflicts
//! - Maps merge recursively, sequences and scalars are replaced wholesale
//! - Every successful load publishes a brand-new immutable tree via `arc-swap`
//! - A failed load publishes nothing and keeps the previous tree
//! - Concurrent load requests share a single in-flight pass
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use layerstack_config::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> layerstack_config::error::Result<()> {
//! let config = ConfigAccessor::builder()
//!     .with_defaults(json!({"server": {"port": 8080, "hosts": ["a", "b"]}}))
//!     .with_file("config/default.yaml")
//!     .with_file("config/production.toml")
//!     .build_and_load()
//!     .await?;
//!
//! // Dotted and comma notation address the same node
//! let first = config.get("server.hosts[0]", "localhost")?;
//! assert_eq!(first, config.get("server,hosts,0", "localhost")?);
//!
//! // Typed reads
//! let port: u16 = config.get_as("server.port", 80)?;
//!
//! // Later sources take precedence; adding one to a ready accessor reloads
//! config.add_source([json!({"server": {"port": 9090}})]).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `yaml` (default): `.yaml` / `.yml` files
//! - `toml` (default): `.toml` files
//! - `script`: [`sources::CommandEvaluator`], runs script files as programs
//! - `file-watch`: reload when file sources change on disk

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod merge;
pub mod notify;
pub mod path;
pub mod registry;
pub mod sources;
pub mod value;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{ConfigAccessor, ConfigAccessorBuilder};
    pub use crate::error::{ConfigError, Result};
    pub use crate::registry::ConfigRegistry;
    pub use crate::sources::Source;
    pub use crate::value::ConfigValue;
}

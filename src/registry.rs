//! Process-wide accessor registry.
//!
//! [`ConfigRegistry`] is an ordinary value that can be passed around or
//! injected. The free functions [`init`] and [`current`] wrap a single
//! process-wide instance for code that prefers ambient access.

use crate::core::ConfigAccessor;
use crate::error::{ConfigError, Result};
use crate::sources::Source;
use arc_swap::ArcSwapOption;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Holds at most one accessor: uninitialized, then initialized (pending
/// until its first load succeeds, then ready).
pub struct ConfigRegistry {
    slot: ArcSwapOption<ConfigAccessor>,
}

impl ConfigRegistry {
    /// Create an uninitialized registry.
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    /// Build an accessor over `defaults` followed by `sources`, install it
    /// (replacing any previous one) and perform its first load.
    ///
    /// The new accessor is installed before loading, so [`current`](Self::current)
    /// reports [`ConfigError::NotReady`] while the load runs, and keeps doing
    /// so if it fails.
    ///
    /// # Errors
    ///
    /// Returns the error of the first load.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use layerstack_config::registry::ConfigRegistry;
    /// use serde_json::json;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> layerstack_config::error::Result<()> {
    /// let registry = ConfigRegistry::new();
    /// registry.init(json!({"port": 8080}), [json!({"port": 9090})]).await?;
    ///
    /// let config = registry.current()?;
    /// assert_eq!(config.get("port", 0)?.as_i64(), Some(9090));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn init<I>(&self, defaults: Value, sources: I) -> Result<ConfigAccessor>
    where
        I: IntoIterator,
        I::Item: Into<Source>,
    {
        let accessor = ConfigAccessor::builder()
            .with_defaults(defaults)
            .with_sources(sources)
            .build();
        self.install(accessor).await
    }

    /// Install a pre-built accessor (replacing any previous one) and load it.
    ///
    /// # Errors
    ///
    /// Returns the error of the load.
    pub async fn install(&self, accessor: ConfigAccessor) -> Result<ConfigAccessor> {
        self.slot.store(Some(Arc::new(accessor.clone())));
        debug!("installed configuration accessor");
        accessor.load_configs().await?;
        Ok(accessor)
    }

    /// The installed accessor, once its first load has succeeded.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotInitialized`] if nothing was ever installed
    /// - [`ConfigError::NotReady`] if the installed accessor has not loaded yet
    pub fn current(&self) -> Result<ConfigAccessor> {
        let accessor = self.slot.load_full().ok_or(ConfigError::NotInitialized)?;
        if !accessor.is_ready() {
            return Err(ConfigError::NotReady);
        }
        Ok(ConfigAccessor::clone(&accessor))
    }

    /// Returns `true` if an accessor has been installed.
    pub fn is_initialized(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Return to the uninitialized state.
    pub fn reset(&self) {
        self.slot.store(None);
    }
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: LazyLock<ConfigRegistry> = LazyLock::new(ConfigRegistry::new);

/// The process-wide registry.
pub fn global() -> &'static ConfigRegistry {
    &GLOBAL
}

/// [`ConfigRegistry::init`] on the process-wide registry.
///
/// # Errors
///
/// Returns the error of the first load.
pub async fn init<I>(defaults: Value, sources: I) -> Result<ConfigAccessor>
where
    I: IntoIterator,
    I::Item: Into<Source>,
{
    global().init(defaults, sources).await
}

/// [`ConfigRegistry::current`] on the process-wide registry.
///
/// # Errors
///
/// See [`ConfigRegistry::current`].
pub fn current() -> Result<ConfigAccessor> {
    global().current()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_current_before_init() {
        let registry = ConfigRegistry::new();
        assert!(!registry.is_initialized());
        assert!(matches!(registry.current(), Err(ConfigError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_init_then_current() {
        let registry = ConfigRegistry::new();
        let accessor = registry
            .init(json!({"a": 1, "b": 1}), [json!({"b": 2})])
            .await
            .unwrap();
        assert!(accessor.is_ready());

        let current = registry.current().unwrap();
        assert_eq!(current.get("a", 0).unwrap().as_i64(), Some(1));
        assert_eq!(current.get("b", 0).unwrap().as_i64(), Some(2));
    }

    #[tokio::test]
    async fn test_current_while_pending() {
        let registry = ConfigRegistry::new();
        let init = registry.init(json!({}), Vec::<Source>::new());
        futures::pin_mut!(init);

        // Poll once so the accessor is installed but its load is not finished.
        assert!(futures::poll!(init.as_mut()).is_pending());
        assert!(registry.is_initialized());
        assert!(matches!(registry.current(), Err(ConfigError::NotReady)));

        init.await.unwrap();
        assert!(registry.current().is_ok());
    }

    #[tokio::test]
    async fn test_failed_init_leaves_pending_instance() {
        let registry = ConfigRegistry::new();
        let result = registry
            .init(json!({}), [Source::file("/nonexistent/app.json")])
            .await;
        assert!(result.is_err());
        assert!(registry.is_initialized());
        assert!(matches!(registry.current(), Err(ConfigError::NotReady)));
    }

    #[tokio::test]
    async fn test_reinit_replaces_instance() {
        let registry = ConfigRegistry::new();
        registry.init(json!({"v": 1}), Vec::<Source>::new()).await.unwrap();
        registry.init(json!({"v": 2}), Vec::<Source>::new()).await.unwrap();
        assert_eq!(
            registry.current().unwrap().get("v", 0).unwrap().as_i64(),
            Some(2)
        );

        registry.reset();
        assert!(matches!(registry.current(), Err(ConfigError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_global_wrapper() {
        let accessor = init(json!({"name": "global"}), Vec::<Source>::new())
            .await
            .unwrap();
        assert!(accessor.is_ready());
        assert_eq!(
            current().unwrap().get("name", "").unwrap().as_str(),
            Some("global")
        );
    }
}

//! The accessor: source list, single-flight loading and path reads.

use crate::core::{ConfigAccessorBuilder, ConfigLoader};
use crate::error::{ConfigError, Result};
use crate::notify::{SubscriberRegistry, SubscriptionHandle};
use crate::path::resolve;
use crate::sources::Source;
use crate::value::ConfigValue;
use arc_swap::ArcSwapOption;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

#[cfg(feature = "file-watch")]
use crate::notify::ConfigWatcher;
#[cfg(feature = "file-watch")]
use std::time::Duration;

/// A shared handle to one load pass.
///
/// Every caller that asks for a load while a pass is in flight receives a
/// clone of the same handle and observes the same outcome.
pub type LoadHandle = Shared<BoxFuture<'static, Result<()>>>;

struct InFlight {
    pass: u64,
    handle: LoadHandle,
}

struct Inner {
    sources: RwLock<Vec<Source>>,
    /// Bumped under the `sources` write lock on every list change.
    generation: AtomicU64,
    /// Source generation behind the published tree.
    published_generation: AtomicU64,
    /// Published tree; `None` until the first successful load.
    current: ArcSwapOption<ConfigValue>,
    loader: ConfigLoader,
    in_flight: Mutex<Option<InFlight>>,
    next_pass: AtomicU64,
    subscribers: SubscriberRegistry,
}

impl Inner {
    async fn run_pass(&self, pass: u64) -> Result<()> {
        let (sources, generation) = {
            let sources = self.sources.read();
            (sources.clone(), self.generation.load(Ordering::Acquire))
        };
        debug!(pass, generation, sources = sources.len(), "loading configuration");

        let tree = match self.loader.load(&sources).await {
            Ok(tree) => Arc::new(tree),
            Err(e) => {
                debug!(pass, error = %e, "configuration load failed, previous state retained");
                return Err(e);
            }
        };

        self.current.store(Some(Arc::clone(&tree)));
        self.published_generation.fetch_max(generation, Ordering::AcqRel);
        debug!(pass, generation, "published configuration");
        self.subscribers.notify_all(&tree);
        Ok(())
    }
}

/// Clears the in-flight slot when its pass settles, even if the pass panicked.
struct SettleGuard {
    inner: Arc<Inner>,
    pass: u64,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        let mut slot = self.inner.in_flight.lock();
        if slot.as_ref().is_some_and(|in_flight| in_flight.pass == self.pass) {
            *slot = None;
        }
    }
}

/// Merged, path-addressable view over an ordered list of sources.
///
/// The accessor starts out not ready. [`load_configs`](Self::load_configs)
/// resolves every source, deep-merges them in list order (later wins) and
/// publishes the frozen result. Reads never block a reload: they keep
/// seeing the previous tree until the new one is swapped in.
///
/// Cloning is cheap and every clone shares the same state.
///
/// # Examples
///
/// ```rust,no_run
/// use layerstack_config::prelude::*;
/// use serde_json::json;
///
/// # async fn example() -> Result<()> {
/// let config = ConfigAccessor::builder()
///     .with_defaults(json!({"server": {"port": 8080, "host": "localhost"}}))
///     .with_file("config/production.yaml")
///     .build_and_load()
///     .await?;
///
/// let port = config.get("server.port", 80)?;
/// println!("Port: {port}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConfigAccessor {
    inner: Arc<Inner>,
}

impl ConfigAccessor {
    /// Create a new builder for constructing an accessor.
    pub fn builder() -> ConfigAccessorBuilder {
        ConfigAccessorBuilder::new()
    }

    /// Create a not-yet-loaded accessor over `sources` with the default
    /// filesystem reader and decoders.
    pub fn new<I>(sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Source>,
    {
        ConfigAccessorBuilder::new().with_sources(sources).build()
    }

    pub(crate) fn from_parts(sources: Vec<Source>, loader: ConfigLoader) -> Self {
        Self {
            inner: Arc::new(Inner {
                sources: RwLock::new(sources),
                generation: AtomicU64::new(0),
                published_generation: AtomicU64::new(0),
                current: ArcSwapOption::empty(),
                loader,
                in_flight: Mutex::new(None),
                next_pass: AtomicU64::new(0),
                subscribers: SubscriberRegistry::new(),
            }),
        }
    }

    /// Returns `true` once a load has succeeded. Never reverts.
    pub fn is_ready(&self) -> bool {
        self.inner.current.load().is_some()
    }

    /// Returns `true` while a load pass is in flight.
    pub fn is_loading(&self) -> bool {
        self.inner.in_flight.lock().is_some()
    }

    /// A copy of the current source list, lowest priority first.
    pub fn sources(&self) -> Vec<Source> {
        self.inner.sources.read().clone()
    }

    /// Start a load pass, or join the one already in flight.
    ///
    /// The pass runs on the tokio runtime and always completes, whether or
    /// not the returned handle is awaited. On success the merged tree is
    /// published; on failure nothing changes and every waiter receives the
    /// error.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn load_configs(&self) -> LoadHandle {
        let mut slot = self.inner.in_flight.lock();
        if let Some(in_flight) = slot.as_ref() {
            debug!(pass = in_flight.pass, "joining in-flight configuration load");
            return in_flight.handle.clone();
        }

        let pass = self.inner.next_pass.fetch_add(1, Ordering::Relaxed);
        let guard = SettleGuard {
            inner: Arc::clone(&self.inner),
            pass,
        };
        let task = tokio::spawn(async move {
            let outcome = guard.inner.run_pass(pass).await;
            drop(guard);
            outcome
        });

        let handle = async move {
            task.await.unwrap_or_else(|e| {
                Err(ConfigError::Other(format!("configuration load task failed: {}", e)))
            })
        }
        .boxed()
        .shared();

        *slot = Some(InFlight {
            pass,
            handle: handle.clone(),
        });
        handle
    }

    /// Append sources at the highest priority.
    ///
    /// If the accessor is ready this reloads and returns the reload's
    /// outcome; otherwise the sources are only queued for the next explicit
    /// [`load_configs`](Self::load_configs). A pass already in flight
    /// started from the old list, so it is followed by one that includes
    /// the new sources before this returns.
    ///
    /// # Errors
    ///
    /// Returns the error of the triggered reload, if any.
    pub async fn add_source<I>(&self, sources: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Source>,
    {
        let generation = {
            let mut list = self.inner.sources.write();
            list.extend(sources.into_iter().map(Into::into));
            self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1
        };
        self.reload_if_ready(generation).await
    }

    /// Remove the first source identical to `source`.
    ///
    /// File sources match by exact path string, inline sources only by
    /// identity (a structurally equal copy does not match). Removing
    /// something that is not in the list does nothing. Like
    /// [`add_source`](Self::add_source), a ready accessor reloads until the
    /// published tree no longer includes the removed source.
    ///
    /// # Errors
    ///
    /// Returns the error of the triggered reload, if any.
    pub async fn remove_source(&self, source: &Source) -> Result<()> {
        let generation = {
            let mut sources = self.inner.sources.write();
            match sources.iter().position(|s| s.is_same(source)) {
                Some(index) => {
                    sources.remove(index);
                    self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1
                }
                None => return Ok(()),
            }
        };
        self.reload_if_ready(generation).await
    }

    /// Loads until the published tree reflects the source list as of
    /// `generation`. Joining an older in-flight pass takes one extra pass.
    async fn reload_if_ready(&self, generation: u64) -> Result<()> {
        while self.is_ready()
            && self.inner.published_generation.load(Ordering::Acquire) < generation
        {
            self.load_configs().await?;
        }
        Ok(())
    }

    /// The whole published tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotReady`] before the first successful load.
    pub fn snapshot(&self) -> Result<Arc<ConfigValue>> {
        self.inner.current.load_full().ok_or(ConfigError::NotReady)
    }

    /// Resolve `path`, falling back to `default` when nothing is there.
    ///
    /// The returned node shares storage with the published tree. An empty
    /// path (or one made only of delimiters) yields the default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotReady`] before the first successful load,
    /// regardless of the default.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use layerstack_config::prelude::*;
    /// # use serde_json::json;
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<()> {
    /// let config = ConfigAccessor::new([json!({"a": {"b": [{"c": 1}, {"c": 2}]}})]);
    /// assert!(matches!(config.get("a.b", 0), Err(ConfigError::NotReady)));
    ///
    /// config.load_configs().await?;
    /// assert_eq!(config.get("a.b[1].c", 0)?, config.get("a,b,1,c", 0)?);
    /// assert_eq!(config.get("a.x", "fallback")?.as_str(), Some("fallback"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn get(&self, path: &str, default: impl Into<ConfigValue>) -> Result<ConfigValue> {
        Ok(self.get_opt(path)?.unwrap_or_else(|| default.into()))
    }

    /// Resolve `path` without a default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotReady`] before the first successful load.
    pub fn get_opt(&self, path: &str) -> Result<Option<ConfigValue>> {
        let root = self.snapshot()?;
        Ok(resolve(&root, path).cloned())
    }

    /// Resolve `path` and deserialize it, falling back to `default`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotReady`] before the first successful load
    /// - [`ConfigError::Deserialize`] if the value does not fit `T`
    pub fn get_as<T: DeserializeOwned>(&self, path: &str, default: T) -> Result<T> {
        match self.get_opt(path)? {
            Some(value) => value.deserialize(),
            None => Ok(default),
        }
    }

    /// Call `callback` with every newly published tree.
    ///
    /// Drop the returned handle to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ConfigValue) + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(callback)
    }

    /// Reload whenever one of the current file sources changes on disk.
    ///
    /// Only files in the source list at the time of the call are watched.
    /// Reload failures keep the previous configuration. Watching stops when
    /// the returned handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Watch`] if a file cannot be watched.
    #[cfg(feature = "file-watch")]
    pub fn watch(&self, debounce: Duration) -> Result<WatchHandle> {
        let (watcher, mut rx) = ConfigWatcher::new(debounce)?;
        for source in self.sources() {
            if let Some(path) = source.path() {
                watcher.watch(path)?;
            }
        }

        let accessor = self.clone();
        let task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                // A pass already in flight may have read the file before it changed.
                if accessor.is_loading() {
                    let _ = accessor.load_configs().await;
                }
                if let Err(e) = accessor.load_configs().await {
                    debug!(error = %e, "reload after file change failed");
                }
            }
        });

        Ok(WatchHandle {
            _watcher: watcher,
            task,
        })
    }
}

impl fmt::Debug for ConfigAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigAccessor")
            .field("ready", &self.is_ready())
            .field("sources", &*self.inner.sources.read())
            .finish()
    }
}

/// Keeps a file watch alive; dropping it stops watching.
#[cfg(feature = "file-watch")]
pub struct WatchHandle {
    _watcher: ConfigWatcher,
    task: tokio::task::JoinHandle<()>,
}

#[cfg(feature = "file-watch")]
impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

//! File watching that triggers reloads.

use crate::error::{ConfigError, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};

/// Watches configuration files and emits a debounced reload signal.
///
/// # Examples
///
/// ```rust,no_run
/// use layerstack_config::notify::ConfigWatcher;
/// use std::time::Duration;
///
/// # async fn example() -> layerstack_config::error::Result<()> {
/// let (watcher, mut rx) = ConfigWatcher::new(Duration::from_millis(500))?;
/// watcher.watch("/path/to/config.yaml")?;
///
/// while let Some(()) = rx.recv().await {
///     println!("Config file changed, reload triggered!");
/// }
/// # Ok(())
/// # }
/// ```
pub struct ConfigWatcher {
    watcher: Mutex<RecommendedWatcher>,
    debounce_duration: Duration,
    watched_paths: Mutex<Vec<PathBuf>>,
}

impl ConfigWatcher {
    /// Create a watcher and the receiver its reload signals arrive on.
    ///
    /// Events closer together than `debounce_duration` collapse into one
    /// signal, sent after the watched files have been quiet that long.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Watch`] if the platform watcher cannot be created.
    pub fn new(debounce_duration: Duration) -> Result<(Self, mpsc::Receiver<()>)> {
        let (tx, rx) = mpsc::channel(100);
        let debounce = debounce_duration;

        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                if matches!(
                    event.kind,
                    notify::EventKind::Modify(_) | notify::EventKind::Create(_)
                ) {
                    let _ = event_tx.send(event);
                }
            }
        })
        .map_err(|e| ConfigError::Watch(format!("Failed to create file watcher: {}", e)))?;

        tokio::spawn(async move {
            let mut pending = false;
            let quiet = sleep(debounce);
            tokio::pin!(quiet);

            loop {
                tokio::select! {
                    Some(_event) = event_rx.recv() => {
                        pending = true;
                        quiet.as_mut().reset(Instant::now() + debounce);
                    }

                    _ = &mut quiet, if pending => {
                        pending = false;
                        if tx.send(()).await.is_err() {
                            break;
                        }
                    }

                    else => break,
                }
            }
        });

        Ok((
            Self {
                watcher: Mutex::new(watcher),
                debounce_duration,
                watched_paths: Mutex::new(Vec::new()),
            },
            rx,
        ))
    }

    /// Start watching a file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Watch`] if the path does not exist or cannot be watched.
    pub fn watch(&self, path: impl AsRef<Path>) -> Result<()> {
        let canonical_path = path
            .as_ref()
            .canonicalize()
            .map_err(|e| ConfigError::Watch(format!("Failed to resolve path: {}", e)))?;

        self.watcher
            .lock()
            .watch(&canonical_path, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::Watch(format!("Failed to watch path: {}", e)))?;

        let mut paths = self.watched_paths.lock();
        if !paths.contains(&canonical_path) {
            paths.push(canonical_path);
        }
        Ok(())
    }

    /// Debounce window between reload signals.
    pub fn debounce_duration(&self) -> Duration {
        self.debounce_duration
    }

    /// Paths currently being watched.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.watched_paths.lock().clone()
    }
}

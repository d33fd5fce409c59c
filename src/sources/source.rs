//! The source variants held in an accessor's ordered source list.

use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A single configuration contributor.
///
/// Position in the source list is merge precedence: later sources win.
///
/// Identity, as used by [`ConfigAccessor::remove_source`](crate::core::ConfigAccessor::remove_source):
/// - `Inline` sources are identical only if they share the same `Arc`
/// - `File` sources are identical if their path strings are equal
///
/// # Examples
///
/// ```rust
/// use layerstack_config::sources::Source;
/// use serde_json::json;
///
/// let defaults = Source::inline(json!({"port": 8080}));
/// assert!(defaults.is_same(&defaults.clone()));
/// assert!(!defaults.is_same(&Source::inline(json!({"port": 8080}))));
///
/// assert!(Source::file("a.yaml").is_same(&Source::file("a.yaml")));
/// ```
#[derive(Clone)]
pub enum Source {
    /// An in-memory value, used as-is.
    Inline(Arc<Value>),
    /// A file path; the format is inferred from its extension.
    File(String),
}

impl Source {
    /// Wrap an in-memory value as a new inline source.
    pub fn inline(value: Value) -> Self {
        Self::Inline(Arc::new(value))
    }

    /// Reference a file by path.
    pub fn file(path: impl Into<String>) -> Self {
        Self::File(path.into())
    }

    /// Identity comparison: pointer identity for inline values, exact string
    /// equality for file paths.
    pub fn is_same(&self, other: &Source) -> bool {
        match (self, other) {
            (Self::Inline(a), Self::Inline(b)) => Arc::ptr_eq(a, b),
            (Self::File(a), Self::File(b)) => a == b,
            _ => false,
        }
    }

    /// The file path, for file sources.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(Path::new(path)),
            Self::Inline(_) => None,
        }
    }

    /// Human-readable name for logging.
    pub fn name(&self) -> String {
        match self {
            Self::Inline(_) => "inline".to_string(),
            Self::File(path) => format!("file:{}", path),
        }
    }
}

impl From<Value> for Source {
    fn from(value: Value) -> Self {
        Self::inline(value)
    }
}

impl From<Arc<Value>> for Source {
    fn from(value: Arc<Value>) -> Self {
        Self::Inline(value)
    }
}

impl From<&str> for Source {
    fn from(path: &str) -> Self {
        Self::file(path)
    }
}

impl From<String> for Source {
    fn from(path: String) -> Self {
        Self::File(path)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(value) => f
                .debug_tuple("Inline")
                .field(&Arc::as_ptr(value))
                .finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

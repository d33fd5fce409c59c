//! Error types for layerstack-config.

use std::sync::Arc;

/// Result type alias for layerstack-config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or reading configuration.
///
/// The type is `Clone` because a single load outcome is handed to every
/// caller that joined the same in-flight pass.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// The accessor has not completed a successful load yet.
    #[error("Configuration is not ready: no load has completed successfully")]
    NotReady,

    /// The global registry was read before `init` was ever called.
    #[error("Global configuration has not been initialized")]
    NotInitialized,

    /// No decoder is registered for the file's extension.
    #[error("Unsupported configuration format '{extension}' for file: {path}")]
    UnsupportedFormat {
        /// Path of the offending file source
        path: String,
        /// The extension that was looked up (empty if the file has none)
        extension: String,
    },

    /// A strict-grammar decoder rejected the file content.
    #[error("Failed to decode {format} file '{path}': {message}")]
    Decode {
        /// Path of the file being decoded
        path: String,
        /// Format name of the decoder that failed
        format: &'static str,
        /// Decoder error message
        message: String,
    },

    /// The file could not be read.
    #[error("IO error reading '{path}': {source}")]
    Io {
        /// Path of the file being read
        path: String,
        /// Underlying IO error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A resolved value could not be converted into the requested type.
    #[error("Failed to deserialize configuration value: {0}")]
    Deserialize(String),

    /// File watching failed to initialize.
    #[error("File watching error: {0}")]
    Watch(String),

    /// Generic error for other cases.
    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(err),
        }
    }

    /// Returns `true` for errors that abort a load pass, as opposed to
    /// contract violations like reading before the first load.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. } | Self::Decode { .. } | Self::Io { .. } | Self::Other(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_unsupported_format() {
        let err = ConfigError::UnsupportedFormat {
            path: "app.ini".to_string(),
            extension: "ini".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported configuration format 'ini' for file: app.ini"
        );
    }

    #[test]
    fn test_io_error_is_cloneable() {
        let err = ConfigError::io(
            "missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let cloned = err.clone();
        assert!(cloned.to_string().contains("missing.json"));
        assert!(cloned.is_load_failure());
    }

    #[test]
    fn test_contract_errors_are_not_load_failures() {
        assert!(!ConfigError::NotReady.is_load_failure());
        assert!(!ConfigError::NotInitialized.is_load_failure());
    }
}

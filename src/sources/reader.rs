//! Raw file reading for file sources.

use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use std::path::Path;

/// Reads a file source into UTF-8 text.
///
/// Implement this to load configuration from somewhere other than the local
/// filesystem, or to observe reads in tests.
#[async_trait]
pub trait FileReader: Send + Sync {
    /// Read the whole file as text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read or is not UTF-8.
    async fn read_to_string(&self, path: &Path) -> Result<String>;
}

/// Reads from the local filesystem with `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;

#[async_trait]
impl FileReader for FsReader {
    async fn read_to_string(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::io(path.display().to_string(), e))
    }
}

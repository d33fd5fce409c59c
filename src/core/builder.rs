//! Builder for constructing ConfigAccessor instances.

use crate::core::{ConfigAccessor, ConfigLoader};
use crate::error::Result;
use crate::sources::{Decoder, DecoderRegistry, FileReader, FsReader, ScriptEvaluator, Source};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Builder for a [`ConfigAccessor`].
///
/// Sources are kept in the order they are added; later sources have higher
/// priority. [`with_defaults`](Self::with_defaults) always goes to the front.
///
/// # Examples
///
/// ```rust,no_run
/// use layerstack_config::prelude::*;
/// use serde_json::json;
///
/// # async fn example() -> Result<()> {
/// let config = ConfigAccessor::builder()
///     .with_defaults(json!({"log_level": "info"}))
///     .with_file("config/default.yaml")
///     .with_file("config/production.toml")
///     .build_and_load()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigAccessorBuilder {
    sources: Vec<Source>,
    reader: Arc<dyn FileReader>,
    decoders: DecoderRegistry,
    scripts: HashMap<String, Arc<dyn ScriptEvaluator>>,
}

impl ConfigAccessorBuilder {
    /// Create a builder with the filesystem reader and default decoders.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            reader: Arc::new(FsReader),
            decoders: DecoderRegistry::default(),
            scripts: HashMap::new(),
        }
    }

    /// Insert a lowest-priority inline value.
    pub fn with_defaults(mut self, defaults: Value) -> Self {
        self.sources.insert(0, Source::inline(defaults));
        self
    }

    /// Append an inline value.
    pub fn with_value(mut self, value: Value) -> Self {
        self.sources.push(Source::inline(value));
        self
    }

    /// Append a file source; its format is chosen by extension at load time.
    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.sources.push(Source::file(path));
        self
    }

    /// Append any source.
    pub fn with_source(mut self, source: impl Into<Source>) -> Self {
        self.sources.push(source.into());
        self
    }

    /// Append several sources in order.
    pub fn with_sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Source>,
    {
        self.sources.extend(sources.into_iter().map(Into::into));
        self
    }

    /// Replace the file reader.
    pub fn with_reader(mut self, reader: impl FileReader + 'static) -> Self {
        self.reader = Arc::new(reader);
        self
    }

    /// Register or replace the decoder for a file extension.
    pub fn with_decoder(mut self, extension: &str, decoder: impl Decoder + 'static) -> Self {
        self.decoders.register(extension, decoder);
        self
    }

    /// Treat files with this extension as scripts evaluated by `evaluator`.
    ///
    /// The evaluator runs with full host-process privilege. Script sources
    /// take precedence over any decoder registered for the same extension.
    pub fn with_script(
        mut self,
        extension: &str,
        evaluator: impl ScriptEvaluator + 'static,
    ) -> Self {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self.scripts.insert(extension, Arc::new(evaluator));
        self
    }

    /// Build a not-yet-loaded accessor.
    pub fn build(self) -> ConfigAccessor {
        let loader = ConfigLoader::new(self.reader, self.decoders, self.scripts);
        ConfigAccessor::from_parts(self.sources, loader)
    }

    /// Build the accessor and perform the first load.
    ///
    /// # Errors
    ///
    /// Returns the error of the first load.
    pub async fn build_and_load(self) -> Result<ConfigAccessor> {
        let accessor = self.build();
        accessor.load_configs().await?;
        Ok(accessor)
    }
}

impl Default for ConfigAccessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_accumulates_sources_in_order() {
        let builder = ConfigAccessorBuilder::new()
            .with_file("config1.yaml")
            .with_value(json!({"a": 1}))
            .with_file("config2.yaml");

        assert_eq!(builder.sources.len(), 3);
        assert!(builder.sources[0].is_same(&Source::file("config1.yaml")));
        assert!(builder.sources[2].is_same(&Source::file("config2.yaml")));
    }

    #[test]
    fn test_defaults_go_first() {
        let builder = ConfigAccessorBuilder::new()
            .with_file("config.yaml")
            .with_defaults(json!({"a": 0}));

        assert!(matches!(builder.sources[0], Source::Inline(_)));
        assert!(builder.sources[1].is_same(&Source::file("config.yaml")));
    }

    #[tokio::test]
    async fn test_custom_decoder() {
        struct Upper;

        impl Decoder for Upper {
            fn format(&self) -> &'static str {
                "upper"
            }

            fn decode(&self, text: &str) -> std::result::Result<Value, String> {
                Ok(json!({"text": text.to_uppercase()}))
            }
        }

        struct Fixed;

        #[async_trait::async_trait]
        impl FileReader for Fixed {
            async fn read_to_string(&self, _path: &std::path::Path) -> Result<String> {
                Ok("hello".to_string())
            }
        }

        let config = ConfigAccessorBuilder::new()
            .with_reader(Fixed)
            .with_decoder("up", Upper)
            .with_file("greeting.up")
            .build_and_load()
            .await
            .unwrap();

        assert_eq!(config.get("text", "").unwrap().as_str(), Some("HELLO"));
    }
}

//! Resolves every source concurrently and merges the results.

use crate::error::{ConfigError, Result};
use crate::merge::merge_layers;
use crate::sources::{DecoderRegistry, FileReader, ScriptEvaluator, Source, extension_of};
use crate::value::ConfigValue;
use futures::future::try_join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns a source list into one frozen tree.
///
/// All sources are resolved concurrently; the pass fails as a whole if any
/// single source fails (script sources excepted, see
/// [`ScriptEvaluator`]).
pub(crate) struct ConfigLoader {
    reader: Arc<dyn FileReader>,
    decoders: DecoderRegistry,
    scripts: HashMap<String, Arc<dyn ScriptEvaluator>>,
}

impl ConfigLoader {
    pub(crate) fn new(
        reader: Arc<dyn FileReader>,
        decoders: DecoderRegistry,
        scripts: HashMap<String, Arc<dyn ScriptEvaluator>>,
    ) -> Self {
        Self {
            reader,
            decoders,
            scripts,
        }
    }

    /// Resolve, merge in list order and freeze.
    pub(crate) async fn load(&self, sources: &[Source]) -> Result<ConfigValue> {
        let resolved = try_join_all(sources.iter().map(|source| self.resolve(source))).await?;
        Ok(ConfigValue::from(merge_layers(resolved)))
    }

    async fn resolve(&self, source: &Source) -> Result<Value> {
        let path = match source {
            Source::Inline(value) => return Ok(Value::clone(value)),
            Source::File(path) => path,
        };

        let extension = extension_of(path);
        if let Some(evaluator) = self.scripts.get(&extension) {
            return Ok(self.evaluate_script(evaluator.as_ref(), path).await);
        }
        if !self.decoders.supports(&extension) {
            return Err(ConfigError::UnsupportedFormat {
                path: path.clone(),
                extension,
            });
        }

        let text = self.reader.read_to_string(Path::new(path)).await?;
        let value = self.decoders.decode(path, &text)?;
        debug!(source = %source.name(), "resolved configuration source");
        Ok(value)
    }

    async fn evaluate_script(&self, evaluator: &dyn ScriptEvaluator, path: &str) -> Value {
        match evaluator.evaluate(Path::new(path)).await {
            Ok(output) => output.into_value(),
            Err(message) => {
                warn!(path, error = %message, "script source failed, contributing an empty map");
                Value::Object(serde_json::Map::new())
            }
        }
    }
}

//! Text-to-tree decoders keyed by file extension.

use crate::error::{ConfigError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Decodes file content into a plain nested value.
///
/// Decoders are strict: a malformed document is an error and aborts the
/// whole load pass.
pub trait Decoder: Send + Sync {
    /// Short format name used in error messages (e.g. `"json"`).
    fn format(&self) -> &'static str;

    /// Decode `text` into a tree.
    ///
    /// # Errors
    ///
    /// Returns the decoder's message; the loader wraps it with the file path.
    fn decode(&self, text: &str) -> std::result::Result<Value, String>;
}

/// Strict JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn format(&self) -> &'static str {
        "json"
    }

    fn decode(&self, text: &str) -> std::result::Result<Value, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }
}

/// YAML via `serde_yaml`.
#[cfg(feature = "yaml")]
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlDecoder;

#[cfg(feature = "yaml")]
impl Decoder for YamlDecoder {
    fn format(&self) -> &'static str {
        "yaml"
    }

    fn decode(&self, text: &str) -> std::result::Result<Value, String> {
        if text.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        // A document holding only comments is null, which would otherwise
        // wipe every lower layer.
        match serde_yaml::from_str(text) {
            Ok(Value::Null) => Ok(Value::Object(serde_json::Map::new())),
            Ok(value) => Ok(value),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// TOML via `toml`.
#[cfg(feature = "toml")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlDecoder;

#[cfg(feature = "toml")]
impl Decoder for TomlDecoder {
    fn format(&self) -> &'static str {
        "toml"
    }

    fn decode(&self, text: &str) -> std::result::Result<Value, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}

/// Maps lower-cased file extensions to decoders.
///
/// [`DecoderRegistry::default`] registers `json`, and `yaml`/`yml`/`toml`
/// when their features are enabled.
#[derive(Clone)]
pub struct DecoderRegistry {
    decoders: HashMap<String, Arc<dyn Decoder>>,
}

impl DecoderRegistry {
    /// A registry with no decoders at all.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register (or replace) the decoder for an extension.
    pub fn register(&mut self, extension: &str, decoder: impl Decoder + 'static) {
        self.decoders
            .insert(normalize_extension(extension), Arc::new(decoder));
    }

    /// Look up the decoder for an extension.
    pub fn get(&self, extension: &str) -> Option<&Arc<dyn Decoder>> {
        self.decoders.get(&normalize_extension(extension))
    }

    /// Returns `true` if a decoder is registered for the extension.
    pub fn supports(&self, extension: &str) -> bool {
        self.get(extension).is_some()
    }

    /// Decode `text` read from `path` using the decoder for its extension.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnsupportedFormat`] if no decoder matches
    /// - [`ConfigError::Decode`] if the content is malformed
    pub fn decode(&self, path: &str, text: &str) -> Result<Value> {
        let extension = extension_of(path);
        let decoder = self
            .get(&extension)
            .ok_or_else(|| ConfigError::UnsupportedFormat {
                path: path.to_string(),
                extension: extension.clone(),
            })?;
        decoder.decode(text).map_err(|message| ConfigError::Decode {
            path: path.to_string(),
            format: decoder.format(),
            message,
        })
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("json", JsonDecoder);
        #[cfg(feature = "yaml")]
        {
            registry.register("yaml", YamlDecoder);
            registry.register("yml", YamlDecoder);
        }
        #[cfg(feature = "toml")]
        registry.register("toml", TomlDecoder);
        registry
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut extensions: Vec<_> = self.decoders.keys().collect();
        extensions.sort();
        f.debug_struct("DecoderRegistry")
            .field("extensions", &extensions)
            .finish()
    }
}

/// Lower-cased extension of a path, or an empty string if it has none.
pub(crate) fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(normalize_extension)
        .unwrap_or_default()
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("config/app.JSON"), "json");
        assert_eq!(extension_of("app.prod.yml"), "yml");
        assert_eq!(extension_of("Makefile"), "");
    }

    #[test]
    fn test_decode_json() {
        let registry = DecoderRegistry::default();
        let value = registry.decode("app.json", r#"{"a": [1, 2]}"#).unwrap();
        assert_eq!(value, json!({"a": [1, 2]}));
    }

    #[test]
    fn test_decode_json_malformed() {
        let registry = DecoderRegistry::default();
        let err = registry.decode("app.json", "{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Decode { format: "json", .. }));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_decode_yaml() {
        let registry = DecoderRegistry::default();
        let value = registry
            .decode("app.yml", "server:\n  port: 8080\n  tags: [a, b]\n")
            .unwrap();
        assert_eq!(value, json!({"server": {"port": 8080, "tags": ["a", "b"]}}));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_decode_yaml_empty_document() {
        let registry = DecoderRegistry::default();
        assert_eq!(registry.decode("empty.yaml", "\n").unwrap(), json!({}));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_decode_yaml_malformed() {
        let registry = DecoderRegistry::default();
        let err = registry.decode("bad.yaml", "a: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Decode { format: "yaml", .. }));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_decode_toml() {
        let registry = DecoderRegistry::default();
        let value = registry
            .decode("app.toml", "[server]\nport = 8080\nhost = \"localhost\"\n")
            .unwrap();
        assert_eq!(value, json!({"server": {"port": 8080, "host": "localhost"}}));
    }

    #[test]
    fn test_unsupported_extension() {
        let registry = DecoderRegistry::default();
        let err = registry.decode("app.ini", "a=1").unwrap_err();
        match err {
            ConfigError::UnsupportedFormat { path, extension } => {
                assert_eq!(path, "app.ini");
                assert_eq!(extension, "ini");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_register_custom_decoder() {
        struct Lines;

        impl Decoder for Lines {
            fn format(&self) -> &'static str {
                "lines"
            }

            fn decode(&self, text: &str) -> std::result::Result<Value, String> {
                Ok(Value::Array(
                    text.lines().map(|l| Value::String(l.to_string())).collect(),
                ))
            }
        }

        let mut registry = DecoderRegistry::empty();
        assert!(!registry.supports("json"));
        registry.register(".LST", Lines);
        assert!(registry.supports("lst"));
        let value = registry.decode("hosts.lst", "a\nb").unwrap();
        assert_eq!(value, json!(["a", "b"]));
    }
}

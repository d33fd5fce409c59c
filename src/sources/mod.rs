//! Configuration sources and the collaborators that resolve them.

mod decoder;
mod reader;
mod script;
mod source;

pub use decoder::{Decoder, DecoderRegistry, JsonDecoder};
pub(crate) use decoder::extension_of;
#[cfg(feature = "toml")]
pub use decoder::TomlDecoder;
#[cfg(feature = "yaml")]
pub use decoder::YamlDecoder;
pub use reader::{FileReader, FsReader};
#[cfg(feature = "script")]
pub use script::CommandEvaluator;
pub use script::{ScriptEvaluator, ScriptOutput};
pub use source::Source;

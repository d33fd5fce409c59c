//! Core configuration management types.

mod accessor;
mod builder;
mod loader;

#[cfg(feature = "file-watch")]
pub use accessor::WatchHandle;
pub use accessor::{ConfigAccessor, LoadHandle};
pub use builder::ConfigAccessorBuilder;
pub(crate) use loader::ConfigLoader;

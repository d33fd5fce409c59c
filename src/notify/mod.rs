//! Change notification: subscribers called after each publish, and
//! file watching that triggers reloads.

pub mod subscriber;
#[cfg(feature = "file-watch")]
pub mod watcher;

pub use subscriber::{SubscriberRegistry, SubscriptionHandle};
#[cfg(feature = "file-watch")]
pub use watcher::ConfigWatcher;

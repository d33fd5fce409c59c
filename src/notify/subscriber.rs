//! Callbacks invoked after each successful publish.

use crate::value::ConfigValue;
use parking_lot::RwLock;
use std::sync::Arc;

type Callback = Arc<dyn Fn(&ConfigValue) + Send + Sync>;

/// Handle for a subscription that can be dropped to unsubscribe.
pub struct SubscriptionHandle {
    id: usize,
    registry: Arc<RwLock<SubscriberRegistryInner>>,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        let id = self.id;
        self.registry
            .write()
            .subscribers
            .retain(|(sub_id, _)| *sub_id != id);
    }
}

struct SubscriberRegistryInner {
    subscribers: Vec<(usize, Callback)>,
    next_id: usize,
}

/// Registry of configuration change subscribers.
///
/// # Examples
///
/// ```rust
/// use layerstack_config::notify::SubscriberRegistry;
/// use layerstack_config::value::ConfigValue;
///
/// let registry = SubscriberRegistry::new();
/// let handle = registry.subscribe(|tree| println!("new config: {tree}"));
///
/// registry.notify_all(&ConfigValue::empty_map());
///
/// // Unsubscribe by dropping the handle
/// drop(handle);
/// assert_eq!(registry.subscriber_count(), 0);
/// ```
pub struct SubscriberRegistry {
    inner: Arc<RwLock<SubscriberRegistryInner>>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SubscriberRegistryInner {
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Register a callback that receives every newly published tree.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ConfigValue) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));

        SubscriptionHandle {
            id,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Call every subscriber, in subscription order.
    ///
    /// Runs without holding the registry lock, so a callback may subscribe
    /// or drop a handle; the change applies from the next notification.
    pub fn notify_all(&self, tree: &ConfigValue) {
        let callbacks: Vec<Callback> = self
            .inner
            .read()
            .subscribers
            .iter()
            .map(|(_id, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(tree);
        }
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.read().subscribers.len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Priority-ordered deep merge of resolved source values.
//!
//! - Maps merge recursively, key by key
//! - Sequences are replaced wholesale, never concatenated
//! - Scalars (including null) from the higher priority side win

use serde_json::Value;

/// Deep merge `overlay` onto `base`; `overlay` has the higher priority.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Merge resolved layers in list order; the last layer has the highest priority.
///
/// An empty list merges to an empty map.
pub fn merge_layers(layers: impl IntoIterator<Item = Value>) -> Value {
    layers
        .into_iter()
        .fold(Value::Object(serde_json::Map::new()), deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_later_source_wins() {
        let merged = merge_layers([json!({"a": 1, "b": 1}), json!({"b": 2, "c": 2})]);
        assert_eq!(merged, json!({"a": 1, "b": 2, "c": 2}));
    }

    #[test]
    fn test_sequences_replaced() {
        let merged = merge_layers([json!({"list": [1, 2, 3]}), json!({"list": [9]})]);
        assert_eq!(merged, json!({"list": [9]}));
    }

    #[test]
    fn test_nested_maps_merge() {
        let merged = merge_layers([
            json!({"x": {"p": 1, "q": 1}}),
            json!({"x": {"q": 2, "r": 2}}),
        ]);
        assert_eq!(merged, json!({"x": {"p": 1, "q": 2, "r": 2}}));
    }

    #[test]
    fn test_scalar_replaces_map() {
        let merged = merge_layers([json!({"db": {"host": "a"}}), json!({"db": "sqlite"})]);
        assert_eq!(merged, json!({"db": "sqlite"}));
    }

    #[test]
    fn test_map_replaces_scalar() {
        let merged = merge_layers([json!({"db": "sqlite"}), json!({"db": {"host": "a"}})]);
        assert_eq!(merged, json!({"db": {"host": "a"}}));
    }

    #[test]
    fn test_null_overrides() {
        let merged = merge_layers([json!({"a": 1}), json!({"a": null})]);
        assert_eq!(merged, json!({"a": null}));
    }

    #[test]
    fn test_empty_layers() {
        assert_eq!(merge_layers(Vec::new()), json!({}));
    }

    #[test]
    fn test_deep_nested_merge() {
        let merged = merge_layers([
            json!({"l1": {"l2": {"l3": {"a": 1, "b": 2}}}}),
            json!({"l1": {"l2": {"l3": {"b": 3, "c": 4}}}}),
            json!({"l1": {"l2": {"extra": true}}}),
        ]);
        assert_eq!(
            merged,
            json!({"l1": {"l2": {"l3": {"a": 1, "b": 3, "c": 4}, "extra": true}}})
        );
    }
}

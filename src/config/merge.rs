//! Deep merge over configuration trees.
//!
//! Decision table per value kind:
//! - object over object: recurse key by key
//! - array or primitive: overlay replaces the base value entirely
//! - null/absent overlay keys: never override a present base value
//!
//! Arrays are never concatenated.

use serde_json::Value;

/// Merge `overlay` onto `base` in place.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                if overlay_value.is_null() {
                    continue;
                }
                match base_map.get_mut(key) {
                    Some(base_value) if base_value.is_object() && overlay_value.is_object() => {
                        deep_merge(base_value, overlay_value);
                    }
                    _ => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            if !overlay_value.is_null() {
                *base_slot = overlay_value.clone();
            }
        }
    }
}

/// Merge ordered layers, lowest precedence first, into one tree.
///
/// Absent (`None`) layers are skipped; the first layer seeds the result.
pub fn merge_layers(layers: &[Option<&Value>]) -> Value {
    let mut result = Value::Object(serde_json::Map::new());
    for layer in layers.iter().flatten() {
        deep_merge(&mut result, layer);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn objects_merge_recursively() {
        let mut base = json!({"a": {"x": 1, "y": 2}, "b": true});
        deep_merge(&mut base, &json!({"a": {"y": 3, "z": 4}}));
        assert_eq!(base, json!({"a": {"x": 1, "y": 3, "z": 4}, "b": true}));
    }

    #[test]
    fn arrays_replace_rather_than_append() {
        let mut base = json!({"subnets": ["a", "b"]});
        deep_merge(&mut base, &json!({"subnets": ["c"]}));
        assert_eq!(base, json!({"subnets": ["c"]}));
    }

    #[test]
    fn primitives_replace() {
        let mut base = json!({"retentionDays": 7});
        deep_merge(&mut base, &json!({"retentionDays": 30}));
        assert_eq!(base, json!({"retentionDays": 30}));
    }

    #[test]
    fn null_overlay_never_clobbers() {
        let mut base = json!({"retentionDays": 7, "nested": {"keep": true}});
        deep_merge(&mut base, &json!({"retentionDays": null, "nested": {"keep": null}}));
        assert_eq!(base, json!({"retentionDays": 7, "nested": {"keep": true}}));
    }

    #[test]
    fn object_replaces_primitive_and_vice_versa() {
        let mut base = json!({"alerting": "none"});
        deep_merge(&mut base, &json!({"alerting": {"mode": "email"}}));
        assert_eq!(base, json!({"alerting": {"mode": "email"}}));

        let mut base = json!({"alerting": {"mode": "email"}});
        deep_merge(&mut base, &json!({"alerting": "none"}));
        assert_eq!(base, json!({"alerting": "none"}));
    }

    #[test]
    fn layer_precedence_is_last_wins() {
        let fallback = json!({"retentionDays": 7, "encryption": {"enabled": false}});
        let compliance = json!({"retentionDays": 30, "encryption": {"enabled": true}});
        let manifest = json!({"retentionDays": 14});

        let merged = merge_layers(&[
            Some(&fallback),
            None,
            Some(&compliance),
            Some(&manifest),
            None,
        ]);
        assert_eq!(
            merged,
            json!({"retentionDays": 14, "encryption": {"enabled": true}})
        );
    }
}

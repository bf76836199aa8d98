use serde_json::Value;

/// Objects merge recursively; anything else (arrays, scalars) is replaced
/// wholesale by the later layer — same rule as `mqk-config::deep_merge`.
pub fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => *dst_slot = src_val,
    }
}

/// Sorts object keys recursively and renders compact JSON, so the same
/// logical config always hashes to the same bytes regardless of the layer
/// order keys first appeared in.
pub fn canonicalize(v: &Value) -> String {
    serde_json::to_string(&sort_keys(v)).expect("canonical json serialization must not fail")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut sorted = serde_json::Map::new();
            for k in keys {
                sorted.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn later_layer_overrides_scalar_but_keeps_sibling_keys() {
        let mut dst = json!({"a": 1, "b": {"c": 2, "d": 3}});
        deep_merge(&mut dst, json!({"b": {"c": 99}}));
        assert_eq!(dst, json!({"a": 1, "b": {"c": 99, "d": 3}}));
    }

    #[test]
    fn canonicalize_is_stable_regardless_of_key_order() {
        let a = canonicalize(&json!({"b": 1, "a": 2}));
        let b = canonicalize(&json!({"a": 2, "b": 1}));
        assert_eq!(a, b);
    }
}

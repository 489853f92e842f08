//! Free-form payload pruning
//!
//! The `data` block of a record may hold arbitrary nested JSON, within two
//! limits:
//! - lists hold at most [`MAX_LIST_LENGTH`] elements and never nest lists
//! - at most [`MAX_TOTAL_KEYS`] dict keys across the whole walk
//!
//! The key counter is shared by every branch of the walk. Offending
//! subtrees are dropped and reported as warnings, never as hard errors.

use serde_json::{Map, Value};

pub const MAX_LIST_LENGTH: usize = 5;
pub const MAX_TOTAL_KEYS: usize = 20;

/// Limits applied while pruning a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadLimits {
    pub max_list_length: usize,
    pub max_total_keys: usize,
}

impl Default for PayloadLimits {
    fn default() -> Self {
        Self {
            max_list_length: MAX_LIST_LENGTH,
            max_total_keys: MAX_TOTAL_KEYS,
        }
    }
}

/// Result of pruning a payload
#[derive(Debug, Clone, PartialEq)]
pub struct PrunedPayload {
    /// The payload with offending subtrees removed, `None` if the root itself
    /// was rejected
    pub value: Option<Value>,
    pub warnings: Vec<String>,
}

/// Prunes `value` against `limits`.
pub fn prune_user_data(value: &Value, limits: PayloadLimits) -> PrunedPayload {
    let mut warnings = Vec::new();
    let mut key_count = 0usize;
    let value = walk(value, "data", limits, &mut key_count, &mut warnings);
    PrunedPayload { value, warnings }
}

fn walk(
    value: &Value,
    path: &str,
    limits: PayloadLimits,
    key_count: &mut usize,
    warnings: &mut Vec<String>,
) -> Option<Value> {
    match value {
        Value::Array(items) => {
            if items.len() > limits.max_list_length {
                warnings.push(format!(
                    "{}: list of {} elements exceeds the maximum of {}",
                    path,
                    items.len(),
                    limits.max_list_length
                ));
                return None;
            }
            if items.iter().any(Value::is_array) {
                warnings.push(format!("{}: multi-dimensional lists are not allowed", path));
                return None;
            }

            let mut kept = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, i);
                if let Some(item) = walk(item, &item_path, limits, key_count, warnings) {
                    kept.push(item);
                }
            }
            Some(Value::Array(kept))
        }
        Value::Object(map) => {
            let mut kept = Map::new();
            for (key, child) in map {
                *key_count += 1;
                if *key_count > limits.max_total_keys {
                    warnings.push(format!(
                        "{}: payload exceeds the maximum of {} keys",
                        path, limits.max_total_keys
                    ));
                    return None;
                }
                let child_path = format!("{}.{}", path, key);
                if let Some(child) = walk(child, &child_path, limits, key_count, warnings) {
                    kept.insert(key.clone(), child);
                }
            }
            Some(Value::Object(kept))
        }
        other => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(prefix: &str, n: usize) -> Value {
        let mut map = Map::new();
        for i in 0..n {
            map.insert(format!("{}{}", prefix, i), json!(i));
        }
        Value::Object(map)
    }

    #[test]
    fn test_small_payload_passes_unchanged() {
        let payload = json!({"a": 1, "b": {"c": [1, 2, 3]}, "d": "text"});
        let pruned = prune_user_data(&payload, PayloadLimits::default());
        assert_eq!(pruned.value, Some(payload));
        assert!(pruned.warnings.is_empty());
    }

    #[test]
    fn test_long_list_dropped() {
        let payload = json!({"ok": [1, 2, 3, 4, 5], "long": [1, 2, 3, 4, 5, 6]});
        let pruned = prune_user_data(&payload, PayloadLimits::default());

        assert_eq!(pruned.value, Some(json!({"ok": [1, 2, 3, 4, 5]})));
        assert_eq!(pruned.warnings.len(), 1);
        assert!(pruned.warnings[0].contains("data.long"));
    }

    #[test]
    fn test_nested_list_dropped() {
        let payload = json!({"matrix": [[1, 2], [3, 4]], "keep": true});
        let pruned = prune_user_data(&payload, PayloadLimits::default());

        assert_eq!(pruned.value, Some(json!({"keep": true})));
        assert!(pruned.warnings[0].contains("multi-dimensional"));
    }

    #[test]
    fn test_key_budget_is_shared_across_siblings() {
        // "first" + 10 keys = 11, "second" = 12, then the 9th child of
        // "second" brings the total to 21
        let payload = json!({"first": keys("a", 10), "second": keys("b", 10)});
        let pruned = prune_user_data(&payload, PayloadLimits::default());

        let value = pruned.value.unwrap();
        assert!(value.get("first").is_some());
        assert!(value.get("second").is_none());
        assert_eq!(pruned.warnings.len(), 1);
        assert!(pruned.warnings[0].contains("data.second"));
    }

    #[test]
    fn test_flat_payload_over_budget_rejects_root() {
        let pruned = prune_user_data(&keys("k", 21), PayloadLimits::default());
        assert_eq!(pruned.value, None);
        assert_eq!(pruned.warnings.len(), 1);
    }

    #[test]
    fn test_exact_budget_allowed() {
        let pruned = prune_user_data(&keys("k", 20), PayloadLimits::default());
        assert!(pruned.value.is_some());
        assert!(pruned.warnings.is_empty());
    }
}

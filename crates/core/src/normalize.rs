//! Flow-document normalization.
//!
//! Connect exports carry volatile metadata (modification timestamps, editor
//! identity, service-assigned versions) and jittery editor coordinates that
//! make textual diffs useless. `normalize` strips the noise and
//! canonicalizes the document so that structurally identical flows
//! serialize byte-identically.
//!
//! The function is pure, total, and idempotent:
//! `normalize(normalize(x)) == normalize(x)` for any JSON value.

use serde_json::{Map, Value};

/// Keys removed wherever they appear, at any depth.
const VOLATILE_KEYS: &[&str] = &[
    "LastModifiedTime",
    "LastModifiedRegion",
    "CreatedByName",
    "Version",
    "VersionDescription",
    "FlowContentSha256",
    "Status",
];

/// Keys whose numeric values are editor layout coordinates.
const POSITION_KEYS: &[&str] = &["x", "y"];

/// Normalize a flow document. Applied in order: volatile-key removal,
/// coordinate quantization, canonical key order, empty-container pruning.
///
/// Non-object roots pass through the same walk; scalars come back unchanged.
pub fn normalize(doc: &Value) -> Value {
    prune(walk(doc)).unwrap_or(Value::Null)
}

/// Strip volatile keys and quantize coordinates, rebuilding every object.
/// serde_json's map is BTreeMap-backed, so rebuilding also yields
/// lexicographic key order at every level.
fn walk(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, v) in map {
                if VOLATILE_KEYS.contains(&key.as_str()) {
                    continue;
                }
                let v = if POSITION_KEYS.contains(&key.as_str()) && v.is_number() {
                    quantize(v)
                } else {
                    walk(v)
                };
                out.insert(key.clone(), v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(walk).collect()),
        other => other.clone(),
    }
}

/// Round a numeric value to the nearest multiple of 10, half away from zero
/// toward positive infinity (123 -> 120, 456 -> 460, 125 -> 130).
fn quantize(v: &Value) -> Value {
    let n = match v.as_f64() {
        Some(n) => n,
        None => return v.clone(),
    };
    let rounded = ((n / 10.0) + 0.5).floor() * 10.0;
    // Keep integers as integers; exports never use fractional coordinates.
    if rounded >= i64::MIN as f64 && rounded <= i64::MAX as f64 {
        Value::from(rounded as i64)
    } else {
        Value::from(rounded)
    }
}

/// Drop null leaves and empty containers, bottom-up, so noise removal never
/// leaves dangling empty structure behind. Returns None when the value
/// itself should disappear from its parent.
fn prune(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let out: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| prune(v).map(|v| (k, v)))
                .collect();
            if out.is_empty() {
                None
            } else {
                Some(Value::Object(out))
            }
        }
        Value::Array(items) => {
            let out: Vec<Value> = items.into_iter().filter_map(prune).collect();
            if out.is_empty() {
                None
            } else {
                Some(Value::Array(out))
            }
        }
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_volatile_keys_at_depth() {
        let doc = json!({
            "Name": "greeting",
            "Version": 7,
            "Content": {
                "LastModifiedTime": "2024-01-01T00:00:00Z",
                "Actions": [{"Identifier": "a", "Status": "SAVED"}]
            }
        });
        let out = normalize(&doc);
        assert_eq!(
            out,
            json!({
                "Content": {"Actions": [{"Identifier": "a"}]},
                "Name": "greeting"
            })
        );
    }

    #[test]
    fn quantizes_positions_to_nearest_ten() {
        let doc = json!({"position": {"x": 123, "y": 456}});
        let out = normalize(&doc);
        assert_eq!(out, json!({"position": {"x": 120, "y": 460}}));
    }

    #[test]
    fn quantizes_half_up() {
        let doc = json!({"position": {"x": 125, "y": 124.9}});
        let out = normalize(&doc);
        assert_eq!(out, json!({"position": {"x": 130, "y": 120}}));
    }

    #[test]
    fn prunes_empty_containers_bottom_up() {
        // Once Version is removed, Metadata is empty and must go too.
        let doc = json!({
            "Name": "x",
            "Metadata": {"Version": "1"},
            "Tags": {},
            "Notes": null
        });
        assert_eq!(normalize(&doc), json!({"Name": "x"}));
    }

    #[test]
    fn array_contents_are_normalized_but_order_kept() {
        let doc = json!({"Actions": [{"b": 1, "a": 2}, {"Version": "x", "keep": true}]});
        let out = normalize(&doc);
        let actions = out["Actions"].as_array().unwrap();
        assert_eq!(actions[0], json!({"a": 2, "b": 1}));
        assert_eq!(actions[1], json!({"keep": true}));
    }

    #[test]
    fn idempotent() {
        let doc = json!({
            "Name": "flow",
            "Version": 3,
            "Content": {
                "Actions": [
                    {"Identifier": "start", "Metadata": {"position": {"x": 123.4, "y": 87}}},
                    {"Identifier": "end", "Transitions": {}}
                ],
                "StartAction": "start"
            }
        });
        let once = normalize(&doc);
        let twice = normalize(&once);
        assert_eq!(once, twice);
        assert_eq!(
            serde_json::to_string(&once).unwrap(),
            serde_json::to_string(&twice).unwrap()
        );
    }

    #[test]
    fn non_object_roots_pass_through() {
        assert_eq!(normalize(&json!("plain")), json!("plain"));
        assert_eq!(normalize(&json!(42)), json!(42));
    }

    #[test]
    fn structurally_identical_exports_serialize_identically() {
        let a = json!({"Name": "f", "Version": 1, "Content": {"z": 1, "a": 2}});
        let b = json!({"Content": {"a": 2, "z": 1}, "Version": 9, "Name": "f"});
        assert_eq!(
            serde_json::to_string(&normalize(&a)).unwrap(),
            serde_json::to_string(&normalize(&b)).unwrap()
        );
    }
}

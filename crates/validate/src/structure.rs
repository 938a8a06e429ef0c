//! Flow-structure sanity heuristics. Warning-level only.
//!
//! Checks that a flow has the expected lifecycle anchors (an entry action,
//! a disconnect) and that disconnect is not suspiciously close to the entry.
//! "Close" is measured as graph distance over action transitions, never as
//! an offset into serialized text.

use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};

use crate::report::ValidationReport;

const DISCONNECT_TYPE: &str = "DisconnectParticipant";

/// Hops from entry at or below which a disconnect looks like an
/// immediate-hangup defect.
const IMMEDIATE_HANGUP_DEPTH: usize = 2;

pub fn check_structure(template_name: &str, template: &Value, report: &mut ValidationReport) {
    let Some(content) = flow_content(template) else {
        report.warning(
            "structure",
            Some(template_name),
            format!("'{}' has no parseable flow content", template_name),
        );
        return;
    };

    let start = content.get("StartAction").and_then(Value::as_str);
    let actions: BTreeMap<&str, &Value> = content
        .get("Actions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|a| a.get("Identifier").and_then(Value::as_str).map(|id| (id, a)))
                .collect()
        })
        .unwrap_or_default();

    let Some(start) = start.filter(|id| actions.contains_key(id)) else {
        report.warning(
            "structure",
            Some(template_name),
            format!("'{}' is missing a flow-start marker", template_name),
        );
        return;
    };

    let has_disconnect = actions
        .values()
        .any(|a| a.get("Type").and_then(Value::as_str) == Some(DISCONNECT_TYPE));
    if !has_disconnect {
        report.warning(
            "structure",
            Some(template_name),
            format!("'{}' has no disconnect action", template_name),
        );
        return;
    }

    // BFS from the entry action; flag a disconnect reachable within two
    // transitions of the entry.
    let mut depth: BTreeMap<&str, usize> = BTreeMap::new();
    let mut queue = VecDeque::new();
    depth.insert(start, 0);
    queue.push_back(start);
    while let Some(id) = queue.pop_front() {
        let d = depth[id];
        let Some(action) = actions.get(id) else {
            continue;
        };
        if action.get("Type").and_then(Value::as_str) == Some(DISCONNECT_TYPE)
            && d <= IMMEDIATE_HANGUP_DEPTH
        {
            report.warning(
                "structure",
                Some(template_name),
                format!(
                    "'{}' disconnects {} step(s) after entry; possible immediate hangup",
                    template_name, d
                ),
            );
        }
        for next in successors(action) {
            if !depth.contains_key(next) {
                depth.insert(next, d + 1);
                queue.push_back(next);
            }
        }
    }
}

/// The flow `content` may be embedded as an object or as a JSON string.
fn flow_content(template: &Value) -> Option<Value> {
    match template.get("content")? {
        Value::Object(map) => Some(Value::Object(map.clone())),
        Value::String(s) => serde_json::from_str(s).ok(),
        _ => None,
    }
}

/// Every action id reachable in one transition: NextAction plus error and
/// condition branches.
fn successors(action: &Value) -> Vec<&str> {
    let mut out = Vec::new();
    let Some(transitions) = action.get("Transitions") else {
        return out;
    };
    if let Some(next) = transitions.get("NextAction").and_then(Value::as_str) {
        out.push(next);
    }
    for branch in ["Errors", "Conditions"] {
        if let Some(items) = transitions.get(branch).and_then(Value::as_array) {
            for item in items {
                if let Some(next) = item.get("NextAction").and_then(Value::as_str) {
                    out.push(next);
                }
            }
        }
    }
    out
}

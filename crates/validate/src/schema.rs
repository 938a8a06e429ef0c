//! Environment-map schema conformance.
//!
//! Structural shape is checked against an embedded JSON Schema document;
//! per-category value grammars (which a schema cannot express cleanly) are
//! checked in Rust on top of it.

use flowbridge_core::{is_connect_arn, is_e164, is_lambda_arn, EnvironmentMap};

use crate::report::ValidationReport;

static ENVIRONMENT_SCHEMA_STR: &str = include_str!("../schema/environment-map.schema.json");

/// Check an environment map against the embedded schema, then apply the
/// per-category value grammars. All findings go into `report`.
pub fn check_schema(env: &EnvironmentMap, report: &mut ValidationReport) {
    let schema: serde_json::Value = match serde_json::from_str(ENVIRONMENT_SCHEMA_STR) {
        Ok(s) => s,
        Err(e) => {
            report.error(
                "schema",
                None,
                format!("internal: embedded schema does not parse: {}", e),
            );
            return;
        }
    };
    let validator = match jsonschema::validator_for(&schema) {
        Ok(v) => v,
        Err(e) => {
            report.error(
                "schema",
                None,
                format!("internal: embedded schema does not compile: {}", e),
            );
            return;
        }
    };

    let doc = match serde_json::to_value(env) {
        Ok(v) => v,
        Err(e) => {
            report.error("schema", Some(env.name.as_str()), format!("serialization: {}", e));
            return;
        }
    };

    for error in validator.iter_errors(&doc) {
        report.error(
            "schema",
            Some(env.name.as_str()),
            format!("{} (at {})", error, error.instance_path()),
        );
    }

    check_category_grammars(env, report);
}

/// Token categories with a defined value grammar.
fn check_category_grammars(env: &EnvironmentMap, report: &mut ValidationReport) {
    for (path, value) in env.token_values() {
        let category = path.split('.').next().unwrap_or("");
        let ok = match category {
            "Lambda" => is_lambda_arn(value),
            "Queue" | "Prompt" | "Lex" => is_connect_arn(value),
            "PhoneNumber" => is_e164(value),
            _ => continue,
        };
        if !ok {
            report.error(
                "schema",
                Some(path.as_str()),
                format!(
                    "token '{}' in '{}' does not match the {} value grammar: {}",
                    path, env.name, category, value
                ),
            );
        }
    }
}

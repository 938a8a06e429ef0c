//! flowbridge-validate: cross-artifact validation.
//!
//! Operates over the full set of templates and environment maps,
//! independent of any single render. Each check is a separate module
//! writing into a freshly constructed [`ValidationReport`] owned by the
//! run; there is no shared accumulator, so independent runs can proceed in
//! parallel.

pub mod completeness;
pub mod consistency;
pub mod report;
pub mod schema;
pub mod structure;
pub mod usage;

pub use completeness::check_completeness;
pub use consistency::check_consistency;
pub use report::{Issue, Severity, ValidationReport};
pub use schema::check_schema;
pub use structure::check_structure;
pub use usage::check_usage;

use flowbridge_core::{scan_template_tokens, EnvironmentMap};
use serde_json::Value;
use std::collections::BTreeSet;

/// Recognized token service categories. The namespace is extensible; a
/// template using something else gets a warning, not an error.
pub const TOKEN_CATEGORIES: &[&str] = &["Lambda", "Queue", "Prompt", "Lex", "PhoneNumber"];

/// A named template document, as read from a flow directory.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    /// File name, used in findings.
    pub name: String,
    pub doc: Value,
}

/// Validate one environment map in isolation (schema + consistency).
pub fn validate_environment(env: &EnvironmentMap) -> ValidationReport {
    let mut report = ValidationReport::new();
    check_schema(env, &mut report);
    check_consistency(env, &mut report);
    report.sort();
    report
}

/// Validate templates in isolation (usage shape + structure heuristics).
pub fn validate_templates(templates: &[TemplateSource]) -> ValidationReport {
    let mut report = ValidationReport::new();
    for t in templates {
        check_usage(&t.name, &t.doc, &mut report);
        check_structure(&t.name, &t.doc, &mut report);
    }
    report.sort();
    report
}

/// The full cross-artifact pass: every environment check, every template
/// check, and template-token completeness against every environment.
pub fn validate_all(templates: &[TemplateSource], envs: &[EnvironmentMap]) -> ValidationReport {
    let mut report = ValidationReport::new();

    for env in envs {
        report.merge(validate_environment(env));
    }
    report.merge(validate_templates(templates));

    let all_tokens: BTreeSet<String> = templates
        .iter()
        .flat_map(|t| scan_template_tokens(&t.doc))
        .collect();
    for env in envs {
        check_completeness(&all_tokens, env, &mut report);
    }

    report.sort();
    report
}

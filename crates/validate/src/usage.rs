//! Token-usage shape checks over templates.
//!
//! Token references are extracted structurally from each parsed template.
//! A reference needs at least `Service.Entity`; single-segment tokens are
//! errors. The category namespace is extensible, so an unrecognized leading
//! segment is only a warning.

use flowbridge_core::scan_template_tokens;
use serde_json::Value;

use crate::report::ValidationReport;
use crate::TOKEN_CATEGORIES;

pub fn check_usage(template_name: &str, template: &Value, report: &mut ValidationReport) {
    for path in scan_template_tokens(template) {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
            report.error(
                "usage",
                Some(path.as_str()),
                format!(
                    "token '${{{}}}' in '{}' needs at least Service.Entity",
                    path, template_name
                ),
            );
            continue;
        }
        if !TOKEN_CATEGORIES.contains(&segments[0]) {
            report.warning(
                "usage",
                Some(path.as_str()),
                format!(
                    "token '${{{}}}' in '{}' uses unrecognized category '{}'",
                    path, template_name, segments[0]
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_segment_token_is_an_error() {
        let doc = json!({"content": {"v": "${Orphan}"}});
        let mut report = ValidationReport::new();
        check_usage("flow.json", &doc, &mut report);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].subject.as_deref(), Some("Orphan"));
    }

    #[test]
    fn unknown_category_is_a_warning() {
        let doc = json!({"content": {"v": "${Custom.Thing}"}});
        let mut report = ValidationReport::new();
        check_usage("flow.json", &doc, &mut report);
        assert!(report.passed());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn known_categories_are_clean() {
        let doc = json!({"content": {
            "a": "${Queue.Sales}",
            "b": "${Prompt.Welcome.English}",
            "c": "${PhoneNumber.Main}"
        }});
        let mut report = ValidationReport::new();
        check_usage("flow.json", &doc, &mut report);
        assert!(report.passed());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn empty_segments_are_errors() {
        let doc = json!({"content": {"v": "${Queue.}"}});
        let mut report = ValidationReport::new();
        check_usage("flow.json", &doc, &mut report);
        assert_eq!(report.errors.len(), 1);
    }
}

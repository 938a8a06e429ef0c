//! ValidationReport -- aggregated output from every validation check.
//!
//! One report is constructed per validation run and threaded through every
//! check function; there is no shared or process-wide accumulator, so
//! independent runs can validate independent flows in parallel.

use serde::Serialize;

/// Severity of a validation issue. Errors block the pipeline; warnings
/// never do.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single validation finding.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Issue {
    /// Which check produced this (e.g. "schema", "consistency", "usage").
    pub check: String,
    pub severity: Severity,
    /// The thing at fault: a token path, a file, an environment name.
    pub subject: Option<String>,
    pub message: String,
}

/// Ordered errors and warnings accumulated during one validation pass.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ValidationReport {
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        ValidationReport::default()
    }

    pub fn error(&mut self, check: &str, subject: Option<&str>, message: impl Into<String>) {
        self.errors.push(Issue {
            check: check.to_owned(),
            severity: Severity::Error,
            subject: subject.map(str::to_owned),
            message: message.into(),
        });
    }

    pub fn warning(&mut self, check: &str, subject: Option<&str>, message: impl Into<String>) {
        self.warnings.push(Issue {
            check: check.to_owned(),
            severity: Severity::Warning,
            subject: subject.map(str::to_owned),
            message: message.into(),
        });
    }

    /// Overall pass: no blocking errors. Warnings never change this.
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fold another report's findings into this one, preserving order.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Deterministic ordering for output: by check, then subject, then text.
    pub fn sort(&mut self) {
        let key = |i: &Issue| (i.check.clone(), i.subject.clone(), i.message.clone());
        self.errors.sort_by_key(key);
        self.warnings.sort_by_key(key);
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "passed": self.passed(),
            "errors": self.errors,
            "warnings": self.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_never_block() {
        let mut report = ValidationReport::new();
        report.warning("consistency", Some("Queue.Sales"), "cross-region reference");
        assert!(report.passed());

        report.error("completeness", Some("Queue.NewQueue"), "missing from test");
        assert!(!report.passed());
    }

    #[test]
    fn merge_preserves_both_sides() {
        let mut a = ValidationReport::new();
        a.error("schema", None, "bad connect block");
        let mut b = ValidationReport::new();
        b.warning("usage", Some("Custom.Thing"), "unrecognized category");
        a.merge(b);
        assert_eq!(a.errors.len(), 1);
        assert_eq!(a.warnings.len(), 1);
    }

    #[test]
    fn json_shape() {
        let mut report = ValidationReport::new();
        report.error("usage", Some("Orphan"), "single-segment token");
        let v = report.to_json_value();
        assert_eq!(v["passed"], serde_json::json!(false));
        assert_eq!(v["errors"][0]["check"], serde_json::json!("usage"));
    }
}

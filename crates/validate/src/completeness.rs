//! Token completeness: every token referenced by any template must be
//! defined in every environment map under validation. A miss is a blocking
//! error naming both the path and the environment.

use flowbridge_core::EnvironmentMap;
use std::collections::BTreeSet;

use crate::report::ValidationReport;

pub fn check_completeness(
    template_tokens: &BTreeSet<String>,
    env: &EnvironmentMap,
    report: &mut ValidationReport,
) {
    let defined = env.token_paths();
    for path in template_tokens {
        if !defined.contains(path) {
            report.error(
                "completeness",
                Some(path.as_str()),
                format!(
                    "token '${{{}}}' is referenced by templates but not defined in environment '{}'",
                    path, env.name
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str, extra_queue: bool) -> EnvironmentMap {
        let extra = if extra_queue {
            "\n    NewQueue: arn:aws:connect:us-east-1:123456789012:instance/abc-123/queue/q-9"
        } else {
            ""
        };
        serde_yaml::from_str(&format!(
            r#"
name: {name}
connect:
  instance_id: abc-123
  instance_arn: arn:aws:connect:us-east-1:123456789012:instance/abc-123
  region: us-east-1
tokens:
  Queue:
    Sales: arn:aws:connect:us-east-1:123456789012:instance/abc-123/queue/q-1{extra}
"#
        ))
        .unwrap()
    }

    #[test]
    fn missing_path_fails_only_the_environment_lacking_it() {
        let tokens: BTreeSet<String> =
            ["Queue.Sales", "Queue.NewQueue"].iter().map(|s| s.to_string()).collect();

        let mut report = ValidationReport::new();
        check_completeness(&tokens, &env("test", false), &mut report);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].subject.as_deref(), Some("Queue.NewQueue"));
        assert!(report.errors[0].message.contains("'test'"));

        let mut report = ValidationReport::new();
        check_completeness(&tokens, &env("prod", true), &mut report);
        assert!(report.passed());
    }
}

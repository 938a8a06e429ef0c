//! Region and instance consistency across an environment's ARNs.
//!
//! Region mismatches are warnings: cross-region references can be
//! intentional but deserve review. Instance mismatches are errors: a token
//! pointing into a different Connect instance breaks referential integrity.

use flowbridge_core::{parse_arn, EnvironmentMap};

use crate::report::ValidationReport;

pub fn check_consistency(env: &EnvironmentMap, report: &mut ValidationReport) {
    // The declared identity must be self-consistent before anything else.
    if let Some(arn) = parse_arn(&env.connect.instance_arn) {
        if arn.region != env.connect.region {
            report.warning(
                "consistency",
                Some("connect.instance_arn"),
                format!(
                    "instance ARN region '{}' differs from connect.region '{}'",
                    arn.region, env.connect.region
                ),
            );
        }
        if arn.instance_id().is_some_and(|id| id != env.connect.instance_id) {
            report.error(
                "consistency",
                Some("connect.instance_arn"),
                format!(
                    "instance ARN embeds id '{}' but connect.instance_id is '{}'",
                    arn.instance_id().unwrap_or(""),
                    env.connect.instance_id
                ),
            );
        }
    }

    for (path, value) in env.token_values() {
        let Some(arn) = parse_arn(value) else {
            continue;
        };
        if arn.region != env.connect.region {
            report.warning(
                "consistency",
                Some(path.as_str()),
                format!(
                    "token '{}' references region '{}' but '{}' runs in '{}'",
                    path, arn.region, env.name, env.connect.region
                ),
            );
        }
        if arn.service == "connect" {
            if let Some(id) = arn.instance_id() {
                if id != env.connect.instance_id {
                    report.error(
                        "consistency",
                        Some(path.as_str()),
                        format!(
                            "token '{}' references instance '{}' but '{}' is instance '{}'",
                            path, id, env.name, env.connect.instance_id
                        ),
                    );
                }
            }
        }
    }
}

//! Drift detection: live configuration vs last-known-good artifact.
//!
//! Fetches the live content of every tracked flow, normalizes it with the
//! same pass used on exports, and structurally compares it to the deployed
//! artifact. Read-only: a non-empty report is surfaced for human action,
//! never self-healed, so unauthorized edits are not silently masked.
//!
//! Flows with an in-flight (Pending) version are not yet authoritative and
//! are suppressed rather than reported as drift.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::api::ConnectApi;
use crate::error::DriftError;
use crate::record::{content_digest, DeploymentRecord, LifecycleState};
use crate::retry::RetryPolicy;

/// One path-qualified difference between live and deployed content.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DriftChange {
    pub path: String,
    /// Deployed value; None when the path only exists live.
    pub before: Option<Value>,
    /// Live value; None when the path disappeared.
    pub after: Option<Value>,
}

/// All drift found for one flow.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FlowDrift {
    pub flow_name: String,
    pub version: String,
    pub changes: Vec<DriftChange>,
}

/// The diff between live configuration and the last deployed artifacts for
/// one environment. Empty is the expected steady state.
#[derive(Debug, Clone, Serialize, Default)]
pub struct DriftReport {
    pub environment: String,
    pub drifted: Vec<FlowDrift>,
    /// Flows skipped because a deployment is in flight.
    pub suppressed: Vec<String>,
}

impl DriftReport {
    pub fn is_empty(&self) -> bool {
        self.drifted.is_empty()
    }
}

pub struct DriftDetector<A: ConnectApi> {
    api: Arc<A>,
    retry: RetryPolicy,
}

impl<A: ConnectApi> DriftDetector<A> {
    pub fn new(api: Arc<A>) -> Self {
        DriftDetector {
            api,
            retry: RetryPolicy::default(),
        }
    }

    /// Compare live content against the Active record of every flow in
    /// `records` (one environment's records, as kept by the orchestrator).
    pub async fn detect(
        &self,
        environment: &str,
        records: &[DeploymentRecord],
    ) -> Result<DriftReport, DriftError> {
        let mut report = DriftReport {
            environment: environment.to_owned(),
            ..DriftReport::default()
        };

        let mut by_flow: BTreeMap<&str, Vec<&DeploymentRecord>> = BTreeMap::new();
        for r in records.iter().filter(|r| r.environment == environment) {
            by_flow.entry(r.flow_name.as_str()).or_default().push(r);
        }

        for (flow_name, records) in by_flow {
            if records.iter().any(|r| r.state == LifecycleState::Pending) {
                report.suppressed.push(flow_name.to_owned());
                continue;
            }
            let Some(active) = records.iter().find(|r| r.state == LifecycleState::Active)
            else {
                continue;
            };

            let live = self
                .retry
                .read(|| self.api.get_flow_content(&active.runtime_flow_id))
                .await?;
            let live = flowbridge_core::normalize(&live);

            // The deployed artifact is stored normalized; the digest makes
            // the no-drift case cheap.
            if content_digest(&live) == active.digest {
                continue;
            }

            let mut changes = Vec::new();
            diff_values("$", Some(&active.artifact), Some(&live), &mut changes);
            if !changes.is_empty() {
                info!(
                    flow = flow_name,
                    environment,
                    changes = changes.len(),
                    "drift detected"
                );
                report.drifted.push(FlowDrift {
                    flow_name: flow_name.to_owned(),
                    version: active.version.0.clone(),
                    changes,
                });
            }
        }

        Ok(report)
    }
}

/// Structural diff with path-qualified changes. Objects diff by key union,
/// arrays element-wise; scalar mismatches record before/after.
fn diff_values(
    path: &str,
    before: Option<&Value>,
    after: Option<&Value>,
    out: &mut Vec<DriftChange>,
) {
    match (before, after) {
        (Some(Value::Object(a)), Some(Value::Object(b))) => {
            let keys: std::collections::BTreeSet<&String> = a.keys().chain(b.keys()).collect();
            for key in keys {
                diff_values(
                    &format!("{}.{}", path, key),
                    a.get(key.as_str()),
                    b.get(key.as_str()),
                    out,
                );
            }
        }
        (Some(Value::Array(a)), Some(Value::Array(b))) => {
            let len = a.len().max(b.len());
            for i in 0..len {
                diff_values(&format!("{}[{}]", path, i), a.get(i), b.get(i), out);
            }
        }
        (Some(a), Some(b)) => {
            if a != b {
                out.push(DriftChange {
                    path: path.to_owned(),
                    before: Some(a.clone()),
                    after: Some(b.clone()),
                });
            }
        }
        (before, after) => {
            if before.is_some() || after.is_some() {
                out.push(DriftChange {
                    path: path.to_owned(),
                    before: before.cloned(),
                    after: after.cloned(),
                });
            }
        }
    }
}

//! Blue/Green deployment orchestration.
//!
//! Per (flow, environment) pair the lifecycle is Pending -> Active ->
//! Retired. A submitted artifact becomes a Pending version on the runtime
//! service; cutover then rebinds entry points in discrete, ordered stages
//! (canary, partial, full), each requiring an explicit health confirmation
//! before the next. Rollback is a single entry-point rebind and never
//! touches version content. Retired versions are kept so rollback is always
//! possible.
//!
//! Deployments of the same (flow, environment) pair are serialized by a
//! keyed async mutex: at most one in-flight create/update per pair.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::api::ConnectApi;
use crate::error::DeployError;
use crate::record::{
    content_digest, DeploymentRecord, GrantFailure, LifecycleState, VersionId,
};
use crate::retry::RetryPolicy;

/// Cutover stages, strictly ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CutoverStage {
    Canary,
    Partial,
    Full,
}

impl CutoverStage {
    pub fn next(self) -> Option<CutoverStage> {
        match self {
            CutoverStage::Canary => Some(CutoverStage::Partial),
            CutoverStage::Partial => Some(CutoverStage::Full),
            CutoverStage::Full => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CutoverStage::Canary => "canary",
            CutoverStage::Partial => "partial",
            CutoverStage::Full => "full",
        }
    }
}

/// Explicit health confirmation for a completed stage. Cutover never
/// advances on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthSignal {
    Healthy,
    Unhealthy,
}

/// Entry-point fractions per stage.
#[derive(Debug, Clone, Copy)]
pub struct CutoverConfig {
    pub canary_fraction: f64,
    pub partial_fraction: f64,
}

impl Default for CutoverConfig {
    fn default() -> Self {
        CutoverConfig {
            canary_fraction: 0.10,
            partial_fraction: 0.50,
        }
    }
}

impl CutoverConfig {
    /// Number of entry points bound at and below a stage. Canary always
    /// binds at least one; fractions round up.
    fn target_count(&self, stage: CutoverStage, total: usize) -> usize {
        match stage {
            CutoverStage::Canary => ((total as f64 * self.canary_fraction).ceil() as usize)
                .max(1)
                .min(total),
            CutoverStage::Partial => ((total as f64 * self.partial_fraction).ceil() as usize)
                .max(1)
                .min(total),
            CutoverStage::Full => total,
        }
    }
}

/// A new rendered artifact to deploy.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub flow_name: String,
    pub environment: String,
    /// Rendered and validated artifact. Normalized on submit, so the stored
    /// record is diff-stable regardless of residual export noise.
    pub artifact: Value,
    /// Release tag; a timestamp fallback is used when absent.
    pub release_tag: Option<String>,
    /// Grant source identity: the target Connect instance ARN.
    pub instance_arn: String,
}

/// Result of a submit: the created record, including any per-Lambda grant
/// failures (non-fatal).
#[derive(Debug, Clone)]
pub struct DeploymentOutcome {
    pub record: DeploymentRecord,
}

/// One completed cutover step: which stage, and which entry points were
/// rebound by this step specifically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutoverStep {
    pub stage: CutoverStage,
    pub rebound: Vec<String>,
}

struct CutoverProgress {
    version: VersionId,
    entry_points: Vec<String>,
    bound: usize,
    completed: CutoverStage,
}

#[derive(Default)]
struct PairState {
    records: Vec<DeploymentRecord>,
    cutover: Option<CutoverProgress>,
    bindings: BTreeMap<String, VersionId>,
}

type PairKey = (String, String);

pub struct DeploymentOrchestrator<A: ConnectApi> {
    api: Arc<A>,
    retry: RetryPolicy,
    config: CutoverConfig,
    state: Mutex<BTreeMap<PairKey, PairState>>,
    locks: Mutex<BTreeMap<PairKey, Arc<Mutex<()>>>>,
}

impl<A: ConnectApi> DeploymentOrchestrator<A> {
    pub fn new(api: Arc<A>) -> Self {
        DeploymentOrchestrator {
            api,
            retry: RetryPolicy::default(),
            config: CutoverConfig::default(),
            state: Mutex::new(BTreeMap::new()),
            locks: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_config(api: Arc<A>, retry: RetryPolicy, config: CutoverConfig) -> Self {
        DeploymentOrchestrator {
            api,
            retry,
            config,
            state: Mutex::new(BTreeMap::new()),
            locks: Mutex::new(BTreeMap::new()),
        }
    }

    /// Single-writer discipline per (flow, environment) pair.
    async fn pair_lock(&self, key: &PairKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(key.clone()).or_default().clone()
    }

    /// Submit a rendered artifact as a new Pending version.
    ///
    /// Creates the versioned flow on the runtime service and grants Lambda
    /// invoke authorization for every distinct Lambda ARN in the artifact,
    /// scoped by the instance ARN. Individual grant failures are logged,
    /// recorded on the outcome, and do not block the deployment. Flow
    /// creation failure is fatal; no entry point is touched by submit.
    pub async fn submit(&self, req: SubmitRequest) -> Result<DeploymentOutcome, DeployError> {
        let key = (req.flow_name.clone(), req.environment.clone());
        let guard = self.pair_lock(&key).await;
        let _serialized = guard.lock().await;

        let version = match &req.release_tag {
            Some(tag) => VersionId::from_release_tag(tag),
            None => VersionId::timestamp_fallback(OffsetDateTime::now_utc()),
        };

        {
            let state = self.state.lock().await;
            if let Some(pair) = state.get(&key) {
                if pair.records.iter().any(|r| r.version == version) {
                    return Err(DeployError::VersionExists {
                        flow: req.flow_name,
                        environment: req.environment,
                        version: version.0,
                    });
                }
            }
        }

        // Drift comparison later diffs against this record, so the stored
        // form must be Normalizer-equivalent to a normalized live fetch.
        let artifact = flowbridge_core::normalize(&req.artifact);

        let runtime_name = format!("{}--{}", req.flow_name, version);
        let flow_id = self
            .retry
            .mutate(|| self.api.create_flow(&runtime_name, &artifact))
            .await?;

        let lambda_arns = collect_lambda_arns(&artifact);
        let mut grant_failures = Vec::new();
        for arn in &lambda_arns {
            let result = self
                .retry
                .mutate(|| self.api.grant_invoke(arn, &req.instance_arn))
                .await;
            if let Err(e) = result {
                warn!(
                    flow = %req.flow_name,
                    environment = %req.environment,
                    lambda_arn = %arn,
                    error = %e,
                    "invoke grant failed; continuing"
                );
                grant_failures.push(GrantFailure {
                    lambda_arn: arn.clone(),
                    reason: e.to_string(),
                });
            }
        }

        let record = DeploymentRecord {
            flow_name: req.flow_name.clone(),
            environment: req.environment.clone(),
            version: version.clone(),
            runtime_flow_id: flow_id,
            digest: content_digest(&artifact),
            artifact,
            lambda_arns: lambda_arns.into_iter().collect(),
            grant_failures,
            state: LifecycleState::Pending,
            created_at: OffsetDateTime::now_utc(),
        };

        info!(
            flow = %record.flow_name,
            environment = %record.environment,
            version = %record.version,
            runtime_flow_id = %record.runtime_flow_id,
            "version created"
        );

        let mut state = self.state.lock().await;
        state
            .entry(key)
            .or_default()
            .records
            .push(record.clone());
        Ok(DeploymentOutcome { record })
    }

    /// Start cutover for a Pending version: binds the canary set of entry
    /// points. Each rebind is a discrete, auditable binding change.
    ///
    /// Only a Pending version can enter cutover; moving traffic back to a
    /// retired version is `rollback`. Refused while another cutover for the
    /// pair is in flight, so staged progress is never silently abandoned.
    pub async fn begin_cutover(
        &self,
        flow: &str,
        environment: &str,
        version: &VersionId,
        entry_points: Vec<String>,
    ) -> Result<CutoverStep, DeployError> {
        let key = (flow.to_owned(), environment.to_owned());
        let guard = self.pair_lock(&key).await;
        let _serialized = guard.lock().await;

        let flow_id = {
            let state = self.state.lock().await;
            let pair = state.get(&key).ok_or_else(|| DeployError::UnknownVersion {
                flow: flow.to_owned(),
                environment: environment.to_owned(),
                version: version.0.clone(),
            })?;
            if pair.cutover.is_some() {
                return Err(DeployError::CutoverInProgress {
                    flow: flow.to_owned(),
                    environment: environment.to_owned(),
                });
            }
            let record = pair
                .records
                .iter()
                .find(|r| &r.version == version)
                .ok_or_else(|| DeployError::UnknownVersion {
                    flow: flow.to_owned(),
                    environment: environment.to_owned(),
                    version: version.0.clone(),
                })?;
            if record.state != LifecycleState::Pending {
                return Err(DeployError::VersionNotPending {
                    flow: flow.to_owned(),
                    version: version.0.clone(),
                    state: record.state.name(),
                });
            }
            record.runtime_flow_id.clone()
        };

        let count = self.config.target_count(CutoverStage::Canary, entry_points.len());
        let rebound = self
            .rebind_range(&key, &flow_id, version, &entry_points, 0, count)
            .await?;

        info!(
            flow, environment, version = %version, stage = "canary",
            rebound = rebound.len(),
            "cutover stage complete"
        );

        let mut state = self.state.lock().await;
        let pair = state.entry(key).or_default();
        pair.cutover = Some(CutoverProgress {
            version: version.clone(),
            entry_points,
            bound: count,
            completed: CutoverStage::Canary,
        });
        Ok(CutoverStep {
            stage: CutoverStage::Canary,
            rebound,
        })
    }

    /// Advance a cutover to its next stage. Requires an explicit health
    /// confirmation for the stage already completed; an unhealthy signal
    /// freezes the current bindings and returns an error.
    pub async fn advance_cutover(
        &self,
        flow: &str,
        environment: &str,
        health: HealthSignal,
    ) -> Result<CutoverStep, DeployError> {
        let key = (flow.to_owned(), environment.to_owned());
        let guard = self.pair_lock(&key).await;
        let _serialized = guard.lock().await;

        let (version, entry_points, bound, completed, flow_id) = {
            let state = self.state.lock().await;
            let pair = state.get(&key).ok_or_else(|| DeployError::NoCutover {
                flow: flow.to_owned(),
                environment: environment.to_owned(),
            })?;
            let progress = pair.cutover.as_ref().ok_or_else(|| DeployError::NoCutover {
                flow: flow.to_owned(),
                environment: environment.to_owned(),
            })?;
            let flow_id = pair
                .records
                .iter()
                .find(|r| r.version == progress.version)
                .map(|r| r.runtime_flow_id.clone())
                .ok_or_else(|| DeployError::UnknownVersion {
                    flow: flow.to_owned(),
                    environment: environment.to_owned(),
                    version: progress.version.0.clone(),
                })?;
            (
                progress.version.clone(),
                progress.entry_points.clone(),
                progress.bound,
                progress.completed,
                flow_id,
            )
        };

        if health == HealthSignal::Unhealthy {
            return Err(DeployError::Unhealthy {
                stage: completed.name().to_owned(),
            });
        }

        let stage = completed.next().ok_or_else(|| DeployError::CutoverComplete {
            flow: flow.to_owned(),
        })?;
        // A stage never unbinds: with misordered fractions the target is
        // clamped to what the previous stage already bound.
        let count = self
            .config
            .target_count(stage, entry_points.len())
            .max(bound);
        let rebound = self
            .rebind_range(&key, &flow_id, &version, &entry_points, bound, count)
            .await?;

        info!(
            flow, environment, version = %version, stage = stage.name(),
            rebound = rebound.len(),
            "cutover stage complete"
        );

        let mut state = self.state.lock().await;
        let pair = state.entry(key).or_default();
        if stage == CutoverStage::Full {
            // All entry points reference the new version: activate it and
            // retire its predecessor.
            for r in pair.records.iter_mut() {
                if r.state == LifecycleState::Active {
                    r.state = LifecycleState::Retired;
                    info!(flow, environment, version = %r.version, "version retired");
                }
            }
            if let Some(r) = pair.records.iter_mut().find(|r| r.version == version) {
                r.state = LifecycleState::Active;
            }
            pair.cutover = None;
        } else if let Some(progress) = pair.cutover.as_mut() {
            progress.bound = count;
            progress.completed = stage;
        }
        Ok(CutoverStep { stage, rebound })
    }

    /// Abort between stages: freeze the current bindings. No forced
    /// rollback; the system keeps serving traffic exactly as it stands.
    pub async fn abort_cutover(&self, flow: &str, environment: &str) {
        let key = (flow.to_owned(), environment.to_owned());
        let guard = self.pair_lock(&key).await;
        let _serialized = guard.lock().await;
        let mut state = self.state.lock().await;
        if let Some(pair) = state.get_mut(&key) {
            if let Some(progress) = pair.cutover.take() {
                info!(
                    flow, environment, version = %progress.version,
                    stage = progress.completed.name(),
                    "cutover aborted; bindings frozen"
                );
            }
        }
    }

    /// Rebind one entry point to any previously deployed version. A single
    /// idempotent operation: rebinding to the already-bound version is a
    /// no-op. Version content is never recreated or modified.
    pub async fn rollback(
        &self,
        flow: &str,
        environment: &str,
        entry_point: &str,
        version: &VersionId,
    ) -> Result<(), DeployError> {
        let key = (flow.to_owned(), environment.to_owned());

        let flow_id = {
            let state = self.state.lock().await;
            let pair = state.get(&key).ok_or_else(|| DeployError::UnknownVersion {
                flow: flow.to_owned(),
                environment: environment.to_owned(),
                version: version.0.clone(),
            })?;
            if pair.bindings.get(entry_point) == Some(version) {
                return Ok(());
            }
            pair.records
                .iter()
                .find(|r| &r.version == version)
                .map(|r| r.runtime_flow_id.clone())
                .ok_or_else(|| DeployError::UnknownVersion {
                    flow: flow.to_owned(),
                    environment: environment.to_owned(),
                    version: version.0.clone(),
                })?
        };

        self.retry
            .mutate(|| self.api.rebind_entry_point(entry_point, &flow_id))
            .await?;

        info!(flow, environment, entry_point, version = %version, "rolled back");

        let mut state = self.state.lock().await;
        if let Some(pair) = state.get_mut(&key) {
            pair.bindings.insert(entry_point.to_owned(), version.clone());
        }
        Ok(())
    }

    /// Delete a version's record. Refused while the flow has an active
    /// version, so rollback targets are never destroyed underneath live
    /// traffic.
    pub async fn delete_version(
        &self,
        flow: &str,
        environment: &str,
        version: &VersionId,
    ) -> Result<(), DeployError> {
        let key = (flow.to_owned(), environment.to_owned());
        let guard = self.pair_lock(&key).await;
        let _serialized = guard.lock().await;
        let mut state = self.state.lock().await;
        let pair = state.get_mut(&key).ok_or_else(|| DeployError::UnknownVersion {
            flow: flow.to_owned(),
            environment: environment.to_owned(),
            version: version.0.clone(),
        })?;
        if pair.records.iter().any(|r| r.state == LifecycleState::Active) {
            return Err(DeployError::DeleteRefused {
                flow: flow.to_owned(),
                environment: environment.to_owned(),
            });
        }
        let before = pair.records.len();
        pair.records.retain(|r| &r.version != version);
        if pair.records.len() == before {
            return Err(DeployError::UnknownVersion {
                flow: flow.to_owned(),
                environment: environment.to_owned(),
                version: version.0.clone(),
            });
        }
        Ok(())
    }

    /// All records for an environment, across flows. Drift detection input.
    pub async fn deployed_records(&self, environment: &str) -> Vec<DeploymentRecord> {
        let state = self.state.lock().await;
        state
            .iter()
            .filter(|((_, env), _)| env == environment)
            .flat_map(|(_, pair)| pair.records.iter().cloned())
            .collect()
    }

    /// The version an entry point currently serves, if bound.
    pub async fn binding_of(&self, flow: &str, environment: &str, entry_point: &str) -> Option<VersionId> {
        let state = self.state.lock().await;
        state
            .get(&(flow.to_owned(), environment.to_owned()))
            .and_then(|pair| pair.bindings.get(entry_point).cloned())
    }

    async fn rebind_range(
        &self,
        key: &PairKey,
        flow_id: &str,
        version: &VersionId,
        entry_points: &[String],
        from: usize,
        to: usize,
    ) -> Result<Vec<String>, DeployError> {
        let mut rebound = Vec::new();
        for ep in &entry_points[from..to] {
            self.retry
                .mutate(|| self.api.rebind_entry_point(ep, flow_id))
                .await?;
            let mut state = self.state.lock().await;
            // Exclusivity: the map holds exactly one version per entry
            // point; inserting replaces the prior binding atomically with
            // the service call that moved it.
            state
                .entry(key.clone())
                .or_default()
                .bindings
                .insert(ep.clone(), version.clone());
            rebound.push(ep.clone());
        }
        Ok(rebound)
    }
}

/// Distinct Lambda ARNs referenced anywhere in an artifact.
pub fn collect_lambda_arns(artifact: &Value) -> BTreeSet<String> {
    let mut arns = BTreeSet::new();
    walk_strings(artifact, &mut |s| {
        if flowbridge_core::is_lambda_arn(s) {
            arns.insert(s.to_owned());
        }
    });
    arns
}

fn walk_strings(value: &Value, f: &mut impl FnMut(&str)) {
    match value {
        Value::String(s) => f(s),
        Value::Array(items) => items.iter().for_each(|v| walk_strings(v, f)),
        Value::Object(map) => map.values().for_each(|v| walk_strings(v, f)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stage_fractions_round_up_with_canary_floor() {
        let config = CutoverConfig::default();
        assert_eq!(config.target_count(CutoverStage::Canary, 1), 1);
        assert_eq!(config.target_count(CutoverStage::Canary, 10), 1);
        assert_eq!(config.target_count(CutoverStage::Canary, 25), 3);
        assert_eq!(config.target_count(CutoverStage::Partial, 10), 5);
        assert_eq!(config.target_count(CutoverStage::Full, 10), 10);
    }

    #[test]
    fn stages_are_strictly_ordered() {
        assert_eq!(CutoverStage::Canary.next(), Some(CutoverStage::Partial));
        assert_eq!(CutoverStage::Partial.next(), Some(CutoverStage::Full));
        assert_eq!(CutoverStage::Full.next(), None);
        assert!(CutoverStage::Canary < CutoverStage::Full);
    }

    #[test]
    fn collects_distinct_lambda_arns_only() {
        let artifact = json!({
            "content": {
                "a": "arn:aws:lambda:us-east-1:123456789012:function:router",
                "b": "arn:aws:lambda:us-east-1:123456789012:function:router",
                "c": "arn:aws:lambda:us-east-1:123456789012:function:lookup",
                "d": "arn:aws:connect:us-east-1:123456789012:instance/abc/queue/q"
            }
        });
        let arns = collect_lambda_arns(&artifact);
        assert_eq!(arns.len(), 2);
        assert!(arns.iter().all(|a| a.contains(":function:")));
    }
}

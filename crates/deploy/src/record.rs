//! Deployment records: the versioned identity of a deployed flow.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Lifecycle of a deployed version within one (flow, environment) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created on the runtime service, eligible for traffic.
    Pending,
    /// Serving all entry points after full cutover.
    Active,
    /// Superseded by a newer version. Kept for rollback; never deleted
    /// automatically.
    Retired,
}

impl LifecycleState {
    pub fn name(self) -> &'static str {
        match self {
            LifecycleState::Pending => "pending",
            LifecycleState::Active => "active",
            LifecycleState::Retired => "retired",
        }
    }
}

/// A version identifier derived from the release tag, or from a UTC
/// timestamp when the promotion is untagged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionId(pub String);

impl VersionId {
    pub fn from_release_tag(tag: &str) -> VersionId {
        VersionId(tag.trim().replace([' ', '/'], "-"))
    }

    /// Fallback identity for untagged promotions: `ts-<second-resolution
    /// compact UTC timestamp>`.
    pub fn timestamp_fallback(now: OffsetDateTime) -> VersionId {
        let stamp = now
            .format(&Rfc3339)
            .unwrap_or_else(|_| now.unix_timestamp().to_string())
            .replace([':', '-'], "")
            .replace('T', "-");
        VersionId(format!("ts-{}", stamp))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One Lambda ARN that could not be authorized during submit. Non-fatal;
/// surfaced in the deployment outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrantFailure {
    pub lambda_arn: String,
    pub reason: String,
}

/// The versioned identity of a deployed flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentRecord {
    pub flow_name: String,
    pub environment: String,
    pub version: VersionId,
    /// Service-assigned flow id for this version.
    pub runtime_flow_id: String,
    /// The rendered artifact as deployed (already normalized). Drift
    /// detection compares the live system against this.
    pub artifact: Value,
    /// sha256 of the serialized artifact; drift short-circuit.
    pub digest: String,
    pub lambda_arns: Vec<String>,
    pub grant_failures: Vec<GrantFailure>,
    pub state: LifecycleState,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Content digest over the canonical serialization of a document.
pub fn content_digest(doc: &Value) -> String {
    let serialized = serde_json::to_string(doc).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    let out = hasher.finalize();
    out.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn release_tag_version_is_sanitized() {
        assert_eq!(
            VersionId::from_release_tag("release/2024.06 hotfix").as_str(),
            "release-2024.06-hotfix"
        );
    }

    #[test]
    fn timestamp_fallback_is_prefixed_and_sortable() {
        let t1 = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let t2 = OffsetDateTime::from_unix_timestamp(1_700_000_100).unwrap();
        let v1 = VersionId::timestamp_fallback(t1);
        let v2 = VersionId::timestamp_fallback(t2);
        assert!(v1.as_str().starts_with("ts-"));
        assert!(v1 < v2);
    }

    #[test]
    fn digest_tracks_content_not_identity() {
        let a = json!({"name": "f", "content": {"x": 1}});
        let b = json!({"name": "f", "content": {"x": 1}});
        let c = json!({"name": "f", "content": {"x": 2}});
        assert_eq!(content_digest(&a), content_digest(&b));
        assert_ne!(content_digest(&a), content_digest(&c));
    }
}

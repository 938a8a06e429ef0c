//! The runtime service boundary.
//!
//! These are the only operations flowbridge needs from the contact-routing
//! service: list/describe/fetch flows, create/update flow content, grant or
//! revoke Lambda invoke authorization scoped by source identity, and rebind
//! an entry point's active flow. Transport is an implementation detail
//! behind this trait.

use async_trait::async_trait;
use serde_json::Value;

/// Errors surfaced by a `ConnectApi` implementation.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ApiError {
    /// Rate limiting. The only classification eligible for retry.
    #[error("throttled: {0}")]
    Throttled(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("service error: {0}")]
    Service(String),
}

impl ApiError {
    /// Transient failures may be retried; everything else is permanent.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Throttled(_))
    }
}

/// A flow known to the runtime service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSummary {
    pub flow_id: String,
    pub name: String,
}

#[async_trait]
pub trait ConnectApi: Send + Sync {
    /// List every flow on the instance. Idempotent read.
    async fn list_flows(&self) -> Result<Vec<FlowSummary>, ApiError>;

    /// Describe one flow. Idempotent read.
    async fn describe_flow(&self, flow_id: &str) -> Result<FlowSummary, ApiError>;

    /// Fetch a flow's full content document. Idempotent read.
    async fn get_flow_content(&self, flow_id: &str) -> Result<Value, ApiError>;

    /// Create a flow; returns the service-assigned flow id.
    async fn create_flow(&self, name: &str, content: &Value) -> Result<String, ApiError>;

    /// Replace a flow's content document.
    async fn update_flow_content(&self, flow_id: &str, content: &Value) -> Result<(), ApiError>;

    /// Allow the given source identity to invoke a Lambda.
    async fn grant_invoke(&self, lambda_arn: &str, source_arn: &str) -> Result<(), ApiError>;

    /// Revoke a previously granted invoke authorization.
    async fn revoke_invoke(&self, lambda_arn: &str, source_arn: &str) -> Result<(), ApiError>;

    /// Point a traffic entry point (phone number / routing entry) at a flow.
    async fn rebind_entry_point(&self, entry_point: &str, flow_id: &str) -> Result<(), ApiError>;
}

//! In-memory `ConnectApi` implementation.
//!
//! Backs orchestrator and drift tests without a live instance. Failures can
//! be injected per operation to exercise throttling and partial-grant paths,
//! and flow content can be edited out-of-band to simulate drift.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Mutex;

use crate::api::{ApiError, ConnectApi, FlowSummary};

#[derive(Default)]
struct Inner {
    flows: BTreeMap<String, (String, Value)>,
    permissions: BTreeSet<(String, String)>,
    bindings: BTreeMap<String, String>,
    injected: BTreeMap<String, VecDeque<ApiError>>,
    next_id: u64,
}

/// Test double for the runtime service.
#[derive(Default)]
pub struct MemoryConnect {
    inner: Mutex<Inner>,
}

impl MemoryConnect {
    pub fn new() -> Self {
        MemoryConnect::default()
    }

    /// Queue an error for the next call to the named operation
    /// (`"create_flow"`, `"grant_invoke"`, ...). Errors are consumed in
    /// FIFO order, one per call.
    pub fn fail_next(&self, op: &str, err: ApiError) {
        let mut inner = self.inner.lock().unwrap();
        inner.injected.entry(op.to_owned()).or_default().push_back(err);
    }

    /// Overwrite a flow's content directly, bypassing the orchestrator.
    /// This is the out-of-band edit drift detection exists to catch.
    pub fn edit_flow_content(&self, flow_id: &str, content: Value) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.flows.get_mut(flow_id) {
            entry.1 = content;
        }
    }

    /// Current binding for an entry point, if any.
    pub fn bound_flow(&self, entry_point: &str) -> Option<String> {
        self.inner.lock().unwrap().bindings.get(entry_point).cloned()
    }

    /// True when the (lambda, source) grant exists.
    pub fn has_grant(&self, lambda_arn: &str, source_arn: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .permissions
            .contains(&(lambda_arn.to_owned(), source_arn.to_owned()))
    }

    fn take_injected(inner: &mut Inner, op: &str) -> Result<(), ApiError> {
        if let Some(queue) = inner.injected.get_mut(op) {
            if let Some(err) = queue.pop_front() {
                return Err(err);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ConnectApi for MemoryConnect {
    async fn list_flows(&self) -> Result<Vec<FlowSummary>, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_injected(&mut inner, "list_flows")?;
        Ok(inner
            .flows
            .iter()
            .map(|(id, (name, _))| FlowSummary {
                flow_id: id.clone(),
                name: name.clone(),
            })
            .collect())
    }

    async fn describe_flow(&self, flow_id: &str) -> Result<FlowSummary, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_injected(&mut inner, "describe_flow")?;
        inner
            .flows
            .get(flow_id)
            .map(|(name, _)| FlowSummary {
                flow_id: flow_id.to_owned(),
                name: name.clone(),
            })
            .ok_or_else(|| ApiError::NotFound(flow_id.to_owned()))
    }

    async fn get_flow_content(&self, flow_id: &str) -> Result<Value, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_injected(&mut inner, "get_flow_content")?;
        inner
            .flows
            .get(flow_id)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| ApiError::NotFound(flow_id.to_owned()))
    }

    async fn create_flow(&self, name: &str, content: &Value) -> Result<String, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_injected(&mut inner, "create_flow")?;
        inner.next_id += 1;
        let flow_id = format!("flow-{:04}", inner.next_id);
        inner
            .flows
            .insert(flow_id.clone(), (name.to_owned(), content.clone()));
        Ok(flow_id)
    }

    async fn update_flow_content(&self, flow_id: &str, content: &Value) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_injected(&mut inner, "update_flow_content")?;
        match inner.flows.get_mut(flow_id) {
            Some(entry) => {
                entry.1 = content.clone();
                Ok(())
            }
            None => Err(ApiError::NotFound(flow_id.to_owned())),
        }
    }

    async fn grant_invoke(&self, lambda_arn: &str, source_arn: &str) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_injected(&mut inner, "grant_invoke")?;
        inner
            .permissions
            .insert((lambda_arn.to_owned(), source_arn.to_owned()));
        Ok(())
    }

    async fn revoke_invoke(&self, lambda_arn: &str, source_arn: &str) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_injected(&mut inner, "revoke_invoke")?;
        inner
            .permissions
            .remove(&(lambda_arn.to_owned(), source_arn.to_owned()));
        Ok(())
    }

    async fn rebind_entry_point(&self, entry_point: &str, flow_id: &str) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_injected(&mut inner, "rebind_entry_point")?;
        if !inner.flows.contains_key(flow_id) {
            return Err(ApiError::NotFound(flow_id.to_owned()));
        }
        inner
            .bindings
            .insert(entry_point.to_owned(), flow_id.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn injected_errors_are_consumed_in_order() {
        let api = MemoryConnect::new();
        api.fail_next("create_flow", ApiError::Throttled("slow down".into()));

        let err = api.create_flow("f", &json!({})).await.unwrap_err();
        assert!(err.is_transient());

        // Second call succeeds; the queue is drained.
        api.create_flow("f", &json!({})).await.unwrap();
    }

    #[tokio::test]
    async fn rebind_requires_an_existing_flow() {
        let api = MemoryConnect::new();
        let err = api.rebind_entry_point("+15551234567", "flow-9999").await.unwrap_err();
        assert_eq!(err, ApiError::NotFound("flow-9999".into()));
    }
}

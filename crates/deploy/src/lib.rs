//! flowbridge-deploy: Blue/Green deployment orchestration and drift
//! detection for rendered contact-flow artifacts.
//!
//! The runtime service is abstracted behind [`ConnectApi`]; the
//! orchestrator owns version lifecycle and entry-point bindings, the drift
//! detector compares live content against the last deployed artifact.

pub mod api;
pub mod drift;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod record;
pub mod retry;

pub use api::{ApiError, ConnectApi, FlowSummary};
pub use drift::{DriftChange, DriftDetector, DriftReport, FlowDrift};
pub use error::{DeployError, DriftError};
pub use memory::MemoryConnect;
pub use orchestrator::{
    collect_lambda_arns, CutoverConfig, CutoverStage, CutoverStep, DeploymentOrchestrator,
    DeploymentOutcome, HealthSignal, SubmitRequest,
};
pub use record::{content_digest, DeploymentRecord, GrantFailure, LifecycleState, VersionId};
pub use retry::RetryPolicy;

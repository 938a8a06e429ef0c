use thiserror::Error;

use crate::api::ApiError;

/// Errors from the deployment orchestrator.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("version '{version}' already exists for flow '{flow}' in '{environment}'")]
    VersionExists {
        flow: String,
        environment: String,
        version: String,
    },

    #[error("no deployment record for flow '{flow}' version '{version}' in '{environment}'")]
    UnknownVersion {
        flow: String,
        environment: String,
        version: String,
    },

    #[error("no cutover in progress for flow '{flow}' in '{environment}'")]
    NoCutover { flow: String, environment: String },

    #[error("a cutover is already in progress for flow '{flow}' in '{environment}'")]
    CutoverInProgress { flow: String, environment: String },

    #[error(
        "cutover requires a pending version; flow '{flow}' version '{version}' is {state}"
    )]
    VersionNotPending {
        flow: String,
        version: String,
        state: &'static str,
    },

    #[error("cutover for flow '{flow}' already completed full stage")]
    CutoverComplete { flow: String },

    #[error("health signal reported unhealthy; cutover frozen at stage {stage}")]
    Unhealthy { stage: String },

    #[error("deletion refused: flow '{flow}' has an active version in '{environment}'")]
    DeleteRefused { flow: String, environment: String },

    /// Flow-level service failure. Fatal to the pipeline run. Every rebind
    /// already confirmed before the failure stays recorded; no entry point
    /// is left in an indeterminate state.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors from drift detection.
#[derive(Debug, Error)]
pub enum DriftError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

use thiserror::Error;

/// Errors from rendering a template against an environment map.
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    /// The first token path that failed to resolve. Rendering stops here;
    /// once one path is missing from the map, resolving the rest is
    /// meaningless.
    #[error("unresolved token: ${{{0}}}")]
    UnresolvedToken(String),

    /// Token syntax survived substitution (nested or newly introduced
    /// `${...}` text). Lists every remaining match.
    #[error("token syntax remains after substitution: {}", .0.join(", "))]
    TokensRemaining(Vec<String>),

    /// The rendered text is not valid JSON.
    #[error("rendered artifact is not valid JSON: {0}")]
    InvalidJson(String),

    /// Post-render validation failures, aggregated. Every violation found
    /// is listed, not just the first.
    #[error("rendered flow failed validation:\n  {}", .0.join("\n  "))]
    InvalidFlow(Vec<String>),
}

/// Errors from loading an environment map file.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("error reading environment file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing environment file '{path}': {message}")]
    Parse { path: String, message: String },
}

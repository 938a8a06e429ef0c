//! flowbridge-core: contact-flow template rendering core.
//!
//! Provides the pipeline from a raw Connect flow export to a rendered,
//! environment-specific artifact:
//!
//! - [`normalize()`] -- strip export noise and canonicalize a flow document
//! - [`EnvironmentMap`] -- per-environment token values and instance identity
//! - [`resolve_token()`] -- exact-path token lookup
//! - [`render()`] -- substitute every `${Service.Entity}` token, fail-fast
//! - [`validate_rendered_flow()`] -- post-render structural and format checks
//!
//! Rendering is pure: no I/O happens below the loaders in [`environment`].

pub mod environment;
pub mod error;
pub mod format;
pub mod normalize;
pub mod render;
pub mod token;

// ── Convenience re-exports: key types ────────────────────────────────

pub use environment::{ConnectIdentity, EnvironmentMap, TokenNode};
pub use error::{EnvError, RenderError};
pub use format::{is_connect_arn, is_e164, is_lambda_arn, parse_arn, Arn};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use normalize::normalize;
pub use render::{render, render_flow, validate_rendered_flow};
pub use token::{resolve_token, scan_template_tokens, scan_text_tokens};

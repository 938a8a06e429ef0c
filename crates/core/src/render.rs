//! Template rendering and post-render validation.
//!
//! Rendering is a single left-to-right substitution pass over the raw
//! template text. A substituted value is final text: it is never re-scanned
//! for further tokens, so a value that happens to contain `${...}` is caught
//! by the residue check rather than expanded.
//!
//! Token resolution fails fast on the first unresolved path. Post-render
//! validation is the opposite: it aggregates every violation it can find
//! before failing.

use serde_json::Value;

use crate::environment::EnvironmentMap;
use crate::error::RenderError;
use crate::format::{is_arn_shaped, is_e164, parse_arn};
use crate::token::{resolve_token, scan_text_tokens};

/// Render a template's raw text against one environment map.
///
/// Fails with [`RenderError::UnresolvedToken`] on the first path missing
/// from the map, and with [`RenderError::TokensRemaining`] when token syntax
/// survives substitution (nested syntax, or a substituted value that itself
/// contains `${`).
pub fn render(template_text: &str, env: &EnvironmentMap) -> Result<String, RenderError> {
    let matches = scan_text_tokens(template_text);

    let mut out = String::with_capacity(template_text.len());
    let mut cursor = 0;
    for m in &matches {
        let value = resolve_token(&m.path, env)
            .ok_or_else(|| RenderError::UnresolvedToken(m.path.clone()))?;
        out.push_str(&template_text[cursor..m.start]);
        out.push_str(value);
        cursor = m.end;
    }
    out.push_str(&template_text[cursor..]);

    let residue: Vec<String> = scan_text_tokens(&out).into_iter().map(|m| m.path).collect();
    if !residue.is_empty() {
        return Err(RenderError::TokensRemaining(residue));
    }
    if out.contains("${") {
        // Unclosed opener: not a scannable token, still forbidden output.
        return Err(RenderError::TokensRemaining(vec!["${".to_owned()]));
    }

    Ok(out)
}

/// Render and parse, then run post-render validation on the artifact.
pub fn render_flow(template_text: &str, env: &EnvironmentMap) -> Result<Value, RenderError> {
    let rendered = render(template_text, env)?;
    let artifact: Value =
        serde_json::from_str(&rendered).map_err(|e| RenderError::InvalidJson(e.to_string()))?;
    validate_rendered_flow(&artifact)?;
    Ok(artifact)
}

/// Post-render structural and format validation, independent of token
/// resolution. Fail-loud: every violation found is reported, not just the
/// first.
pub fn validate_rendered_flow(artifact: &Value) -> Result<(), RenderError> {
    let mut problems = Vec::new();

    for field in ["name", "type", "content"] {
        if artifact.get(field).is_none() {
            problems.push(format!("missing required top-level field '{}'", field));
        }
    }

    check_strings(artifact, "$", &mut problems);

    if problems.is_empty() {
        Ok(())
    } else {
        Err(RenderError::InvalidFlow(problems))
    }
}

fn check_strings(value: &Value, path: &str, problems: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if s.contains("${") {
                problems.push(format!("{}: token syntax remains: {}", path, s));
            }
            if let Some(idx) = s.find("arn:") {
                let candidate = arn_candidate(&s[idx..]);
                if parse_arn(candidate).is_none() {
                    problems.push(format!("{}: malformed ARN: {}", path, candidate));
                }
            } else if is_arn_shaped(s) && parse_arn(s).is_none() {
                problems.push(format!("{}: malformed ARN: {}", path, s));
            }
            if s.starts_with('+') && !is_e164(s) {
                problems.push(format!("{}: invalid E.164 phone number: {}", path, s));
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                check_strings(item, &format!("{}[{}]", path, i), problems);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                check_strings(v, &format!("{}.{}", path, k), problems);
            }
        }
        _ => {}
    }
}

/// Cut an ARN-shaped substring at the first character that cannot appear in
/// an ARN (whitespace or a quote).
fn arn_candidate(s: &str) -> &str {
    match s.find(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
        Some(end) => &s[..end],
        None => s,
    }
}

//! Token scanning and resolution.
//!
//! Tokens look like `${Service.Entity}` or `${Service.Entity.Variant}`.
//! Scanning is a character-level pass over string content; templates are
//! scanned structurally (walk the parsed tree, scan each string leaf), never
//! by pattern-matching serialized JSON.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::environment::{EnvironmentMap, TokenNode};

/// A token match found in raw text: the dotted path and the byte span of the
/// full `${...}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    pub path: String,
    pub start: usize,
    pub end: usize,
}

/// Scan raw text for token occurrences, left to right.
///
/// A token opens at `${` and closes at the next `}`. An unclosed `${` is not
/// a token and scanning stops there; the residue check in the renderer will
/// still see the dangling syntax.
pub fn scan_text_tokens(text: &str) -> Vec<TokenMatch> {
    let bytes = text.as_bytes();
    let mut matches = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'$' && bytes[i + 1] == b'{' {
            match text[i + 2..].find('}') {
                Some(rel) => {
                    let end = i + 2 + rel + 1;
                    matches.push(TokenMatch {
                        path: text[i + 2..end - 1].to_owned(),
                        start: i,
                        end,
                    });
                    i = end;
                }
                None => break,
            }
        } else {
            i += 1;
        }
    }
    matches
}

/// Collect the distinct token paths referenced anywhere in a parsed
/// template, in lexicographic order.
pub fn scan_template_tokens(doc: &Value) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    collect(doc, &mut paths);
    paths
}

fn collect(value: &Value, paths: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            for m in scan_text_tokens(s) {
                paths.insert(m.path);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, paths);
            }
        }
        Value::Object(map) => {
            for v in map.values() {
                collect(v, paths);
            }
        }
        _ => {}
    }
}

/// Resolve a dotted token path against an environment map's token tree.
///
/// The walk is exact: each segment must name a child of the current node,
/// and every intermediate node must be a branch. No partial matches, no
/// fallback defaults, no case folding. Returns None as soon as a segment
/// fails.
pub fn resolve_token<'a>(path: &str, env: &'a EnvironmentMap) -> Option<&'a str> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut node = env.tokens.get(first)?;
    for segment in segments {
        match node {
            TokenNode::Branch(children) => node = children.get(segment)?,
            TokenNode::Leaf(_) => return None,
        }
    }
    match node {
        TokenNode::Leaf(value) => Some(value),
        TokenNode::Branch(_) => None,
    }
}

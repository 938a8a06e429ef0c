//! Environment map model and YAML loader.
//!
//! One file per environment (`environments/dev.yaml`, ...). Structural
//! problems beyond parse failures are the validator's job, not the loader's.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::EnvError;

/// Connect instance identity for one environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ConnectIdentity {
    pub instance_id: String,
    pub instance_arn: String,
    pub region: String,
}

/// A node in the token value tree: either a concrete value or a nested map
/// (category -> entity, optionally entity -> variant).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TokenNode {
    Leaf(String),
    Branch(BTreeMap<String, TokenNode>),
}

/// A per-environment value tree plus instance identity and optional tuning
/// blocks. Loaded from YAML; internally consistent per the validator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EnvironmentMap {
    /// Environment name (`dev`/`test`/`prod`); derived from the file stem
    /// when absent from the document.
    #[serde(default)]
    pub name: String,

    pub connect: ConnectIdentity,

    #[serde(default)]
    pub tokens: BTreeMap<String, TokenNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<serde_json::Value>,
}

impl EnvironmentMap {
    /// Load an environment map from a YAML file. The environment name
    /// defaults to the file stem (`env/test.yaml` -> `test`).
    pub fn from_path(path: &Path) -> Result<EnvironmentMap, EnvError> {
        let text = std::fs::read_to_string(path).map_err(|source| EnvError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut env: EnvironmentMap =
            serde_yaml::from_str(&text).map_err(|e| EnvError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        if env.name.is_empty() {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                env.name = stem.to_owned();
            }
        }
        Ok(env)
    }

    /// Every defined token path, dotted, in lexicographic order.
    pub fn token_paths(&self) -> BTreeSet<String> {
        let mut paths = BTreeSet::new();
        for (category, node) in &self.tokens {
            flatten(category, node, &mut paths);
        }
        paths
    }

    /// Every (path, value) leaf pair, for value-grammar checks.
    pub fn token_values(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        for (category, node) in &self.tokens {
            leaves(category, node, &mut out);
        }
        out
    }
}

fn flatten(prefix: &str, node: &TokenNode, paths: &mut BTreeSet<String>) {
    match node {
        TokenNode::Leaf(_) => {
            paths.insert(prefix.to_owned());
        }
        TokenNode::Branch(children) => {
            for (name, child) in children {
                flatten(&format!("{}.{}", prefix, name), child, paths);
            }
        }
    }
}

fn leaves<'a>(prefix: &str, node: &'a TokenNode, out: &mut Vec<(String, &'a str)>) {
    match node {
        TokenNode::Leaf(value) => out.push((prefix.to_owned(), value)),
        TokenNode::Branch(children) => {
            for (name, child) in children {
                leaves(&format!("{}.{}", prefix, name), child, out);
            }
        }
    }
}

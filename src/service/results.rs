//! Service request and result types

use serde::Deserialize;
use serde_json::{Value, json};

use crate::store::codec::encode_children;
use crate::tree::Tree;

/// Request to add a file or folder to a project tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateNode {
    /// Project name or id.
    pub project: String,
    pub path: String,
    /// Raw node type as received; parsed by the service.
    pub node_type: String,
    pub author: Option<String>,
}

/// One entry of a batch create; the project is given once for the batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeRequest {
    #[serde(default)]
    pub path: String,
    #[serde(default, rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub author: Option<String>,
}

/// Authoritative tree as re-read from the store, with its flattened paths.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSnapshot {
    pub tree: Tree,
    pub paths: Vec<String>,
}

impl TreeSnapshot {
    pub fn from_tree(tree: Tree) -> Self {
        let paths = tree.list_paths();
        Self { tree, paths }
    }

    /// Stored document form plus the `paths` list.
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.tree.revision_id(),
            "projectId": self.tree.project_id(),
            "version": self.tree.version(),
            "children": Value::Object(encode_children(&self.tree)),
            "paths": self.paths,
        })
    }
}

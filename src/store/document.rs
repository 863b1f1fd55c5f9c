//! Persisted document shape
//!
//! One document per project: `{ id, projectId, version, children }`, where
//! `children` maps sanitized keys to nested node objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tree::NodeType;

/// Nested `children` mapping as stored. Key order is preserved.
pub type Children = Map<String, Value>;

/// A project's stored tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Storage key, also used as the tree's revision id.
    pub id: String,
    pub project_id: String,
    /// Bumped by every successful children replace.
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub children: Children,
}

impl Document {
    /// A fresh, empty document for `project_id` with a random storage key.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            project_id: project_id.into(),
            version: 0,
            children: Children::new(),
        }
    }
}

/// One node inside [`Document::children`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub created: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Children>,
}

/// Durability requested from a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteConcern {
    /// The backend has applied the write.
    #[default]
    Acknowledged,
    /// The write has also been flushed to stable storage.
    Synced,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_documents_get_distinct_ids() {
        let a = Document::new("p");
        let b = Document::new("p");
        assert_ne!(a.id, b.id);
        assert_eq!(a.version, 0);
        assert!(a.children.is_empty());
    }

    #[test]
    fn test_document_json_shape() {
        let mut doc = Document::new("p-1");
        doc.children.insert(
            "readmetxt".into(),
            json!({
                "name": "readme.txt",
                "path": "readme.txt",
                "type": "file",
                "created": "2024-01-01T00:00:00Z",
                "author": null
            }),
        );
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["projectId"], "p-1");
        assert_eq!(value["children"]["readmetxt"]["type"], "file");

        let node: DocumentNode =
            serde_json::from_value(value["children"]["readmetxt"].clone()).unwrap();
        assert_eq!(node.node_type, NodeType::File);
        assert!(node.children.is_none());
    }
}

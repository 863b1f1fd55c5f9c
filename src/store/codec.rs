//! Tree <-> document conversion
//!
//! The only place that knows both the in-memory [`Tree`] and its stored
//! form. Decoding re-checks the structural invariants so a damaged document
//! is reported instead of being served.

use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::store::document::{Children, Document, DocumentNode};
use crate::tree::paths::sanitize_key;
use crate::tree::{ChildEntry, Location, Node, Tree};

/// Encodes the root children of `tree` as stored.
pub fn encode_children(tree: &Tree) -> Children {
    encode_entries(tree, tree.root())
}

/// Encodes the whole tree, including its identity and version.
pub fn encode_document(tree: &Tree) -> Document {
    Document {
        id: tree.revision_id().to_string(),
        project_id: tree.project_id().to_string(),
        version: tree.version(),
        children: encode_children(tree),
    }
}

fn encode_entries(tree: &Tree, entries: &[ChildEntry]) -> Children {
    let mut map = Map::with_capacity(entries.len());
    for entry in entries {
        if let Some(node) = tree.node(entry.id) {
            map.insert(entry.key.clone(), encode_node(tree, node));
        }
    }
    map
}

fn encode_node(tree: &Tree, node: &Node) -> Value {
    let mut obj = Map::new();
    obj.insert("name".into(), Value::String(node.name().to_string()));
    obj.insert("path".into(), Value::String(node.path().to_string()));
    obj.insert("type".into(), Value::String(node.node_type().as_str().to_string()));
    obj.insert("created".into(), Value::String(node.created().to_string()));
    obj.insert(
        "author".into(),
        node.author()
            .map_or(Value::Null, |a| Value::String(a.to_string())),
    );
    if let Some(children) = node.children() {
        obj.insert("children".into(), Value::Object(encode_entries(tree, children)));
    }
    Value::Object(obj)
}

/// Rebuilds a [`Tree`] from a stored document.
pub fn decode(document: Document) -> Result<Tree, StoreError> {
    let mut tree = Tree::new(document.project_id, document.id, document.version);
    decode_entries(&mut tree, Location::Root, "", document.children)?;
    Ok(tree)
}

fn decode_entries(
    tree: &mut Tree,
    parent: Location,
    parent_path: &str,
    children: Children,
) -> Result<(), StoreError> {
    for (key, value) in children {
        let stored: DocumentNode = serde_json::from_value(value)?;

        if sanitize_key(&stored.name) != key {
            return Err(StoreError::Corrupt(format!(
                "key {} does not match name {}",
                key, stored.name
            )));
        }

        let expected_path = if parent_path.is_empty() {
            stored.name.clone()
        } else {
            format!("{}/{}", parent_path, stored.name)
        };
        if stored.path != expected_path {
            return Err(StoreError::Corrupt(format!(
                "node {} stored with path {}",
                expected_path, stored.path
            )));
        }

        if !stored.node_type.is_folder() && stored.children.is_some() {
            return Err(StoreError::Corrupt(format!(
                "file {} has children",
                stored.path
            )));
        }

        let node = Node::new(
            stored.name,
            stored.path.clone(),
            stored.node_type,
            stored.created,
            stored.author,
        );
        let id = tree.attach(parent, key, node);

        if stored.node_type.is_folder() {
            let nested = stored.children.unwrap_or_default();
            decode_entries(tree, Location::Node(id), &stored.path, nested)?;
        }
    }
    Ok(())
}

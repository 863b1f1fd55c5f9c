//! Tree model
//!
//! Arena-backed representation of a project's file tree. Nodes live in a
//! flat vector and folders refer to their children by [`NodeId`], so a
//! mutation never walks a chain of shared mutable references.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TreeError;

/// Kind of entry in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Folder,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::File => "file",
            NodeType::Folder => "folder",
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, NodeType::Folder)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(NodeType::File),
            "folder" => Ok(NodeType::Folder),
            other => Err(TreeError::InvalidType(other.to_string())),
        }
    }
}

/// Index of a node inside its owning [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A keyed slot in a folder's (or the root's) children list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub key: String,
    pub id: NodeId,
}

/// Result of a successful path resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Root,
    Node(NodeId),
}

/// A file or folder entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    path: String,
    node_type: NodeType,
    created: String,
    author: Option<String>,
    children: Option<Vec<ChildEntry>>,
}

impl Node {
    pub(crate) fn new(
        name: String,
        path: String,
        node_type: NodeType,
        created: String,
        author: Option<String>,
    ) -> Self {
        let children = node_type.is_folder().then(Vec::new);
        Self {
            name,
            path,
            node_type,
            created,
            author,
            children,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn created(&self) -> &str {
        &self.created
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Children of a folder; `None` for files.
    pub fn children(&self) -> Option<&[ChildEntry]> {
        self.children.as_deref()
    }

    pub fn is_folder(&self) -> bool {
        self.node_type.is_folder()
    }
}

/// Everything the caller decides about a node before it is inserted.
/// Name and path are derived from the target path.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDraft {
    pub node_type: NodeType,
    pub created: String,
    pub author: Option<String>,
}

impl NodeDraft {
    pub fn new(node_type: NodeType, created: impl Into<String>) -> Self {
        Self {
            node_type,
            created: created.into(),
            author: None,
        }
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }
}

/// The full file tree of one project.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    project_id: String,
    revision_id: String,
    version: u64,
    nodes: Vec<Node>,
    root: Vec<ChildEntry>,
}

impl Tree {
    /// Creates an empty tree bound to a stored document.
    pub fn new(project_id: impl Into<String>, revision_id: impl Into<String>, version: u64) -> Self {
        Self {
            project_id: project_id.into(),
            revision_id: revision_id.into(),
            version,
            nodes: Vec::new(),
            root: Vec::new(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn revision_id(&self) -> &str {
        &self.revision_id
    }

    /// Store version this tree was read at.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of nodes in the tree, root excluded.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node behind `id`, or `None` for an id minted by another tree.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Top-level children.
    pub fn root(&self) -> &[ChildEntry] {
        &self.root
    }

    /// Children at `location`, or `None` when it is a file.
    pub fn children(&self, location: Location) -> Option<&[ChildEntry]> {
        match location {
            Location::Root => Some(&self.root),
            Location::Node(id) => self.node(id)?.children(),
        }
    }

    /// Looks up `key` among the children at `location`.
    pub fn child(&self, location: Location, key: &str) -> Option<NodeId> {
        self.children(location)?
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.id)
    }

    /// Appends `node` under `parent` with `key`. Callers check that the
    /// parent is a folder and the key is free.
    pub(crate) fn attach(&mut self, parent: Location, key: String, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        let entry = ChildEntry { key, id };
        match parent {
            Location::Root => self.root.push(entry),
            Location::Node(parent_id) => {
                if let Some(children) = self.nodes[parent_id.0].children.as_mut() {
                    children.push(entry);
                }
            }
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_parsing() {
        assert_eq!("file".parse::<NodeType>().unwrap(), NodeType::File);
        assert_eq!("folder".parse::<NodeType>().unwrap(), NodeType::Folder);
        assert!(matches!(
            "symlink".parse::<NodeType>(),
            Err(TreeError::InvalidType(t)) if t == "symlink"
        ));
        assert!("Folder".parse::<NodeType>().is_err());
    }

    #[test]
    fn test_files_never_carry_children() {
        let file = Node::new("a.txt".into(), "a.txt".into(), NodeType::File, "t".into(), None);
        let folder = Node::new("a".into(), "a".into(), NodeType::Folder, "t".into(), None);
        assert!(file.children().is_none());
        assert_eq!(folder.children().map(|c| c.len()), Some(0));
    }

    #[test]
    fn test_empty_tree() {
        let tree = Tree::new("p-1", "rev-1", 0);
        assert!(tree.is_empty());
        assert_eq!(tree.project_id(), "p-1");
        assert_eq!(tree.revision_id(), "rev-1");
        assert_eq!(tree.children(Location::Root).map(|c| c.len()), Some(0));
    }

    #[test]
    fn test_foreign_node_id_is_not_found() {
        let mut other = Tree::new("p-2", "rev-2", 0);
        let id = other
            .insert("docs", NodeDraft::new(NodeType::Folder, "t"))
            .unwrap();

        let tree = Tree::new("p-1", "rev-1", 0);
        assert!(tree.node(id).is_none());
        assert!(tree.children(Location::Node(id)).is_none());
        assert!(tree.child(Location::Node(id), "docs").is_none());
    }
}

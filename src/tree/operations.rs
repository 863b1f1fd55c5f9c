//! Tree engine operations
//!
//! Resolution, existence checks, insertion and listing over an in-memory
//! [`Tree`]. Nothing here performs I/O.

use crate::error::{ConflictReason, TreeError};
use crate::tree::node::{ChildEntry, Location, Node, NodeDraft, NodeId, Tree};
use crate::tree::paths::{base_name, dir_name, is_root, normalize, sanitize_key, segments};
use crate::tree::validation::validate_name;

impl Tree {
    /// Finds the entry at `path`. `""` and `"."` resolve to the root.
    ///
    /// Each segment is looked up by its sanitized key and must match the
    /// stored display name; a file in the middle of the path ends the walk.
    pub fn resolve(&self, path: &str) -> Option<Location> {
        self.walk(path).ok()
    }

    /// True when the parent of `path` is a folder holding a node named
    /// like the base name of `path`.
    pub fn exists(&self, path: &str) -> bool {
        let name = base_name(path);
        let Some(parent) = self.resolve(&dir_name(path)) else {
            return false;
        };
        self.children(parent)
            .is_some_and(|children| children.iter().any(|e| self.node(e.id).is_some_and(|n| n.name() == name)))
    }

    /// Inserts a new node at `path` and returns its id.
    ///
    /// The parent folder must already exist; no intermediate folders are
    /// created and an occupied path is never overwritten. On error the tree
    /// is left untouched.
    pub fn insert(&mut self, path: &str, draft: NodeDraft) -> Result<NodeId, TreeError> {
        validate_name(path)?;

        let path = normalize(path);
        let conflict = |reason| TreeError::PathConflict {
            path: path.clone(),
            reason,
        };

        let parent = self.walk(&dir_name(&path)).map_err(conflict)?;
        let siblings = self
            .children(parent)
            .ok_or_else(|| conflict(ConflictReason::ParentIsFile))?;

        let name = base_name(&path).to_string();
        let key = sanitize_key(&name);

        if self.exists(&path) {
            return Err(conflict(ConflictReason::Occupied));
        }
        if siblings.iter().any(|entry| entry.key == key) {
            return Err(conflict(ConflictReason::KeyCollision));
        }

        let node = Node::new(name, path, draft.node_type, draft.created, draft.author);
        Ok(self.attach(parent, key, node))
    }

    /// Every path in the tree, depth-first, each folder before its contents,
    /// siblings in insertion order.
    pub fn list_paths(&self) -> Vec<String> {
        let mut paths = Vec::with_capacity(self.len());
        self.collect_paths(self.root(), &mut paths);
        paths
    }

    fn collect_paths(&self, entries: &[ChildEntry], out: &mut Vec<String>) {
        for entry in entries {
            let Some(node) = self.node(entry.id) else {
                continue;
            };
            out.push(node.path().to_string());
            if let Some(children) = node.children() {
                self.collect_paths(children, out);
            }
        }
    }

    fn walk(&self, path: &str) -> Result<Location, ConflictReason> {
        let mut current = Location::Root;
        if is_root(path) {
            return Ok(current);
        }
        for segment in segments(path) {
            if self.children(current).is_none() {
                return Err(ConflictReason::ParentIsFile);
            }
            let id = self
                .child(current, &sanitize_key(segment))
                .filter(|id| self.node(*id).is_some_and(|n| n.name() == segment))
                .ok_or(ConflictReason::MissingParent)?;
            current = Location::Node(id);
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::NodeType;

    fn folder() -> NodeDraft {
        NodeDraft::new(NodeType::Folder, "2024-01-01T00:00:00Z")
    }

    fn file() -> NodeDraft {
        NodeDraft::new(NodeType::File, "2024-01-01T00:00:00Z")
    }

    fn sample() -> Tree {
        let mut tree = Tree::new("p", "rev", 0);
        tree.insert("docs", folder()).unwrap();
        tree.insert("docs/readme.txt", file()).unwrap();
        tree.insert("docs/api", folder()).unwrap();
        tree.insert("docs/api/index.md", file()).unwrap();
        tree.insert("notes.txt", file()).unwrap();
        tree
    }

    #[test]
    fn test_insert_then_exists_and_listed_once() {
        let mut tree = Tree::new("p", "rev", 0);
        for path in ["a.txt", "b", "b/c.rs", "b/d", "b/d/e"] {
            let draft = if path.contains('.') { file() } else { folder() };
            tree.insert(path, draft).unwrap();
            assert!(tree.exists(path), "{path} should exist");
            let listed = tree.list_paths();
            assert_eq!(listed.iter().filter(|p| *p == path).count(), 1);
        }
    }

    #[test]
    fn test_docs_scenario() {
        let mut tree = Tree::new("p", "rev", 0);
        tree.insert("docs", folder()).unwrap();

        let docs = tree.child(Location::Root, "docs").unwrap();
        let docs = tree.node(docs).unwrap();
        assert_eq!(docs.node_type(), NodeType::Folder);
        assert_eq!(docs.children().map(|c| c.len()), Some(0));

        tree.insert("docs/readme.txt", file()).unwrap();
        assert_eq!(tree.list_paths(), vec!["docs", "docs/readme.txt"]);

        let before = tree.clone();
        let err = tree.insert("docs/readme.txt", file()).unwrap_err();
        assert!(matches!(
            err,
            TreeError::PathConflict { reason: ConflictReason::Occupied, .. }
        ));
        assert_eq!(tree, before);

        let err = tree.insert("note s.txt", file()).unwrap_err();
        assert!(matches!(err, TreeError::InvalidName(_)));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_missing_parent_is_not_created() {
        let mut tree = Tree::new("p", "rev", 0);
        let before = tree.clone();
        let err = tree.insert("a/b/c.txt", file()).unwrap_err();
        assert!(matches!(
            err,
            TreeError::PathConflict { reason: ConflictReason::MissingParent, ref path } if path == "a/b/c.txt"
        ));
        assert_eq!(tree, before);
        assert!(tree.resolve("a").is_none());

        tree.insert("a", folder()).unwrap();
        assert!(tree.insert("a/b/c.txt", file()).is_err());
        assert_eq!(tree.list_paths(), vec!["a"]);
    }

    #[test]
    fn test_file_cannot_hold_children() {
        let mut tree = sample();
        let err = tree.insert("notes.txt/inner.txt", file()).unwrap_err();
        assert!(matches!(
            err,
            TreeError::PathConflict { reason: ConflictReason::ParentIsFile, .. }
        ));
        let err = tree.insert("docs/readme.txt/x/y", file()).unwrap_err();
        assert!(matches!(
            err,
            TreeError::PathConflict { reason: ConflictReason::ParentIsFile, .. }
        ));
    }

    #[test]
    fn test_sanitized_key_collision_is_rejected() {
        let mut tree = Tree::new("p", "rev", 0);
        tree.insert("a.b", file()).unwrap();
        let before = tree.clone();
        let err = tree.insert("ab", folder()).unwrap_err();
        assert!(matches!(
            err,
            TreeError::PathConflict { reason: ConflictReason::KeyCollision, .. }
        ));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_resolve_root_and_missing() {
        let tree = sample();
        assert_eq!(tree.resolve(""), Some(Location::Root));
        assert_eq!(tree.resolve("."), Some(Location::Root));
        assert!(tree.resolve("missing").is_none());
        assert!(tree.resolve("notes.txt/child").is_none());
        assert!(tree.resolve("docs/api/index.md").is_some());
    }

    #[test]
    fn test_resolve_requires_matching_names() {
        let mut tree = Tree::new("p", "rev", 0);
        tree.insert("v1.0", folder()).unwrap();
        tree.insert("v1.0/notes.md", file()).unwrap();
        assert!(tree.resolve("v1.0/notes.md").is_some());
        // Same sanitized keys, different display names.
        assert!(tree.resolve("v10").is_none());
        assert!(tree.resolve("v10/notesmd").is_none());
        assert!(tree.insert("v10/other.md", file()).is_err());
    }

    #[test]
    fn test_parent_lookup_round_trip() {
        let tree = sample();
        for path in tree.list_paths() {
            let parent = tree.resolve(&dir_name(&path)).unwrap();
            let via_parent = tree.child(parent, &sanitize_key(base_name(&path))).unwrap();
            assert_eq!(tree.resolve(&path), Some(Location::Node(via_parent)));
        }
    }

    #[test]
    fn test_exists_for_top_level_paths() {
        let tree = sample();
        assert!(tree.exists("notes.txt"));
        assert!(tree.exists("docs"));
        assert!(!tree.exists("other.txt"));
        assert!(!tree.exists("missing/readme.txt"));
    }

    #[test]
    fn test_list_paths_depth_first_insertion_order() {
        let tree = sample();
        assert_eq!(
            tree.list_paths(),
            vec![
                "docs",
                "docs/readme.txt",
                "docs/api",
                "docs/api/index.md",
                "notes.txt",
            ]
        );
    }

    #[test]
    fn test_insert_normalizes_path_and_keeps_metadata() {
        let mut tree = Tree::new("p", "rev", 0);
        tree.insert("/docs/", folder()).unwrap();
        let id = tree
            .insert("docs//guide.md", file().with_author(Some("ada".into())))
            .unwrap();
        let node = tree.node(id).unwrap();
        assert_eq!(node.path(), "docs/guide.md");
        assert_eq!(node.name(), "guide.md");
        assert_eq!(node.author(), Some("ada"));
        assert_eq!(node.created(), "2024-01-01T00:00:00Z");
        assert!(node.children().is_none());
    }
}

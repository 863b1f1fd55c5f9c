//! Name validation
//!
//! The only lexical rule for new entries: the base name may not contain
//! whitespace or a `/`, and must still address something once sanitized.

use crate::error::TreeError;
use crate::tree::paths::{base_name, sanitize_key};

/// Returns false when the base name of `path` cannot be used for a new node.
pub fn is_valid_name(path: &str) -> bool {
    is_valid_base_name(base_name(path))
}

/// Checks a single display name.
pub fn is_valid_base_name(name: &str) -> bool {
    if name.chars().any(|c| c.is_whitespace() || c == '/') {
        return false;
    }
    !sanitize_key(name).is_empty()
}

/// Same check as [`is_valid_name`], as a `Result`.
pub fn validate_name(path: &str) -> Result<(), TreeError> {
    if is_valid_name(path) {
        Ok(())
    } else {
        Err(TreeError::InvalidName(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_whitespace() {
        assert!(!is_valid_name("my file.txt"));
        assert!(!is_valid_name("docs/note s.txt"));
        assert!(!is_valid_name("tab\there"));
        assert!(!is_valid_name("line\nbreak"));
    }

    #[test]
    fn test_accepts_plain_names() {
        assert!(is_valid_name("file.txt"));
        assert!(is_valid_name("folder1"));
        assert!(is_valid_name("docs/readme.txt"));
        // Only the base name is checked.
        assert!(is_valid_name("my docs/readme.txt"));
    }

    #[test]
    fn test_rejects_slash_in_base_name() {
        assert!(!is_valid_base_name("a/b"));
        assert!(is_valid_base_name("file.txt"));
        // As a path, "a/b" splits into segments and its base name is "b".
        assert!(is_valid_name("a/b"));
        assert_eq!(base_name("a/b"), "b");
    }

    #[test]
    fn test_rejects_unaddressable_names() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("/"));
        assert!(!is_valid_name("..."));
        assert!(matches!(validate_name("."), Err(TreeError::InvalidName(_))));
    }
}

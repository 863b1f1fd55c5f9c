//! Path utilities
//!
//! Pure helpers for slash-delimited virtual paths: segment splitting,
//! base/parent names and the storage key derived from a display name.

/// Splits `path` into its non-empty `/`-separated segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Returns the last non-empty segment of `path`, or `""` for the root.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').find(|s| !s.is_empty()).unwrap_or("")
}

/// Returns every segment except the last, joined by `/`.
///
/// Top-level paths yield `""`, which [`is_root`] treats the same as `"."`.
pub fn dir_name(path: &str) -> String {
    let mut parts = segments(path);
    parts.pop();
    parts.join("/")
}

/// True when `path` denotes the project root.
pub fn is_root(path: &str) -> bool {
    path == "." || segments(path).is_empty()
}

/// Re-joins the segments of `path`, dropping leading, trailing and repeated slashes.
pub fn normalize(path: &str) -> String {
    segments(path).join("/")
}

/// Derives the storage key for a display name by removing every `.`.
///
/// Document stores address nested fields with dotted notation, so keys must
/// never contain a literal dot. The mapping is deterministic but not
/// injective: `a.b` and `ab` share a key.
pub fn sanitize_key(name: &str) -> String {
    name.replace('.', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_skip_empty_parts() {
        assert_eq!(segments("/docs//readme.txt/"), vec!["docs", "readme.txt"]);
        assert!(segments("").is_empty());
        assert!(segments("///").is_empty());
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("docs/readme.txt"), "readme.txt");
        assert_eq!(base_name("docs/"), "docs");
        assert_eq!(base_name("notes.txt"), "notes.txt");
        assert_eq!(base_name(""), "");
    }

    #[test]
    fn test_dir_name_of_top_level_is_root() {
        assert_eq!(dir_name("docs/api/index.md"), "docs/api");
        assert_eq!(dir_name("notes.txt"), "");
        assert!(is_root(&dir_name("notes.txt")));
        assert!(is_root("."));
        assert!(is_root(""));
        assert!(!is_root("docs"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/docs//readme.txt/"), "docs/readme.txt");
        assert_eq!(normalize("a"), "a");
    }

    #[test]
    fn test_sanitize_key_strips_dots() {
        assert_eq!(sanitize_key("readme.txt"), "readmetxt");
        assert_eq!(sanitize_key(".env.local"), "envlocal");
        assert_eq!(sanitize_key("folder1"), "folder1");
        assert_eq!(sanitize_key("a.b"), sanitize_key("ab"));
    }
}

//! Path parsing
//!
//! Namespace paths are absolute and `/`-separated. Empty, `.` and `..`
//! components are rejected. The component [`SNAPSHOT_DIR`] is reserved: it
//! addresses the snapshots of the directory it follows.

use thiserror::Error;

/// Reserved component that enters a directory's snapshots
pub const SNAPSHOT_DIR: &str = ".snapshot";

/// Errors that can occur while parsing a path
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// Path is malformed
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Name cannot be used for a new entry
    #[error("Invalid name: {0}")]
    InvalidName(String),
}

/// Path resolver
///
/// Handles splitting paths into components and validating syntax.
pub struct PathResolver;

impl PathResolver {
    /// Returns true if `path` names the root directory
    pub fn is_root(path: &str) -> bool {
        !path.is_empty() && path.trim_matches('/').is_empty()
    }

    /// Splits a path into components
    ///
    /// The root path splits into no components.
    ///
    /// # Examples
    ///
    /// ```
    /// use fs_view::PathResolver;
    ///
    /// let components = PathResolver::split_path("/data/logs/app.log").unwrap();
    /// assert_eq!(components, vec!["data", "logs", "app.log"]);
    ///
    /// assert!(PathResolver::split_path("/").unwrap().is_empty());
    /// ```
    pub fn split_path(path: &str) -> Result<Vec<&str>, PathError> {
        if path.is_empty() {
            return Err(PathError::InvalidPath("Empty path".to_string()));
        }
        if !path.starts_with('/') {
            return Err(PathError::InvalidPath(format!("{}: path is not absolute", path)));
        }

        // Remove leading/trailing slashes
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let components: Vec<&str> = trimmed.split('/').collect();

        for component in &components {
            if component.is_empty() {
                return Err(PathError::InvalidPath(format!(
                    "{}: path contains empty component",
                    path
                )));
            }
            if *component == "." || *component == ".." {
                return Err(PathError::InvalidPath(format!(
                    "{}: relative path components (. or ..) are not supported",
                    path
                )));
            }
            if component.contains('\0') {
                return Err(PathError::InvalidPath(format!("{}: contains NUL", path)));
            }
        }

        Ok(components)
    }

    /// Returns true if any component is the reserved snapshot directory
    pub fn is_snapshot_path(components: &[&str]) -> bool {
        components.iter().any(|c| *c == SNAPSHOT_DIR)
    }

    /// Validates a single path component name
    ///
    /// Returns true if the name is valid for a new directory entry or
    /// snapshot.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && name != ".."
            && name != SNAPSHOT_DIR
            && !name.contains('/')
            && !name.contains('\0')
    }

    /// Joins a parent path and a child name
    pub fn join(parent: &str, name: &str) -> String {
        let parent = parent.trim_end_matches('/');
        format!("{}/{}", parent, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple_path() {
        let result = PathResolver::split_path("/todo.txt").unwrap();
        assert_eq!(result, vec!["todo.txt"]);
    }

    #[test]
    fn test_split_nested_path() {
        let result = PathResolver::split_path("/docs/notes/todo.txt").unwrap();
        assert_eq!(result, vec!["docs", "notes", "todo.txt"]);
    }

    #[test]
    fn test_split_path_with_trailing_slash() {
        let result = PathResolver::split_path("/docs/").unwrap();
        assert_eq!(result, vec!["docs"]);
    }

    #[test]
    fn test_root_path() {
        assert!(PathResolver::split_path("/").unwrap().is_empty());
        assert!(PathResolver::split_path("///").unwrap().is_empty());
        assert!(PathResolver::is_root("/"));
        assert!(!PathResolver::is_root("/a"));
        assert!(!PathResolver::is_root(""));
    }

    #[test]
    fn test_empty_path() {
        let result = PathResolver::split_path("");
        assert!(matches!(result, Err(PathError::InvalidPath(_))));
    }

    #[test]
    fn test_relative_path_rejected() {
        assert!(matches!(
            PathResolver::split_path("dir/foo"),
            Err(PathError::InvalidPath(_))
        ));
        assert!(matches!(
            PathResolver::split_path("foo/"),
            Err(PathError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_double_slash() {
        let result = PathResolver::split_path("/docs//notes.txt");
        assert!(matches!(result, Err(PathError::InvalidPath(_))));
    }

    #[test]
    fn test_relative_components() {
        assert!(matches!(
            PathResolver::split_path("/docs/./notes.txt"),
            Err(PathError::InvalidPath(_))
        ));
        assert!(matches!(
            PathResolver::split_path("/docs/../notes.txt"),
            Err(PathError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_snapshot_path_detection() {
        let components = PathResolver::split_path("/dir/.snapshot/s1/foo").unwrap();
        assert!(PathResolver::is_snapshot_path(&components));
        let components = PathResolver::split_path("/dir/foo").unwrap();
        assert!(!PathResolver::is_snapshot_path(&components));
    }

    #[test]
    fn test_is_valid_name() {
        assert!(PathResolver::is_valid_name("todo.txt"));
        assert!(PathResolver::is_valid_name("my-file"));
        assert!(PathResolver::is_valid_name(".snapshots"));

        assert!(!PathResolver::is_valid_name(""));
        assert!(!PathResolver::is_valid_name("."));
        assert!(!PathResolver::is_valid_name(".."));
        assert!(!PathResolver::is_valid_name(SNAPSHOT_DIR));
        assert!(!PathResolver::is_valid_name("has/slash"));
        assert!(!PathResolver::is_valid_name("has\0null"));
    }

    #[test]
    fn test_join() {
        assert_eq!(PathResolver::join("/", "a"), "/a");
        assert_eq!(PathResolver::join("/a/", "b"), "/a/b");
        assert_eq!(PathResolver::join("/a", "b"), "/a/b");
    }
}

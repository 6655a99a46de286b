//! Absolute node paths in the coordination tree

use serde::{Deserialize, Serialize};
use std::fmt;

const SEPARATOR: char = '/';

/// Normalized absolute path of a node.
///
/// Always starts with a single `/` and, except for the root, never ends
/// with one. Construct with [`NodePath::from_cli`] or [`NodePath::join`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct NodePath(String);

impl NodePath {
    /// The tree root
    pub fn root() -> Self {
        NodePath(SEPARATOR.to_string())
    }

    /// Join a user-supplied path against the root and clean it.
    ///
    /// Repeated separators collapse, `.` segments are dropped and `..`
    /// pops a segment without ever leaving the root.
    pub fn from_cli(raw: &str) -> Self {
        let mut segments: Vec<&str> = Vec::new();
        for segment in raw.split(SEPARATOR) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            return Self::root();
        }

        let mut path = String::with_capacity(raw.len() + 1);
        for segment in segments {
            path.push(SEPARATOR);
            path.push_str(segment);
        }
        NodePath(path)
    }

    /// Full path of a child of this node
    pub fn join(&self, child: &str) -> Self {
        Self::from_cli(&format!("{}{}{}", self.0, SEPARATOR, child))
    }

    /// Parent node, `None` for the root
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind(SEPARATOR) {
            Some(0) | None => Some(Self::root()),
            Some(idx) => Some(NodePath(self.0[..idx].to_string())),
        }
    }

    /// Last path segment, empty for the root
    pub fn name(&self) -> &str {
        self.0.rsplit(SEPARATOR).next().unwrap_or_default()
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<NodePath> for String {
    fn from(path: NodePath) -> Self {
        path.0
    }
}

impl TryFrom<String> for NodePath {
    type Error = std::convert::Infallible;

    fn try_from(raw: String) -> std::result::Result<Self, Self::Error> {
        Ok(NodePath::from_cli(&raw))
    }
}

impl std::str::FromStr for NodePath {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        Ok(NodePath::from_cli(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cli_prepends_root() {
        assert_eq!(NodePath::from_cli("a").as_str(), "/a");
        assert_eq!(NodePath::from_cli("a/b").as_str(), "/a/b");
        assert_eq!(NodePath::from_cli("/a/b").as_str(), "/a/b");
    }

    #[test]
    fn test_from_cli_cleans() {
        assert_eq!(NodePath::from_cli("").as_str(), "/");
        assert_eq!(NodePath::from_cli("/").as_str(), "/");
        assert_eq!(NodePath::from_cli("//a///b/").as_str(), "/a/b");
        assert_eq!(NodePath::from_cli("/a/./b").as_str(), "/a/b");
        assert_eq!(NodePath::from_cli("/a/../b").as_str(), "/b");
        // Cannot climb above the root
        assert_eq!(NodePath::from_cli("../../a").as_str(), "/a");
    }

    #[test]
    fn test_join() {
        let root = NodePath::root();
        assert_eq!(root.join("a").as_str(), "/a");

        let a = NodePath::from_cli("/a");
        assert_eq!(a.join("b").as_str(), "/a/b");
        assert_eq!(a.join("b/").as_str(), "/a/b");
    }

    #[test]
    fn test_parent_and_name() {
        let path = NodePath::from_cli("/a/b/c");
        assert_eq!(path.name(), "c");
        assert_eq!(path.parent(), Some(NodePath::from_cli("/a/b")));

        let top = NodePath::from_cli("/a");
        assert_eq!(top.parent(), Some(NodePath::root()));

        assert_eq!(NodePath::root().parent(), None);
        assert_eq!(NodePath::root().name(), "");
        assert!(NodePath::root().is_root());
    }

    #[test]
    fn test_serde_normalizes() {
        let path: NodePath = serde_json::from_str("\"a//b/\"").unwrap();
        assert_eq!(path.as_str(), "/a/b");
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"/a/b\"");
    }
}

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Repository file tree

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Kind of a node in a fetched repository tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub enum NodeKind {
    #[serde(rename = "file")]
    File,
    #[serde(rename = "dir")]
    Directory,
}

/// A file or directory in a repository tree.
///
/// Directories always carry `children` and never `content`; files carry
/// `content` and never `children`. Use [`TreeNode::file`] and
/// [`TreeNode::directory`] to build nodes so that this holds. The JSON form
/// follows the same rule, so an empty directory still has `children: []`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct TreeNode {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut node = serializer.serialize_struct("TreeNode", 3)?;
        node.serialize_field("path", &self.path)?;
        node.serialize_field("type", &self.kind)?;
        match self.kind {
            NodeKind::File => {
                node.serialize_field("content", self.content.as_deref().unwrap_or_default())?;
                node.skip_field("children")?;
            }
            NodeKind::Directory => {
                node.skip_field("content")?;
                node.serialize_field("children", &self.children)?;
            }
        }
        node.end()
    }
}

impl TreeNode {
    pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::File,
            content: Some(content.into()),
            children: Vec::new(),
        }
    }

    pub fn directory(path: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::Directory,
            content: None,
            children,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Number of file nodes in this subtree (including self)
    pub fn file_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 1,
            NodeKind::Directory => self.children.iter().map(TreeNode::file_count).sum(),
        }
    }

    /// Depth-first lookup of a node by its repository path
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_and_directory_keep_their_shape() {
        let file = TreeNode::file("src/main.rs", "fn main() {}");
        assert!(file.is_file());
        assert!(file.children.is_empty());
        assert_eq!(file.content.as_deref(), Some("fn main() {}"));

        let dir = TreeNode::directory("src", vec![file]);
        assert!(dir.is_directory());
        assert!(dir.content.is_none());
        assert_eq!(dir.children.len(), 1);
    }

    #[test]
    fn serializes_with_frontend_field_names() {
        let tree = TreeNode::directory("src", vec![TreeNode::file("src/lib.rs", "")]);
        let json = serde_json::to_value(&tree).unwrap();

        assert_eq!(json["type"], "dir");
        assert!(json.get("content").is_none());
        assert_eq!(json["children"][0]["type"], "file");
        assert_eq!(json["children"][0]["content"], "");
        assert!(json["children"][0].get("children").is_none());
    }

    #[test]
    fn empty_directory_still_has_children() {
        let json = serde_json::to_value(TreeNode::directory("empty", vec![])).unwrap();
        assert_eq!(json["children"], serde_json::json!([]));
        assert!(json.get("content").is_none());

        let back: TreeNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, TreeNode::directory("empty", vec![]));
    }

    #[test]
    fn counts_and_finds_nested_files() {
        let tree = TreeNode::directory(
            "",
            vec![
                TreeNode::file("README.md", "# hi"),
                TreeNode::directory(
                    "src",
                    vec![
                        TreeNode::file("src/a.rs", "a"),
                        TreeNode::directory("src/empty", vec![]),
                    ],
                ),
            ],
        );

        assert_eq!(tree.file_count(), 2);
        assert_eq!(tree.find("src/a.rs").and_then(|n| n.content.as_deref()), Some("a"));
        assert!(tree.find("src/missing.rs").is_none());
    }
}

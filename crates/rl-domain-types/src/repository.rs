// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Repository-related domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An `owner/repo` pair identifying a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Error returned when a repository name is not of the form `owner/repo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRepoName(pub String);

impl fmt::Display for InvalidRepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repository name must be 'owner/repo', got '{}'", self.0)
    }
}

impl std::error::Error for InvalidRepoName {}

impl FromStr for RepoRef {
    type Err = InvalidRepoName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/').map(str::trim);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(InvalidRepoName(s.to_string())),
        }
    }
}

/// Repository listing entry returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary {
    pub id: u64,
    /// Full `owner/repo` name
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub default_branch: String,
}

/// Type of an entry in a GitHub contents listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

/// One entry of a directory listing, without file bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: u64,
    /// Blob SHA; the version marker required to overwrite the entry
    pub sha: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_repo() {
        let repo: RepoRef = "octocat/hello-world".parse().unwrap();
        assert_eq!(repo.owner, "octocat");
        assert_eq!(repo.repo, "hello-world");
        assert_eq!(repo.to_string(), "octocat/hello-world");
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in ["", "octocat", "/repo", "owner/", "a/b/c"] {
            assert!(bad.parse::<RepoRef>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn content_entry_reads_github_listing() {
        let entry: ContentEntry = serde_json::from_value(serde_json::json!({
            "name": "src",
            "path": "src",
            "sha": "abc123",
            "size": 0,
            "type": "dir",
            "url": "https://api.github.com/repos/o/r/contents/src",
            "_links": {}
        }))
        .unwrap();
        assert_eq!(entry.kind, EntryKind::Dir);
        assert_eq!(entry.sha, "abc123");
    }
}

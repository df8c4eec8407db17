// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The GitHub contents API as RepoLens uses it

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use rl_domain_types::{ContentEntry, RepoRef, RepositorySummary};

use crate::error::{GitHubError, GitHubResult};

/// A single file as returned by `GET /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub sha: String,
    /// Base64 body, wrapped at 60 columns by GitHub
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl FileContent {
    /// Decode the body as text. Line breaks inside the base64 are ignored and
    /// invalid UTF-8 is replaced rather than rejected.
    pub fn decode_text(&self) -> GitHubResult<String> {
        if let Some(encoding) = self.encoding.as_deref() {
            if encoding != "base64" {
                return Err(GitHubError::Decode {
                    path: self.path.clone(),
                    reason: format!("unsupported encoding '{encoding}'"),
                });
            }
        }

        let compact: String = self.content.split_ascii_whitespace().collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| GitHubError::Decode {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutFileRequest {
    pub message: String,
    /// Base64 encoded new body
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// The authenticated GitHub account
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubUser {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Operations RepoLens performs against GitHub on behalf of one user
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Repositories the user owns or collaborates on, most recently updated first
    async fn list_repositories(&self) -> GitHubResult<Vec<RepositorySummary>>;

    /// List one directory. A path naming a single file yields one entry.
    async fn list_directory(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> GitHubResult<Vec<ContentEntry>>;

    async fn get_file(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> GitHubResult<FileContent>;

    async fn put_file(
        &self,
        repo: &RepoRef,
        path: &str,
        request: &PutFileRequest,
    ) -> GitHubResult<()>;

    async fn authenticated_user(&self) -> GitHubResult<GitHubUser>;
}

/// Builds a [`ContentApi`] bound to one user's access token
pub trait ContentApiProvider: Send + Sync {
    fn for_user(&self, access_token: &str) -> Arc<dyn ContentApi>;
}

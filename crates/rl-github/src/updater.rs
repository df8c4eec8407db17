// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use base64::Engine;
use tracing::info;

use rl_domain_types::RepoRef;

use crate::content::{ContentApi, PutFileRequest};
use crate::error::GitHubResult;

/// Commits a new body for an existing file.
///
/// The current blob sha is read first and sent with the write, so GitHub
/// rejects the update with [`crate::GitHubError::Conflict`] if the file
/// changed in between. Nothing is retried.
pub struct FileUpdater<'a> {
    api: &'a dyn ContentApi,
}

impl<'a> FileUpdater<'a> {
    pub fn new(api: &'a dyn ContentApi) -> Self {
        Self { api }
    }

    pub async fn update_file(
        &self,
        repo: &RepoRef,
        path: &str,
        new_content: &str,
        commit_message: &str,
        branch: Option<&str>,
    ) -> GitHubResult<()> {
        let current = self.api.get_file(repo, path, branch).await?;

        let request = PutFileRequest {
            message: commit_message.to_string(),
            content: base64::engine::general_purpose::STANDARD.encode(new_content),
            sha: Some(current.sha),
            branch: branch.map(str::to_string),
        };
        self.api.put_file(repo, path, &request).await?;

        info!(repo = %repo, path, branch = ?branch, "Committed file update");
        Ok(())
    }
}

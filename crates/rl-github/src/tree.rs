// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Recursive repository tree fetch

use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use rl_domain_types::{ContentEntry, EntryKind, RepoRef, TreeNode};

use crate::content::ContentApi;
use crate::error::{GitHubError, GitHubResult};

/// Guards against unbounded recursion and fan-out on large repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeLimits {
    /// Deepest directory level that may be listed; the root is level 0
    pub max_depth: usize,
    /// Total file bodies a single fetch may download
    pub max_files: usize,
    /// File bodies fetched at once within one directory
    pub concurrency: usize,
}

impl Default for TreeLimits {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_files: 2000,
            concurrency: 8,
        }
    }
}

/// Fetches a repository's files, with their bodies, as a [`TreeNode`] forest.
///
/// Listing failures abort the fetch. A file whose body cannot be fetched or
/// decoded is logged and left out, and its siblings are kept. Output follows
/// GitHub's listing order at every level.
pub struct TreeFetcher<'a> {
    api: &'a dyn ContentApi,
    limits: TreeLimits,
}

/// Per-fetch state shared by every recursion level
struct FetchContext<'a> {
    repo: &'a RepoRef,
    branch: &'a str,
    files_seen: AtomicUsize,
}

impl<'a> TreeFetcher<'a> {
    pub fn new(api: &'a dyn ContentApi, limits: TreeLimits) -> Self {
        Self { api, limits }
    }

    pub async fn fetch_tree(&self, repo: &RepoRef, branch: &str) -> GitHubResult<Vec<TreeNode>> {
        self.fetch_subtree(repo, branch, "").await
    }

    /// Fetch everything below `path` (empty for the repository root)
    pub async fn fetch_subtree(
        &self,
        repo: &RepoRef,
        branch: &str,
        path: &str,
    ) -> GitHubResult<Vec<TreeNode>> {
        let ctx = FetchContext {
            repo,
            branch,
            files_seen: AtomicUsize::new(0),
        };
        let nodes = self.fetch_dir(&ctx, path.to_string(), 0).await?;
        debug!(
            repo = %repo,
            branch,
            files = ctx.files_seen.load(Ordering::Relaxed),
            "Fetched repository tree"
        );
        Ok(nodes)
    }

    fn fetch_dir<'s>(
        &'s self,
        ctx: &'s FetchContext<'s>,
        path: String,
        depth: usize,
    ) -> BoxFuture<'s, GitHubResult<Vec<TreeNode>>> {
        async move {
            if depth > self.limits.max_depth {
                return Err(GitHubError::LimitExceeded(format!(
                    "'{path}' is nested deeper than {} levels",
                    self.limits.max_depth
                )));
            }

            let entries = self
                .api
                .list_directory(ctx.repo, &path, Some(ctx.branch))
                .await?;

            let file_entries: Vec<ContentEntry> = entries
                .iter()
                .filter(|e| e.kind == EntryKind::File)
                .cloned()
                .collect();
            let seen = ctx.files_seen.fetch_add(file_entries.len(), Ordering::Relaxed)
                + file_entries.len();
            if seen > self.limits.max_files {
                return Err(GitHubError::LimitExceeded(format!(
                    "repository has more than {} files",
                    self.limits.max_files
                )));
            }

            let mut bodies = stream::iter(file_entries)
                .map(move |entry: ContentEntry| async move { self.fetch_file(ctx, &entry).await })
                .buffered(self.limits.concurrency.max(1))
                .collect::<Vec<_>>()
                .await
                .into_iter();

            let mut nodes = Vec::with_capacity(entries.len());
            for entry in &entries {
                match entry.kind {
                    EntryKind::File => {
                        if let Some(node) = bodies.next().flatten() {
                            nodes.push(node);
                        }
                    }
                    EntryKind::Dir => {
                        let children = self.fetch_dir(ctx, entry.path.clone(), depth + 1).await?;
                        nodes.push(TreeNode::directory(entry.path.clone(), children));
                    }
                    EntryKind::Symlink | EntryKind::Submodule => {
                        debug!(path = %entry.path, kind = ?entry.kind, "Skipping entry");
                    }
                }
            }
            Ok(nodes)
        }
        .boxed()
    }

    async fn fetch_file(&self, ctx: &FetchContext<'_>, entry: &ContentEntry) -> Option<TreeNode> {
        let body = self
            .api
            .get_file(ctx.repo, &entry.path, Some(ctx.branch))
            .await
            .and_then(|file| file.decode_text());

        match body {
            Ok(text) => Some(TreeNode::file(entry.path.clone(), text)),
            Err(e) => {
                warn!(path = %entry.path, error = %e, "Omitting file whose content could not be fetched");
                None
            }
        }
    }
}

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! GitHub adapter for RepoLens
//!
//! [`ContentApi`] is the seam between RepoLens and GitHub's REST API. The
//! production implementation is [`GitHubClient`], handed out per user by
//! [`GitHubClientProvider`]. On top of it sit the recursive
//! [`TreeFetcher`] and the sha-checked [`FileUpdater`]. The OAuth web flow
//! lives in [`oauth`].

pub mod client;
pub mod content;
pub mod error;
pub mod mock;
pub mod oauth;
pub mod tree;
pub mod updater;

pub use client::{GitHubClient, GitHubClientConfig, GitHubClientProvider};
pub use content::{ContentApi, ContentApiProvider, FileContent, GitHubUser, PutFileRequest};
pub use error::{GitHubError, GitHubResult};
pub use oauth::{GitHubOAuth, IdentityProvider, OAuthConfig, OAuthIdentity};
pub use tree::{TreeFetcher, TreeLimits};
pub use updater::FileUpdater;

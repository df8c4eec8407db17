// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("GitHub rejected the credentials: {0}")]
    Unauthorized(String),

    #[error("Version conflict on {path}: {message}")]
    Conflict { path: String, message: String },

    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Repository tree limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("OAuth exchange failed: {0}")]
    OAuth(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

pub type GitHubResult<T> = Result<T, GitHubError>;

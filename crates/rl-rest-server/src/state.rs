// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server state management

use crate::config::ServerConfig;
use rl_analysis::TextGenerator;
use rl_github::{ContentApi, ContentApiProvider, IdentityProvider};
use rl_local_db::Database;
use std::sync::Arc;

/// Shared server state
///
/// Every remote collaborator sits behind a trait object so tests can swap in
/// fakes without touching the handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: Arc<Database>,

    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Builds GitHub content clients bound to a user's token
    pub github: Arc<dyn ContentApiProvider>,

    /// GitHub OAuth login
    pub identity: Arc<dyn IdentityProvider>,

    /// LLM used for chat and analysis
    pub llm: Arc<dyn TextGenerator>,
}

impl AppState {
    /// Get database reference
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Get configuration reference
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// GitHub client acting as the user who owns `access_token`
    pub fn github_for(&self, access_token: &str) -> Arc<dyn ContentApi> {
        self.github.for_user(access_token)
    }
}

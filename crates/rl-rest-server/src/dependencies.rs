// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Dependency wiring for the REST server

use crate::{config::ServerConfig, state::AppState};
use anyhow::{Context, Result};
use rl_analysis::AnthropicClient;
use rl_github::{GitHubClientProvider, GitHubOAuth};
use rl_local_db::Database;
use rl_logging::redact;
use std::sync::Arc;

/// Open the configured database, in memory for `:memory:`
pub fn open_database(config: &ServerConfig) -> Result<Arc<Database>> {
    let db = if config.database_path == ":memory:" {
        Database::open_in_memory()?
    } else {
        Database::open(&config.database_path)
            .with_context(|| format!("opening database {}", config.database_path))?
    };
    Ok(Arc::new(db))
}

/// Default dependency builder: SQLite, the GitHub REST API and Anthropic
pub struct DefaultServerDependencies {
    state: AppState,
}

impl DefaultServerDependencies {
    /// Build the production dependencies. Fails when credentials are missing.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;

        let db = open_database(&config)?;
        let purged = db.purge_expired_sessions()?;
        if purged > 0 {
            tracing::info!(purged, "Removed expired sessions");
        }

        let github = GitHubClientProvider::new(&config.github_client_config())
            .context("building GitHub client")?;
        let identity =
            GitHubOAuth::new(config.oauth_config()).context("building GitHub OAuth client")?;
        let llm = AnthropicClient::new(config.llm.clone()).context("building LLM client")?;
        tracing::info!(
            github_client_id = %config.github.client_id,
            github_client_secret = %redact(&config.github.client_secret),
            llm_model = %config.llm.model,
            llm_api_key = %redact(&config.llm.api_key),
            "Configured upstream clients"
        );

        let state = AppState {
            db,
            config: Arc::new(config),
            github: Arc::new(github),
            identity: Arc::new(identity),
            llm: Arc::new(llm),
        };

        Ok(Self { state })
    }

    /// Consume the dependency builder and return the resulting app state
    pub fn into_state(self) -> AppState {
        self.state
    }
}

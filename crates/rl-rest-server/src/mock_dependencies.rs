// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Dependency wiring with in-memory fakes, for tests and local demos

use crate::{config::ServerConfig, state::AppState};
use anyhow::Result;
use chrono::Duration;
use rl_analysis::mock::ScriptedGenerator;
use rl_github::mock::{MockContentApi, MockContentApiProvider, MockIdentityProvider};
use rl_local_db::{Database, NewUser};
use std::sync::Arc;

/// Token the fake OAuth exchange hands out
pub const MOCK_ACCESS_TOKEN: &str = "gho_mock_token";

/// Reply used when a test does not script the LLM
pub const DEFAULT_LLM_REPLY: &str = "Looks fine to me.";

/// Dependency wiring for the mock REST server.
///
/// The fakes stay reachable through the public handles so tests can script
/// them up front and inspect what the handlers did afterwards.
pub struct MockServerDependencies {
    state: AppState,
    pub github: Arc<MockContentApi>,
    pub github_provider: MockContentApiProvider,
    pub llm: Arc<ScriptedGenerator>,
}

impl MockServerDependencies {
    pub async fn new(config: ServerConfig) -> Result<Self> {
        Self::with_fakes(
            config,
            MockContentApi::new(),
            ScriptedGenerator::new(DEFAULT_LLM_REPLY),
        )
        .await
    }

    pub async fn with_fakes(
        config: ServerConfig,
        github: MockContentApi,
        llm: ScriptedGenerator,
    ) -> Result<Self> {
        let db = Arc::new(Database::open_in_memory()?);

        let user = github.user().clone();
        let github = Arc::new(github);
        let github_provider = MockContentApiProvider::new(Arc::clone(&github));
        let identity = MockIdentityProvider::new(user, MOCK_ACCESS_TOKEN);
        let llm = Arc::new(llm);

        let state = AppState {
            db,
            config: Arc::new(config),
            github: Arc::new(github_provider.clone()),
            identity: Arc::new(identity),
            llm: llm.clone(),
        };

        Ok(Self {
            state,
            github,
            github_provider,
            llm,
        })
    }

    /// Create a user and a live session without going through OAuth.
    /// Returns the session token.
    pub fn sign_in(&self) -> Result<String> {
        self.sign_in_as("1", "octocat")
    }

    pub fn sign_in_as(&self, github_id: &str, login: &str) -> Result<String> {
        let db = &self.state.db;
        let user = db.upsert_github_user(&NewUser {
            github_id: github_id.to_string(),
            login: login.to_string(),
            name: None,
            email: None,
            access_token: MOCK_ACCESS_TOKEN.to_string(),
        })?;
        let session = db.create_session(&user.id, Duration::hours(1))?;
        Ok(session.id)
    }

    /// Borrow the app state, e.g. to build a router while keeping the fakes
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    pub fn into_state(self) -> AppState {
        self.state
    }
}

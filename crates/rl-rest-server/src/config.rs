// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server configuration

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use rl_analysis::LlmConfig;
use rl_github::{GitHubClientConfig, OAuthConfig, TreeLimits};
use rl_logging::redact;
use serde::{Deserialize, Serialize};

/// Server configuration
///
/// Every field has a default, so a TOML file only needs the keys it
/// changes. Secrets are normally supplied through the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,

    /// Path to SQLite database, or `:memory:`
    pub database_path: String,

    /// Also allow the usual local dev origins
    pub enable_cors: bool,

    /// Browser app origin; OAuth redirects land here
    pub frontend_url: String,

    /// Public URL of this server, used for the OAuth callback
    pub backend_url: String,

    pub github: GitHubConfig,
    pub llm: LlmConfig,
    pub limits: LimitsConfig,
    pub session: SessionConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            database_path: ":memory:".to_string(),
            enable_cors: false,
            frontend_url: "http://localhost:3000".to_string(),
            backend_url: "http://localhost:3001".to_string(),
            github: GitHubConfig::default(),
            llm: LlmConfig::default(),
            limits: LimitsConfig::default(),
            session: SessionConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load a TOML file on top of the defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Check that everything the real GitHub and LLM clients need is present
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.github.client_id.is_empty() || self.github.client_secret.is_empty() {
            bail!("GitHub OAuth client id and secret are required (GITHUB_CLIENT_ID, GITHUB_CLIENT_SECRET)");
        }
        if self.llm.api_key.is_empty() {
            bail!("an Anthropic API key is required (ANTHROPIC_API_KEY)");
        }
        url::Url::parse(&self.frontend_url).context("frontend_url is not a valid URL")?;
        url::Url::parse(&self.backend_url).context("backend_url is not a valid URL")?;
        if self.limits.fetch_concurrency == 0 || self.limits.analysis_concurrency == 0 {
            bail!("concurrency limits must be at least 1");
        }
        Ok(())
    }

    pub fn tree_limits(&self) -> TreeLimits {
        TreeLimits {
            max_depth: self.limits.max_tree_depth,
            max_files: self.limits.max_tree_files,
            concurrency: self.limits.fetch_concurrency,
        }
    }

    pub fn github_client_config(&self) -> GitHubClientConfig {
        GitHubClientConfig {
            api_base_url: self.github.api_base_url.clone(),
            timeout: Duration::from_secs(self.github.timeout_secs),
            ..GitHubClientConfig::default()
        }
    }

    pub fn oauth_config(&self) -> OAuthConfig {
        let mut oauth = OAuthConfig::new(&self.github.client_id, &self.github.client_secret);
        oauth.oauth_base_url = self.github.oauth_base_url.clone();
        oauth.redirect_uri = Some(format!(
            "{}/auth/github/callback",
            self.backend_url.trim_end_matches('/')
        ));
        oauth.api = self.github_client_config();
        oauth
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub api_base_url: String,
    pub oauth_base_url: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("api_base_url", &self.api_base_url)
            .field("oauth_base_url", &self.oauth_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            api_base_url: "https://api.github.com".to_string(),
            oauth_base_url: "https://github.com".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_tree_depth: usize,
    pub max_tree_files: usize,
    /// File bodies fetched at once per directory
    pub fetch_concurrency: usize,
    /// LLM requests in flight per batch analysis
    pub analysis_concurrency: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let tree = TreeLimits::default();
        Self {
            max_tree_depth: tree.max_depth,
            max_tree_files: tree.max_files,
            fetch_concurrency: tree.concurrency,
            analysis_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Mark cookies `Secure`; turn off only for plain-HTTP local dev
    pub cookie_secure: bool,
    pub ttl_hours: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_secure: true,
            ttl_hours: 24,
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,

    /// Requests per minute per client
    pub requests_per_minute: u64,

    /// Key clients by the first `x-forwarded-for` hop. Only enable behind a
    /// reverse proxy that sets the header; otherwise the peer address is used.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: 120,
            trust_forwarded_for: false,
        }
    }
}

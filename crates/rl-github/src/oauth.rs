// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! GitHub OAuth web flow

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::client::{GitHubClient, GitHubClientConfig};
use crate::content::{ContentApi, GitHubUser};
use crate::error::{GitHubError, GitHubResult};

#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// `https://github.com` or an enterprise host
    pub oauth_base_url: String,
    /// Where GitHub sends the browser back to; omitted to use the app default
    pub redirect_uri: Option<String>,
    pub scopes: Vec<String>,
    pub api: GitHubClientConfig,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &rl_logging::redact(&self.client_secret))
            .field("oauth_base_url", &self.oauth_base_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("api", &self.api)
            .finish()
    }
}

impl OAuthConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            oauth_base_url: "https://github.com".to_string(),
            redirect_uri: None,
            scopes: vec!["user:email".to_string(), "repo".to_string()],
            api: GitHubClientConfig::default(),
        }
    }
}

/// Result of a successful code exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthIdentity {
    pub access_token: String,
    pub user: GitHubUser,
}

/// Third-party login provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL to send the browser to, carrying our anti-CSRF `state`
    fn authorize_url(&self, state: &str) -> GitHubResult<Url>;

    /// Trade the callback `code` for an access token and the account it belongs to
    async fn exchange_code(&self, code: &str) -> GitHubResult<OAuthIdentity>;
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_uri: Option<&'a str>,
}

/// GitHub answers 200 for both outcomes, with either a token or an error
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

pub struct GitHubOAuth {
    config: OAuthConfig,
    http_client: Client,
}

impl GitHubOAuth {
    pub fn new(config: OAuthConfig) -> GitHubResult<Self> {
        let http_client = Client::builder()
            .user_agent(&config.api.user_agent)
            .timeout(config.api.timeout)
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// `{oauth_base_url}/login/oauth/{endpoint}`, keeping any path prefix
    fn oauth_url(&self, endpoint: &str) -> GitHubResult<Url> {
        let mut url = Url::parse(&self.config.oauth_base_url)?;
        url.path_segments_mut()
            .map_err(|_| GitHubError::UnexpectedResponse("OAuth URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["login", "oauth", endpoint]);
        Ok(url)
    }
}

#[async_trait]
impl IdentityProvider for GitHubOAuth {
    fn authorize_url(&self, state: &str) -> GitHubResult<Url> {
        let mut url = self.oauth_url("authorize")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.client_id)
                .append_pair("scope", &self.config.scopes.join(" "))
                .append_pair("state", state);
            if let Some(redirect_uri) = &self.config.redirect_uri {
                query.append_pair("redirect_uri", redirect_uri);
            }
        }
        Ok(url)
    }

    async fn exchange_code(&self, code: &str) -> GitHubResult<OAuthIdentity> {
        let token_url = self.oauth_url("access_token")?;
        let request = TokenRequest {
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            code,
            redirect_uri: self.config.redirect_uri.as_deref(),
        };

        debug!("Exchanging OAuth code for access token");
        let response = self
            .http_client
            .post(token_url)
            .header(header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GitHubError::OAuth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| GitHubError::OAuth(format!("malformed token response: {e}")))?;

        let access_token = match (body.access_token, body.error) {
            (Some(token), None) if !token.is_empty() => token,
            (_, Some(error)) => {
                return Err(GitHubError::OAuth(
                    body.error_description.unwrap_or(error),
                ))
            }
            _ => return Err(GitHubError::OAuth("no access token in response".into())),
        };

        let client = GitHubClient::new(
            self.http_client.clone(),
            Url::parse(&self.config.api.api_base_url)?,
            access_token.clone(),
        );
        let mut user = client.authenticated_user().await?;
        if user.email.is_none() {
            user.email = client.primary_email().await.unwrap_or_else(|e| {
                debug!(error = %e, "Could not read account emails");
                None
            });
        }

        debug!(login = %user.login, "OAuth exchange complete");
        Ok(OAuthIdentity { access_token, user })
    }
}

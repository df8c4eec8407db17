// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! reqwest-based GitHub REST client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client as HttpClient, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use rl_domain_types::{ContentEntry, RepoRef, RepositorySummary};

use crate::content::{ContentApi, ContentApiProvider, FileContent, GitHubUser, PutFileRequest};
use crate::error::{GitHubError, GitHubResult};

const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    pub api_base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for GitHubClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("repolens/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Error body GitHub sends with non-2xx responses
#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

/// Subset of the repository object we surface
#[derive(Debug, Deserialize)]
struct RepositoryItem {
    id: u64,
    full_name: String,
    description: Option<String>,
    html_url: String,
    #[serde(default)]
    default_branch: String,
}

impl From<RepositoryItem> for RepositorySummary {
    fn from(item: RepositoryItem) -> Self {
        Self {
            id: item.id,
            name: item.full_name,
            description: item.description,
            url: item.html_url,
            default_branch: item.default_branch,
        }
    }
}

/// `GET /contents` answers with an array for directories and an object for files
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing {
    Many(Vec<ContentEntry>),
    One(ContentEntry),
}

#[derive(Debug, Deserialize)]
struct EmailItem {
    email: String,
    primary: bool,
    verified: bool,
}

/// GitHub client acting as a single user
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http_client: HttpClient,
    base_url: Url,
    token: String,
}

impl GitHubClient {
    pub fn new(http_client: HttpClient, base_url: Url, token: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url,
            token: token.into(),
        }
    }

    /// Build a standalone client with its own connection pool
    pub fn from_config(config: &GitHubClientConfig, token: impl Into<String>) -> GitHubResult<Self> {
        Ok(Self::new(
            build_http_client(config)?,
            Url::parse(&config.api_base_url)?,
            token,
        ))
    }

    /// The user's primary verified email, for accounts that hide it on `/user`
    pub async fn primary_email(&self) -> GitHubResult<Option<String>> {
        let url = self.endpoint(&["user", "emails"], "")?;
        let emails: Vec<EmailItem> = self.send(self.request(Method::GET, url)).await?;
        Ok(emails
            .into_iter()
            .find(|e| e.primary && e.verified)
            .map(|e| e.email))
    }

    /// `{base}/{segments...}/{path}` with every segment percent-encoded
    fn endpoint(&self, segments: &[&str], path: &str) -> GitHubResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GitHubError::UnexpectedResponse("base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments)
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn contents_url(&self, repo: &RepoRef, path: &str, git_ref: Option<&str>) -> GitHubResult<Url> {
        let mut url = self.endpoint(&["repos", &repo.owner, &repo.repo, "contents"], path)?;
        if let Some(git_ref) = git_ref {
            url.query_pairs_mut().append_pair("ref", git_ref);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> GitHubResult<T> {
        let response = request.send().await?;
        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> GitHubResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text)
                .map_err(|e| GitHubError::UnexpectedResponse(format!("{e}: {text}")));
        }

        Err(error_for_status(status, &text))
    }
}

fn error_message(text: &str) -> String {
    serde_json::from_str::<GitHubErrorBody>(text)
        .map(|body| body.message)
        .unwrap_or_else(|_| text.to_string())
}

fn error_for_status(status: StatusCode, text: &str) -> GitHubError {
    let message = error_message(text);
    match status {
        StatusCode::NOT_FOUND => GitHubError::NotFound(message),
        StatusCode::UNAUTHORIZED => GitHubError::Unauthorized(message),
        _ => GitHubError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// 409, or 422 complaining about the sha, means the blob moved under us
fn is_version_conflict(status: StatusCode, message: &str) -> bool {
    status == StatusCode::CONFLICT
        || (status == StatusCode::UNPROCESSABLE_ENTITY && message.contains("sha"))
}

#[async_trait]
impl ContentApi for GitHubClient {
    async fn list_repositories(&self) -> GitHubResult<Vec<RepositorySummary>> {
        let mut url = self.endpoint(&["user", "repos"], "")?;
        url.query_pairs_mut()
            .append_pair("sort", "updated")
            .append_pair("per_page", "100")
            .append_pair("affiliation", "owner,collaborator");

        let items: Vec<RepositoryItem> = self.send(self.request(Method::GET, url)).await?;
        tracing::debug!(count = items.len(), "Fetched repositories");
        Ok(items.into_iter().map(RepositorySummary::from).collect())
    }

    async fn list_directory(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> GitHubResult<Vec<ContentEntry>> {
        let url = self.contents_url(repo, path, git_ref)?;
        let listing: Listing = self.send(self.request(Method::GET, url)).await?;
        Ok(match listing {
            Listing::Many(entries) => entries,
            Listing::One(entry) => vec![entry],
        })
    }

    async fn get_file(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> GitHubResult<FileContent> {
        let url = self.contents_url(repo, path, git_ref)?;
        let value: serde_json::Value = self.send(self.request(Method::GET, url)).await?;
        if value.is_array() {
            return Err(GitHubError::UnexpectedResponse(format!(
                "{path} is a directory"
            )));
        }
        serde_json::from_value(value)
            .map_err(|e| GitHubError::UnexpectedResponse(format!("{path}: {e}")))
    }

    async fn put_file(
        &self,
        repo: &RepoRef,
        path: &str,
        request: &PutFileRequest,
    ) -> GitHubResult<()> {
        let url = self.contents_url(repo, path, None)?;
        let response = self.request(Method::PUT, url).json(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await?;
        let message = error_message(&text);
        if is_version_conflict(status, &message) {
            return Err(GitHubError::Conflict {
                path: path.to_string(),
                message,
            });
        }
        Err(error_for_status(status, &text))
    }

    async fn authenticated_user(&self) -> GitHubResult<GitHubUser> {
        let url = self.endpoint(&["user"], "")?;
        self.send(self.request(Method::GET, url)).await
    }
}

fn build_http_client(config: &GitHubClientConfig) -> GitHubResult<HttpClient> {
    Ok(HttpClient::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout)
        .build()?)
}

/// Shares one connection pool across per-user clients
#[derive(Debug, Clone)]
pub struct GitHubClientProvider {
    http_client: HttpClient,
    base_url: Url,
}

impl GitHubClientProvider {
    pub fn new(config: &GitHubClientConfig) -> GitHubResult<Self> {
        Ok(Self {
            http_client: build_http_client(config)?,
            base_url: Url::parse(&config.api_base_url)?,
        })
    }

    pub fn client(&self, access_token: &str) -> GitHubClient {
        GitHubClient::new(self.http_client.clone(), self.base_url.clone(), access_token)
    }
}

impl ContentApiProvider for GitHubClientProvider {
    fn for_user(&self, access_token: &str) -> Arc<dyn ContentApi> {
        Arc::new(self.client(access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> GitHubClient {
        GitHubClient::new(HttpClient::new(), Url::parse(base).unwrap(), "t")
    }

    #[test]
    fn contents_url_encodes_segments_and_ref() {
        let repo = RepoRef::new("octo", "hello");
        let url = client("https://api.github.com")
            .contents_url(&repo, "docs/read me.md", Some("feature/x"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/octo/hello/contents/docs/read%20me.md?ref=feature%2Fx"
        );
    }

    #[test]
    fn endpoint_keeps_enterprise_prefix() {
        let url = client("https://ghe.example.com/api/v3/").endpoint(&["user"], "").unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/user");
    }

    #[test]
    fn sha_complaints_are_conflicts() {
        assert!(is_version_conflict(StatusCode::CONFLICT, "anything"));
        assert!(is_version_conflict(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid request.\n\n\"sha\" wasn't supplied."
        ));
        assert!(!is_version_conflict(StatusCode::UNPROCESSABLE_ENTITY, "Invalid path"));
    }
}

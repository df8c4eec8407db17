// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! In-memory [`ContentApi`] for tests
//!
//! Holds a single repository as a flat map of file paths to bodies. Every
//! file carries a sha that changes on each write, so stale-write handling
//! behaves like GitHub's.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use base64::Engine;
use url::Url;

use rl_domain_types::{ContentEntry, EntryKind, RepoRef, RepositorySummary};

use crate::content::{ContentApi, ContentApiProvider, FileContent, GitHubUser, PutFileRequest};
use crate::error::{GitHubError, GitHubResult};
use crate::oauth::{IdentityProvider, OAuthIdentity};

#[derive(Debug, Clone)]
struct StoredFile {
    body: String,
    version: u64,
}

impl StoredFile {
    fn sha(&self, path: &str) -> String {
        format!("{:016x}", fnv1a(path) ^ self.version)
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes()
        .fold(0xcbf2_9ce4_8422_2325, |h, b| (h ^ u64::from(b)).wrapping_mul(0x100_0000_01b3))
}

#[derive(Debug, Default)]
struct MockState {
    files: BTreeMap<String, StoredFile>,
    failing_files: HashSet<String>,
    failing_listings: HashSet<String>,
    pending_edits: HashMap<String, String>,
    commits: Vec<String>,
}

/// Fake GitHub for one repository and one user
#[derive(Debug)]
pub struct MockContentApi {
    state: Mutex<MockState>,
    repositories: Vec<RepositorySummary>,
    user: GitHubUser,
    calls: AtomicUsize,
}

impl Default for MockContentApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContentApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            repositories: Vec::new(),
            user: GitHubUser {
                id: 1,
                login: "octocat".into(),
                name: Some("The Octocat".into()),
                email: Some("octocat@example.com".into()),
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_file(self, path: &str, body: &str) -> Self {
        self.lock().files.insert(
            path.to_string(),
            StoredFile {
                body: body.to_string(),
                version: 1,
            },
        );
        self
    }

    /// Fetching this file's body fails; listings still show it
    pub fn failing_file(self, path: &str) -> Self {
        self.lock().failing_files.insert(path.to_string());
        self
    }

    /// Listing this directory fails with `NotFound`
    pub fn failing_listing(self, path: &str) -> Self {
        self.lock().failing_listings.insert(path.to_string());
        self
    }

    /// Simulate another writer committing `body` right before our next write
    pub fn concurrent_edit_on_next_write(self, path: &str, body: &str) -> Self {
        self.lock()
            .pending_edits
            .insert(path.to_string(), body.to_string());
        self
    }

    pub fn with_repository(mut self, repo: RepositorySummary) -> Self {
        self.repositories.push(repo);
        self
    }

    pub fn with_user(mut self, user: GitHubUser) -> Self {
        self.user = user;
        self
    }

    /// Account returned by `authenticated_user`
    pub fn user(&self) -> &GitHubUser {
        &self.user
    }

    pub fn file_body(&self, path: &str) -> Option<String> {
        self.lock().files.get(path).map(|f| f.body.clone())
    }

    /// Commit messages of successful writes, oldest first
    pub fn commits(&self) -> Vec<String> {
        self.lock().commits.clone()
    }

    /// Number of API calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn entry(path: &str, kind: EntryKind, sha: String, size: u64) -> ContentEntry {
    ContentEntry {
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        kind,
        size,
        sha,
    }
}

#[async_trait]
impl ContentApi for MockContentApi {
    async fn list_repositories(&self) -> GitHubResult<Vec<RepositorySummary>> {
        self.record_call();
        Ok(self.repositories.clone())
    }

    async fn list_directory(
        &self,
        _repo: &RepoRef,
        path: &str,
        _git_ref: Option<&str>,
    ) -> GitHubResult<Vec<ContentEntry>> {
        self.record_call();
        let state = self.lock();
        let path = path.trim_matches('/');

        if state.failing_listings.contains(path) {
            return Err(GitHubError::NotFound(path.to_string()));
        }
        if let Some(file) = state.files.get(path) {
            return Ok(vec![entry(path, EntryKind::File, file.sha(path), file.body.len() as u64)]);
        }

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        let mut entries: Vec<ContentEntry> = Vec::new();
        for (file_path, file) in state.files.range(prefix.clone()..) {
            let Some(rest) = file_path.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                None => entries.push(entry(
                    file_path,
                    EntryKind::File,
                    file.sha(file_path),
                    file.body.len() as u64,
                )),
                Some((dir, _)) => {
                    let dir_path = format!("{prefix}{dir}");
                    if entries.last().map(|e| e.path.as_str()) != Some(dir_path.as_str()) {
                        let sha = format!("{:016x}", fnv1a(&dir_path));
                        entries.push(entry(&dir_path, EntryKind::Dir, sha, 0));
                    }
                }
            }
        }

        if entries.is_empty() && !path.is_empty() {
            return Err(GitHubError::NotFound(path.to_string()));
        }
        Ok(entries)
    }

    async fn get_file(
        &self,
        _repo: &RepoRef,
        path: &str,
        _git_ref: Option<&str>,
    ) -> GitHubResult<FileContent> {
        self.record_call();
        let state = self.lock();
        if state.failing_files.contains(path) {
            return Err(GitHubError::Api {
                status: 500,
                message: format!("failed to read {path}"),
            });
        }
        let file = state
            .files
            .get(path)
            .ok_or_else(|| GitHubError::NotFound(path.to_string()))?;
        Ok(FileContent {
            path: path.to_string(),
            sha: file.sha(path),
            content: base64::engine::general_purpose::STANDARD.encode(&file.body),
            encoding: Some("base64".into()),
        })
    }

    async fn put_file(
        &self,
        _repo: &RepoRef,
        path: &str,
        request: &PutFileRequest,
    ) -> GitHubResult<()> {
        self.record_call();
        let mut state = self.lock();

        if let Some(body) = state.pending_edits.remove(path) {
            if let Some(file) = state.files.get_mut(path) {
                file.body = body;
                file.version += 1;
            }
        }

        let body = base64::engine::general_purpose::STANDARD
            .decode(&request.content)
            .map_err(|e| GitHubError::Api {
                status: 422,
                message: e.to_string(),
            })?;
        let body = String::from_utf8_lossy(&body).into_owned();

        match state.files.get_mut(path) {
            Some(file) => {
                if request.sha.as_deref() != Some(file.sha(path).as_str()) {
                    return Err(GitHubError::Conflict {
                        path: path.to_string(),
                        message: format!("{path} does not match"),
                    });
                }
                file.body = body;
                file.version += 1;
            }
            None => {
                state.files.insert(path.to_string(), StoredFile { body, version: 1 });
            }
        }
        state.commits.push(request.message.clone());
        Ok(())
    }

    async fn authenticated_user(&self) -> GitHubResult<GitHubUser> {
        self.record_call();
        Ok(self.user.clone())
    }
}

/// Hands the same [`MockContentApi`] to every user and remembers the tokens
#[derive(Debug, Clone)]
pub struct MockContentApiProvider {
    api: Arc<MockContentApi>,
    tokens: Arc<Mutex<Vec<String>>>,
}

impl MockContentApiProvider {
    pub fn new(api: Arc<MockContentApi>) -> Self {
        Self {
            api,
            tokens: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn api(&self) -> &Arc<MockContentApi> {
        &self.api
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens
            .lock()
            .map(|t| t.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ContentApiProvider for MockContentApiProvider {
    fn for_user(&self, access_token: &str) -> Arc<dyn ContentApi> {
        self.tokens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(access_token.to_string());
        self.api.clone()
    }
}

/// Code that [`MockIdentityProvider`] refuses to exchange
pub const REJECTED_OAUTH_CODE: &str = "rejected-code";

/// Fake OAuth provider: every code but [`REJECTED_OAUTH_CODE`] signs in `user`
#[derive(Debug, Clone)]
pub struct MockIdentityProvider {
    user: GitHubUser,
    access_token: String,
}

impl MockIdentityProvider {
    pub fn new(user: GitHubUser, access_token: impl Into<String>) -> Self {
        Self {
            user,
            access_token: access_token.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn authorize_url(&self, state: &str) -> GitHubResult<Url> {
        let mut url = Url::parse("https://github.test/login/oauth/authorize")?;
        url.query_pairs_mut().append_pair("state", state);
        Ok(url)
    }

    async fn exchange_code(&self, code: &str) -> GitHubResult<OAuthIdentity> {
        if code == REJECTED_OAUTH_CODE {
            return Err(GitHubError::OAuth("bad_verification_code".into()));
        }
        Ok(OAuthIdentity {
            access_token: self.access_token.clone(),
            user: self.user.clone(),
        })
    }
}

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Business logic services
//!
//! Handlers resolve the caller and validate input, then hand off here.
//! Services only see trait objects, so they run the same against fakes.

use rl_analysis::{
    analyze_files, extract_code_change, parse_analysis,
    prompts::{analysis_prompt, chat_prompt},
    SourceFile, TextGenerator,
};
use rl_domain_types::{ContentEntry, RepoRef, RepositorySummary, StoredAnalysis, TreeNode};
use rl_github::{ContentApi, FileUpdater, TreeFetcher, TreeLimits};
use rl_local_db::Database;
use rl_rest_api_contract::{ChatAction, ChatRequest, ChatResponse, CreateAnalysisRequest};
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};

/// Repository browsing and editing on behalf of one user
pub struct RepositoryService<'a> {
    api: &'a dyn ContentApi,
    limits: TreeLimits,
}

impl<'a> RepositoryService<'a> {
    pub fn new(api: &'a dyn ContentApi, limits: TreeLimits) -> Self {
        Self { api, limits }
    }

    pub async fn list_repositories(&self) -> ServerResult<Vec<RepositorySummary>> {
        Ok(self.api.list_repositories().await?)
    }

    /// Top-level entries of the default branch
    pub async fn root_listing(&self, repo: &RepoRef) -> ServerResult<Vec<ContentEntry>> {
        Ok(self.api.list_directory(repo, "", None).await?)
    }

    /// Whole tree of `branch` with file bodies
    pub async fn tree(&self, repo: &RepoRef, branch: &str) -> ServerResult<Vec<TreeNode>> {
        let tree = TreeFetcher::new(self.api, self.limits)
            .fetch_tree(repo, branch)
            .await?;
        Ok(tree)
    }

    pub async fn update_file(
        &self,
        repo: &RepoRef,
        path: &str,
        content: &str,
        message: &str,
        branch: Option<&str>,
    ) -> ServerResult<()> {
        FileUpdater::new(self.api)
            .update_file(repo, path, content, message, branch)
            .await?;
        Ok(())
    }
}

/// Chat and single-file analysis
pub struct ChatService<'a> {
    llm: &'a dyn TextGenerator,
}

impl<'a> ChatService<'a> {
    pub fn new(llm: &'a dyn TextGenerator) -> Self {
        Self { llm }
    }

    /// `analyze` treats the message as the file body and returns the four
    /// review sections; `chat` returns the reply plus any proposed edit.
    pub async fn respond(&self, request: &ChatRequest) -> ServerResult<ChatResponse> {
        let context = request.context.as_ref();
        let action = context.map(|c| c.action).unwrap_or_default();

        match (action, context) {
            (ChatAction::Analyze, Some(context)) => {
                let prompt = analysis_prompt(&context.file_path, &request.message);
                let reply = self.llm.request_analysis(&prompt).await?;
                let sections = parse_analysis(&reply);
                if sections.is_empty() {
                    warn!(file = %context.file_path, "Analysis reply had no recognised sections");
                }
                Ok(ChatResponse {
                    message: reply,
                    analysis: Some(sections),
                    code_change: None,
                })
            }
            _ => {
                let prompt = chat_prompt(
                    context.map(|c| c.file_path.as_str()),
                    context.and_then(|c| c.content.as_deref()),
                    &request.history,
                    &request.message,
                );
                let reply = self.llm.request_analysis(&prompt).await?;
                let code_change = extract_code_change(&reply);
                Ok(ChatResponse {
                    message: reply,
                    analysis: None,
                    code_change,
                })
            }
        }
    }
}

/// Stored batch analyses
pub struct AnalysisService<'a> {
    db: &'a Database,
    llm: &'a dyn TextGenerator,
    concurrency: usize,
}

impl<'a> AnalysisService<'a> {
    pub fn new(db: &'a Database, llm: &'a dyn TextGenerator, concurrency: usize) -> Self {
        Self {
            db,
            llm,
            concurrency,
        }
    }

    /// Record the analysis as processing, run it, then settle the record.
    /// A failed batch leaves the record `Failed` and reports the failure.
    pub async fn create(
        &self,
        user_id: &str,
        request: &CreateAnalysisRequest,
    ) -> ServerResult<StoredAnalysis> {
        let record = self.db.create_analysis(user_id, &request.repo_name)?;
        let files: Vec<SourceFile> = request
            .files
            .iter()
            .map(|f| SourceFile {
                path: f.path.clone(),
                content: f.content.clone(),
            })
            .collect();

        match analyze_files(self.llm, &files, self.concurrency).await {
            Ok(changes) => {
                let stored = self.db.complete_analysis(&record.id, &changes)?;
                info!(analysis = %stored.id, files = files.len(), "Analysis completed");
                Ok(stored)
            }
            Err(err) => {
                warn!(analysis = %record.id, error = %err, "Analysis failed");
                self.db.fail_analysis(&record.id)?;
                Err(ServerError::from(err))
            }
        }
    }

    /// The caller's analysis; someone else's reads as missing
    pub fn get_owned(&self, user_id: &str, id: &str) -> ServerResult<StoredAnalysis> {
        match self.db.get_analysis(id)? {
            Some(analysis) if analysis.user_id == user_id => Ok(analysis),
            _ => Err(ServerError::NotFound(format!("analysis {id}"))),
        }
    }

    pub fn list(&self, user_id: &str) -> ServerResult<Vec<StoredAnalysis>> {
        Ok(self.db.list_analyses_for_user(user_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_analysis::mock::ScriptedGenerator;
    use rl_domain_types::AnalysisStatus;
    use rl_local_db::NewUser;
    use rl_rest_api_contract::{AnalysisFile, ChatContext};

    fn add_user(db: &Database, github_id: &str) -> String {
        db.upsert_github_user(&NewUser {
            github_id: github_id.into(),
            login: format!("user{github_id}"),
            name: None,
            email: None,
            access_token: "gho_test".into(),
        })
        .unwrap()
        .id
    }

    fn chat(message: &str, context: Option<ChatContext>) -> ChatRequest {
        ChatRequest {
            message: message.into(),
            context,
            history: Vec::new(),
        }
    }

    #[tokio::test]
    async fn analyze_action_returns_sections() {
        let llm = ScriptedGenerator::new(
            "OVERVIEW: adds\nANALYSIS: fine\nCHANGES: none\nRISKS: low",
        );
        let request = chat(
            "fn add(a: i32, b: i32) -> i32 { a + b }",
            Some(ChatContext {
                repo_name: Some("o/r".into()),
                file_path: "src/lib.rs".into(),
                content: None,
                action: ChatAction::Analyze,
            }),
        );

        let response = ChatService::new(&llm).respond(&request).await.unwrap();
        let sections = response.analysis.unwrap();
        assert_eq!(sections.overview, "adds");
        assert_eq!(sections.risks, "low");
        assert!(response.code_change.is_none());
        assert!(llm.prompts()[0].contains("fn add(a: i32, b: i32)"));
    }

    #[tokio::test]
    async fn chat_without_context_extracts_code() {
        let llm = ScriptedGenerator::new("Try this:\nCODE_START\nlet x = 1;\nCODE_END\n");
        let response = ChatService::new(&llm)
            .respond(&chat("make it shorter", None))
            .await
            .unwrap();
        assert!(response.analysis.is_none());
        let change = response.code_change.unwrap();
        assert_eq!(change.content, "let x = 1;");
        assert_eq!(change.description, "Try this:");
    }

    #[tokio::test]
    async fn failed_batch_marks_record_failed() {
        let db = Database::open_in_memory().unwrap();
        let user = add_user(&db, "1");
        let llm = ScriptedGenerator::new("ok").fail_when("b.rs");
        let service = AnalysisService::new(&db, &llm, 2);
        let request = CreateAnalysisRequest {
            repo_name: "o/r".into(),
            files: vec![
                AnalysisFile {
                    path: "a.rs".into(),
                    content: "a".into(),
                },
                AnalysisFile {
                    path: "b.rs".into(),
                    content: "b".into(),
                },
            ],
        };

        let err = service.create(&user, &request).await.unwrap_err();
        assert!(matches!(err, ServerError::Upstream(_)));

        let stored = service.list(&user).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, AnalysisStatus::Failed);
        assert!(stored[0].changes.is_empty());
    }

    #[tokio::test]
    async fn other_users_analysis_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let owner = add_user(&db, "1");
        let intruder = add_user(&db, "2");
        let llm = ScriptedGenerator::new("ok");
        let service = AnalysisService::new(&db, &llm, 1);
        let request = CreateAnalysisRequest {
            repo_name: "o/r".into(),
            files: vec![AnalysisFile {
                path: "a.rs".into(),
                content: "a".into(),
            }],
        };

        let stored = service.create(&owner, &request).await.unwrap();
        assert_eq!(stored.status, AnalysisStatus::Completed);
        assert!(service.get_owned(&owner, &stored.id).is_ok());
        assert!(matches!(
            service.get_owned(&intruder, &stored.id),
            Err(ServerError::NotFound(_))
        ));
    }
}

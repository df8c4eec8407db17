// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! API contract types for the RepoLens REST service

use crate::validation::validate_repo_name;
use rl_domain_types::{
    AnalysisSections, ChatMessage, CodeChangeProposal, ContentEntry, TreeNode,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Fetch the full file tree of a repository branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRepositoryRequest {
    #[validate(custom(function = "validate_repo_name"))]
    pub repository_name: String,
    #[validate(length(min = 1, message = "Branch cannot be empty"))]
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct AnalyzeRepositoryResponse {
    pub files: Vec<TreeNode>,
}

/// What the chat endpoint should do with the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ChatAction {
    /// Free-form conversation about a file
    #[default]
    Chat,
    /// Structured four-part review; `message` carries the file body
    Analyze,
}

/// File the conversation is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    #[serde(default)]
    pub repo_name: Option<String>,
    #[validate(length(min = 1, message = "File path cannot be empty"))]
    pub file_path: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub action: ChatAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ChatRequest {
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[validate(nested)]
    pub context: Option<ChatContext>,
    /// Earlier turns of the same conversation, oldest first
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Raw model reply
    pub message: String,
    /// Parsed sections, present for `analyze` requests
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub analysis: Option<AnalysisSections>,
    /// Proposed edit found between the code markers, if any
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub code_change: Option<CodeChangeProposal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SelectRepositoryRequest {
    #[validate(custom(function = "validate_repo_name"))]
    pub repo_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SelectRepositoryResponse {
    pub repo_name: String,
    pub files: Vec<ContentEntry>,
}

/// Overwrite one file on GitHub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UpdateFileRequest {
    #[validate(custom(function = "validate_repo_name"))]
    pub repository_name: String,
    #[validate(length(min = 1, message = "File path cannot be empty"))]
    pub file_path: String,
    pub content: String,
    #[validate(length(min = 1, message = "Commit message cannot be empty"))]
    pub message: String,
    /// Target branch; the repository default branch when absent
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct UpdateFileResponse {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct AnalysisFile {
    #[validate(length(min = 1, message = "File path cannot be empty"))]
    pub path: String,
    pub content: String,
}

/// Run a stored batch analysis over a set of files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CreateAnalysisRequest {
    #[validate(custom(function = "validate_repo_name"))]
    pub repo_name: String,
    #[validate(length(min = 1, message = "At least one file is required"), nested)]
    pub files: Vec<AnalysisFile>,
}

/// Public view of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub github_id: String,
    pub login: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<UserProfile>,
}

/// Query string GitHub appends to the OAuth callback URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

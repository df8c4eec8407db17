// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! RepoLens REST API contract types and validation
//!
//! These types are the JSON bodies exchanged between the browser frontend
//! and `rl-rest-server`. Field names are camelCase on the wire.

pub mod error;
pub mod types;
pub mod validation;

pub use error::*;
pub use types::*;
pub use validation::*;

/// Generate OpenAPI schema for the API contract types
#[cfg(feature = "utoipa")]
pub fn openapi_schema() -> utoipa::openapi::OpenApi {
    use rl_domain_types::*;
    use utoipa::OpenApi;

    #[derive(OpenApi)]
    #[openapi(
        info(title = "RepoLens REST API"),
        paths(),
        components(schemas(
            TreeNode,
            NodeKind,
            AnalysisSections,
            CodeChangeProposal,
            ChatMessage,
            ChatRole,
            AnalysisStatus,
            ChangeKind,
            StoredChange,
            StoredAnalysis,
            RepositorySummary,
            ContentEntry,
            EntryKind,
            AnalyzeRepositoryRequest,
            AnalyzeRepositoryResponse,
            ChatAction,
            ChatContext,
            ChatRequest,
            ChatResponse,
            SelectRepositoryRequest,
            SelectRepositoryResponse,
            UpdateFileRequest,
            UpdateFileResponse,
            AnalysisFile,
            CreateAnalysisRequest,
            UserProfile,
            AuthStatusResponse,
            ProblemDetails
        ))
    )]
    struct ApiDoc;
    ApiDoc::openapi()
}

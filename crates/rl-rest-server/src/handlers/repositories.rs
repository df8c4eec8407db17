// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Repository-related handlers

use crate::auth::AuthenticatedUser;
use crate::error::ServerResult;
use crate::extract::ValidatedJson;
use crate::services::RepositoryService;
use crate::state::AppState;
use axum::{extract::State, Json};
use rl_domain_types::RepositorySummary;
use rl_rest_api_contract::{
    parse_repo_ref, AnalyzeRepositoryRequest, AnalyzeRepositoryResponse, SelectRepositoryRequest,
    SelectRepositoryResponse, UpdateFileRequest, UpdateFileResponse,
};

/// Repositories the signed-in user owns or collaborates on
#[utoipa::path(
    get,
    path = "/api/repositories",
    responses(
        (status = 200, description = "Repositories visible to the user", body = [RepositorySummary]),
        (status = 401, description = "Not signed in"),
        (status = 502, description = "GitHub request failed")
    )
)]
pub async fn list_repositories(
    State(state): State<AppState>,
    identity: AuthenticatedUser,
) -> ServerResult<Json<Vec<RepositorySummary>>> {
    let api = state.github_for(identity.access_token());
    let repositories = RepositoryService::new(api.as_ref(), state.config.tree_limits())
        .list_repositories()
        .await?;
    Ok(Json(repositories))
}

/// Remember the repository on the session and return its top-level entries
#[utoipa::path(
    post,
    path = "/api/repositories/select",
    request_body = SelectRepositoryRequest,
    responses(
        (status = 200, description = "Repository selected", body = SelectRepositoryResponse),
        (status = 400, description = "Invalid repository name"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Repository not found")
    )
)]
pub async fn select_repository(
    State(state): State<AppState>,
    identity: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<SelectRepositoryRequest>,
) -> ServerResult<Json<SelectRepositoryResponse>> {
    let repo = parse_repo_ref(&request.repo_name)?;
    let api = state.github_for(identity.access_token());
    let files = RepositoryService::new(api.as_ref(), state.config.tree_limits())
        .root_listing(&repo)
        .await?;

    state
        .db
        .set_selected_repo(&identity.session.id, &request.repo_name)?;

    Ok(Json(SelectRepositoryResponse {
        repo_name: request.repo_name,
        files,
    }))
}

/// Full file tree of a branch, bodies included
#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = AnalyzeRepositoryRequest,
    responses(
        (status = 200, description = "Repository tree", body = AnalyzeRepositoryResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not signed in"),
        (status = 422, description = "Repository exceeds the tree limits"),
        (status = 502, description = "GitHub request failed")
    )
)]
pub async fn analyze_repository(
    State(state): State<AppState>,
    identity: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<AnalyzeRepositoryRequest>,
) -> ServerResult<Json<AnalyzeRepositoryResponse>> {
    let repo = parse_repo_ref(&request.repository_name)?;
    let api = state.github_for(identity.access_token());
    let files = RepositoryService::new(api.as_ref(), state.config.tree_limits())
        .tree(&repo, &request.branch)
        .await?;
    Ok(Json(AnalyzeRepositoryResponse { files }))
}

/// Commit new content for one file
#[utoipa::path(
    post,
    path = "/api/repositories/update",
    request_body = UpdateFileRequest,
    responses(
        (status = 200, description = "File committed", body = UpdateFileResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "File not found"),
        (status = 409, description = "File changed since it was read")
    )
)]
pub async fn update_file(
    State(state): State<AppState>,
    identity: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<UpdateFileRequest>,
) -> ServerResult<Json<UpdateFileResponse>> {
    let repo = parse_repo_ref(&request.repository_name)?;
    let api = state.github_for(identity.access_token());
    RepositoryService::new(api.as_ref(), state.config.tree_limits())
        .update_file(
            &repo,
            &request.file_path,
            &request.content,
            &request.message,
            request.branch.as_deref(),
        )
        .await?;
    Ok(Json(UpdateFileResponse { success: true }))
}

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Stored batch analyses

use crate::auth::AuthenticatedUser;
use crate::error::ServerResult;
use crate::extract::ValidatedJson;
use crate::services::AnalysisService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use rl_domain_types::StoredAnalysis;
use rl_rest_api_contract::CreateAnalysisRequest;

fn service(state: &AppState) -> AnalysisService<'_> {
    AnalysisService::new(
        &state.db,
        state.llm.as_ref(),
        state.config.limits.analysis_concurrency,
    )
}

/// Analyze a set of files and store the suggestions
#[utoipa::path(
    post,
    path = "/api/analyses",
    request_body = CreateAnalysisRequest,
    responses(
        (status = 200, description = "Completed analysis", body = StoredAnalysis),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not signed in"),
        (status = 502, description = "LLM request failed; the record is marked failed")
    )
)]
pub async fn create_analysis(
    State(state): State<AppState>,
    identity: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateAnalysisRequest>,
) -> ServerResult<Json<StoredAnalysis>> {
    let analysis = service(&state).create(&identity.user.id, &request).await?;
    Ok(Json(analysis))
}

#[utoipa::path(
    get,
    path = "/api/analyses",
    responses(
        (status = 200, description = "The caller's analyses, newest first", body = [StoredAnalysis]),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_analyses(
    State(state): State<AppState>,
    identity: AuthenticatedUser,
) -> ServerResult<Json<Vec<StoredAnalysis>>> {
    Ok(Json(service(&state).list(&identity.user.id)?))
}

#[utoipa::path(
    get,
    path = "/api/analyses/{id}",
    responses(
        (status = 200, description = "Analysis", body = StoredAnalysis),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Missing or owned by another user")
    ),
    params(
        ("id" = String, Path, description = "Analysis ID")
    )
)]
pub async fn get_analysis(
    State(state): State<AppState>,
    identity: AuthenticatedUser,
    Path(id): Path<String>,
) -> ServerResult<Json<StoredAnalysis>> {
    Ok(Json(service(&state).get_owned(&identity.user.id, &id)?))
}

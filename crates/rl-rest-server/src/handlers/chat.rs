// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::auth::AuthenticatedUser;
use crate::error::ServerResult;
use crate::extract::ValidatedJson;
use crate::services::ChatService;
use crate::state::AppState;
use axum::{extract::State, Json};
use rl_rest_api_contract::{ChatRequest, ChatResponse};

/// Ask the model about a file, or for a structured review of it
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Model reply", body = ChatResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not signed in"),
        (status = 502, description = "LLM request failed")
    )
)]
pub async fn chat(
    State(state): State<AppState>,
    identity: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<ChatRequest>,
) -> ServerResult<Json<ChatResponse>> {
    tracing::debug!(user = %identity.user.login, "Chat request");
    let response = ChatService::new(state.llm.as_ref())
        .respond(&request)
        .await?;
    Ok(Json(response))
}

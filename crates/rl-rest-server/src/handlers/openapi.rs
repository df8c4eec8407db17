// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! OpenAPI document endpoint

use crate::handlers::{analyses, chat, repositories};
use crate::ServerResult;
use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(paths(
    repositories::list_repositories,
    repositories::select_repository,
    repositories::analyze_repository,
    repositories::update_file,
    chat::chat,
    analyses::create_analysis,
    analyses::list_analyses,
    analyses::get_analysis,
))]
struct ApiPaths;

/// Contract schemas plus the documented routes
pub fn document() -> utoipa::openapi::OpenApi {
    let mut doc = rl_rest_api_contract::openapi_schema();
    doc.merge(ApiPaths::openapi());
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc
}

pub async fn openapi_spec() -> ServerResult<Json<utoipa::openapi::OpenApi>> {
    Ok(Json(document()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_routes_and_schemas() {
        let doc = document();
        assert!(doc.paths.paths.contains_key("/api/chat"));
        assert!(doc.paths.paths.contains_key("/api/analyses/{id}"));
        let schemas = &doc.components.as_ref().unwrap().schemas;
        assert!(schemas.contains_key("ChatRequest"));
    }
}

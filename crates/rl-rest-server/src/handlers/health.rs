// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Health check endpoints

use crate::{state::AppState, ServerResult};
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

impl HealthResponse {
    fn now(status: &str) -> Self {
        Self {
            status: status.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health_check() -> ServerResult<Json<HealthResponse>> {
    Ok(Json(HealthResponse::now("ok")))
}

/// Readiness check endpoint; fails while the database is unusable
pub async fn readiness_check(State(state): State<AppState>) -> ServerResult<Json<HealthResponse>> {
    state.db.ping()?;
    Ok(Json(HealthResponse::now("ready")))
}

/// Version endpoint
pub async fn version() -> ServerResult<Json<VersionResponse>> {
    Ok(Json(VersionResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

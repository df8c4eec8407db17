// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Main server implementation

use crate::config::ServerConfig;
use crate::dependencies::DefaultServerDependencies;
use crate::error::{ServerError, ServerResult};
use crate::handlers;
use crate::middleware::{rate_limit_middleware, RateLimitState};
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Origins allowed for credentialed cross-site requests
fn allowed_origins(config: &ServerConfig) -> Vec<HeaderValue> {
    let mut origins = vec![config.frontend_url.trim_end_matches('/').to_string()];
    if config.enable_cors {
        origins.push("http://localhost:3000".to_string());
        origins.push("http://127.0.0.1:3000".to_string());
    }
    origins.dedup();

    origins
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}

/// REST API server
pub struct Server {
    config: ServerConfig,
    app: Router,
}

impl Server {
    /// Create a server wired to SQLite, GitHub and Anthropic
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let state = DefaultServerDependencies::new(config.clone()).await?.into_state();
        Ok(Self::with_state(config, state))
    }

    /// Construct a server from an already-built app state (used for custom dependencies)
    pub fn with_state(config: ServerConfig, state: AppState) -> Self {
        let app = Self::build_app(state, &config);
        Self { config, app }
    }

    /// Build the Axum application with routes and middleware
    pub fn build_app(state: AppState, config: &ServerConfig) -> Router {
        // Build middleware stack
        let middleware_stack = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(from_fn({
                let rate_limit_state = Arc::new(RateLimitState::new(config.rate_limit.clone()));
                move |req, next| {
                    let state = Arc::clone(&rate_limit_state);
                    rate_limit_middleware(state, req, next)
                }
            }))
            .layer(
                CorsLayer::new()
                    .allow_origin(allowed_origins(config))
                    .allow_credentials(true)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
            );

        Router::new()
            // Health and status endpoints
            .route("/healthz", get(handlers::health::health_check))
            .route("/readyz", get(handlers::health::readiness_check))
            .route("/version", get(handlers::health::version))
            .route("/openapi.json", get(handlers::openapi::openapi_spec))
            // Login
            .route("/auth/status", get(handlers::auth::status))
            .route("/auth/github", get(handlers::auth::github_login))
            .route("/auth/github/callback", get(handlers::auth::github_callback))
            .route("/auth/logout", post(handlers::auth::logout))
            // Repositories
            .route("/api/repositories", get(handlers::repositories::list_repositories))
            .route(
                "/api/repositories/select",
                post(handlers::repositories::select_repository),
            )
            .route(
                "/api/repositories/update",
                post(handlers::repositories::update_file),
            )
            .route("/api/analyze", post(handlers::repositories::analyze_repository))
            // Model
            .route("/api/chat", post(handlers::chat::chat))
            .route(
                "/api/analyses",
                get(handlers::analyses::list_analyses).post(handlers::analyses::create_analysis),
            )
            .route("/api/analyses/:id", get(handlers::analyses::get_analysis))
            .with_state(state)
            .layer(middleware_stack)
    }

    /// Run the server
    pub async fn run(self) -> ServerResult<()> {
        let addr = self.config.bind_addr;
        info!("Starting server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(|err| ServerError::Internal(format!("REST server error: {err}")))?;

        Ok(())
    }

    /// Get the bind address
    pub fn addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// The router, for driving requests without a socket
    pub fn router(&self) -> Router {
        self.app.clone()
    }
}

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rl_analysis::AnalysisError;
use rl_github::GitHubError;
use rl_rest_api_contract::{field_errors, ApiContractError, ProblemDetails};

/// Server result type
pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] rl_local_db::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::Validation(_) | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::LimitExceeded(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServerError::Database(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Convert error to Problem+JSON response.
    ///
    /// Upstream and internal failures get a fixed message; their cause is
    /// only logged.
    pub fn to_problem(&self) -> ProblemDetails {
        let status = self.status().as_u16();
        match self {
            ServerError::Unauthorized => ProblemDetails::new(
                "unauthorized",
                "Unauthorized",
                status,
                "Sign in with GitHub to continue",
            ),
            ServerError::Validation(errors) => ProblemDetails::new(
                "validation",
                "Validation Error",
                status,
                "Request validation failed",
            )
            .with_errors(field_errors(errors)),
            ServerError::BadRequest(msg) => {
                ProblemDetails::new("bad-request", "Bad Request", status, msg.clone())
            }
            ServerError::NotFound(msg) => {
                ProblemDetails::new("not-found", "Not Found", status, msg.clone())
            }
            ServerError::Conflict(msg) => {
                ProblemDetails::new("conflict", "Conflict", status, msg.clone())
            }
            ServerError::LimitExceeded(msg) => {
                ProblemDetails::new("limit-exceeded", "Limit Exceeded", status, msg.clone())
            }
            ServerError::RateLimited => {
                ProblemDetails::new("rate-limited", "Rate Limited", status, "Too many requests")
            }
            ServerError::Upstream(_) => ProblemDetails::new(
                "upstream",
                "Bad Gateway",
                status,
                "A request to GitHub or the analysis provider failed",
            ),
            ServerError::Database(_) | ServerError::Internal(_) => ProblemDetails::new(
                "internal",
                "Internal Server Error",
                status,
                "The server could not complete the request",
            ),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (status, Json(self.to_problem())).into_response()
    }
}

impl From<GitHubError> for ServerError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::NotFound(msg) => ServerError::NotFound(msg),
            GitHubError::Conflict { path, .. } => ServerError::Conflict(format!(
                "{path} changed since it was read; reload it and try again"
            )),
            GitHubError::LimitExceeded(msg) => ServerError::LimitExceeded(msg),
            // A revoked or expired token means the user has to sign in again
            GitHubError::Unauthorized(_) => ServerError::Unauthorized,
            other => ServerError::Upstream(other.to_string()),
        }
    }
}

impl From<AnalysisError> for ServerError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Config { message } => ServerError::Internal(message),
            other => ServerError::Upstream(other.to_string()),
        }
    }
}

impl From<ApiContractError> for ServerError {
    fn from(err: ApiContractError) -> Self {
        match err {
            ApiContractError::Validation(errors) => ServerError::Validation(errors),
            other => ServerError::BadRequest(other.to_string()),
        }
    }
}

/// Convert any error to ServerError
impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

/// Convert IO errors
impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_errors_map_to_client_visible_statuses() {
        let conflict: ServerError = GitHubError::Conflict {
            path: "a.rs".into(),
            message: "does not match".into(),
        }
        .into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let limit: ServerError = GitHubError::LimitExceeded("too many".into()).into();
        assert_eq!(limit.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let missing: ServerError = GitHubError::NotFound("x".into()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let api: ServerError = GitHubError::Api {
            status: 500,
            message: "secret detail".into(),
        }
        .into();
        assert_eq!(api.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn upstream_detail_is_not_exposed() {
        let err = ServerError::Upstream("token gho_secret rejected".into());
        let problem = err.to_problem();
        assert_eq!(problem.status, Some(502));
        assert!(!problem.detail.contains("gho_secret"));
    }

    #[test]
    fn validation_problem_lists_fields() {
        use validator::Validate;

        let request = rl_rest_api_contract::AnalyzeRepositoryRequest {
            repository_name: "nope".into(),
            branch: "main".into(),
        };
        let err = ServerError::from(request.validate().unwrap_err());
        let problem = err.to_problem();
        assert_eq!(problem.status, Some(400));
        assert!(problem.errors.contains_key("repository_name"));
    }
}

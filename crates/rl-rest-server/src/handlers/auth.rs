// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! GitHub login, session status and logout

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Duration;
use rl_local_db::{NewUser, SessionRecord};
use rl_rest_api_contract::{AuthStatusResponse, OAuthCallbackQuery};
use tracing::{info, warn};

use crate::auth::{
    clear_oauth_state_cookie, clear_session_cookie, oauth_state_cookie, session_cookie,
    AuthenticatedUser, OAUTH_STATE_COOKIE,
};
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// 200 with the profile when signed in, 401 otherwise
pub async fn status(identity: Option<AuthenticatedUser>) -> Response {
    match identity {
        Some(identity) => Json(AuthStatusResponse {
            authenticated: true,
            user: Some(identity.profile()),
        })
        .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(AuthStatusResponse {
                authenticated: false,
                user: None,
            }),
        )
            .into_response(),
    }
}

/// Start the OAuth flow: remember a random state and send the browser to GitHub
pub async fn github_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ServerResult<(CookieJar, Redirect)> {
    let oauth_state = uuid::Uuid::new_v4().simple().to_string();
    let url = state.identity.authorize_url(&oauth_state)?;
    let jar = jar.add(oauth_state_cookie(
        oauth_state,
        state.config.session.cookie_secure,
    ));
    Ok((jar, Redirect::to(url.as_str())))
}

/// GitHub redirects here. Success lands on the frontend with a session
/// cookie; any failure lands on the frontend login page.
pub async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let jar = clear_oauth_state_cookie(jar);
    let frontend = state.config.frontend_url.trim_end_matches('/').to_string();

    match complete_login(&state, &query, expected_state.as_deref()).await {
        Ok(session) => {
            let jar = jar.add(session_cookie(
                session.id,
                state.config.session.cookie_secure,
            ));
            (jar, Redirect::to(&frontend))
        }
        Err(err) => {
            warn!(error = %err, "GitHub login failed");
            (jar, Redirect::to(&format!("{frontend}/login")))
        }
    }
}

async fn complete_login(
    state: &AppState,
    query: &OAuthCallbackQuery,
    expected_state: Option<&str>,
) -> ServerResult<SessionRecord> {
    if let Some(error) = &query.error {
        return Err(ServerError::BadRequest(format!("GitHub returned {error}")));
    }
    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ServerError::BadRequest("missing code".into()))?;
    match (expected_state, query.state.as_deref()) {
        (Some(expected), Some(got)) if expected == got => {}
        _ => return Err(ServerError::BadRequest("OAuth state mismatch".into())),
    }

    let identity = state.identity.exchange_code(code).await?;
    let user = state.db.upsert_github_user(&NewUser {
        github_id: identity.user.id.to_string(),
        login: identity.user.login,
        name: identity.user.name,
        email: identity.user.email,
        access_token: identity.access_token,
    })?;
    let session = state
        .db
        .create_session(&user.id, Duration::hours(state.config.session.ttl_hours))?;

    info!(user = %user.login, "User signed in");
    Ok(session)
}

pub async fn logout(
    State(state): State<AppState>,
    identity: AuthenticatedUser,
    jar: CookieJar,
) -> ServerResult<(CookieJar, StatusCode)> {
    state.db.delete_session(&identity.session.id)?;
    Ok((clear_session_cookie(jar), StatusCode::NO_CONTENT))
}

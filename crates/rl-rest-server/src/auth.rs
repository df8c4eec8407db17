// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Authentication and authorization
//!
//! A browser session is a random token stored server-side and handed to the
//! client in the `rl_session` cookie. API clients may send the same token as
//! `Authorization: Bearer <token>`. Handlers that need a signed-in user take
//! [`AuthenticatedUser`] as an argument; extraction fails with
//! [`ServerError::Unauthorized`] before the handler body runs.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rl_local_db::{Database, SessionRecord, UserRecord};
use rl_rest_api_contract::UserProfile;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "rl_session";

/// Cookie carrying the OAuth `state` between login and callback
pub const OAUTH_STATE_COOKIE: &str = "rl_oauth_state";

/// Signed-in user and the session that proved it
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: UserRecord,
    pub session: SessionRecord,
}

impl AuthenticatedUser {
    /// Public profile; never includes the access token
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.user.id.clone(),
            github_id: self.user.github_id.clone(),
            login: self.user.login.clone(),
            name: self.user.name.clone(),
            email: self.user.email.clone(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.user.access_token
    }
}

/// Reject the request unless an identity was resolved
pub fn require_authenticated(
    identity: Option<AuthenticatedUser>,
) -> ServerResult<AuthenticatedUser> {
    identity.ok_or(ServerError::Unauthorized)
}

/// Session token from the cookie, falling back to a bearer header
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Look up a live session and its user. Expired sessions and sessions whose
/// user has disappeared resolve to `None`.
pub fn resolve_session(db: &Database, token: &str) -> ServerResult<Option<AuthenticatedUser>> {
    let Some(session) = db.get_session(token)? else {
        return Ok(None);
    };
    let Some(user) = db.get_user(&session.user_id)? else {
        tracing::warn!(session_user = %session.user_id, "Session refers to a missing user");
        return Ok(None);
    };
    Ok(Some(AuthenticatedUser { user, session }))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = match session_token(&parts.headers) {
            Some(token) => resolve_session(&state.db, &token)?,
            None => None,
        };
        require_authenticated(identity)
    }
}

/// `rl_session` cookie for a freshly created session
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Short-lived cookie holding the OAuth anti-CSRF state.
/// `Lax` so it survives the top-level redirect back from GitHub.
pub fn oauth_state_cookie(state: String, secure: bool) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, state))
        .path("/auth")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

pub fn clear_oauth_state_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(OAUTH_STATE_COOKIE).path("/auth"))
}

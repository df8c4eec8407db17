// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::*;
use rl_github::mock::REJECTED_OAUTH_CODE;

#[tokio::test]
async fn status_without_session_is_401() {
    let app = spawn_app().await;
    let body = expect_json(
        app.get("/auth/status", None).await,
        StatusCode::UNAUTHORIZED,
    )
    .await;
    assert_eq!(body["authenticated"], false);
    assert!(body.get("user").is_none());
}

#[tokio::test]
async fn status_with_session_returns_profile() {
    let app = spawn_app().await;
    let token = app.sign_in();

    let body = expect_json(app.get("/auth/status", Some(&token)).await, StatusCode::OK).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["login"], "octocat");
    assert_eq!(body["user"]["githubId"], "1");
    assert!(body["user"].get("accessToken").is_none());
}

#[tokio::test]
async fn bearer_token_is_accepted() {
    let app = spawn_app().await;
    let token = app.sign_in();

    let request = Request::get("/auth/status")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_session_is_401() {
    let app = spawn_app().await;
    let response = app.get("/auth/status", Some("not-a-session")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

async fn start_login(app: &TestApp) -> String {
    let response = app.get("/auth/github", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let state = set_cookie(&response, "rl_oauth_state").expect("state cookie");
    assert_eq!(
        location(&response),
        format!("https://github.test/login/oauth/authorize?state={state}")
    );
    state
}

fn callback(query: &str, state_cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(format!("/auth/github/callback?{query}"));
    if let Some(state) = state_cookie {
        builder = builder.header(header::COOKIE, format!("rl_oauth_state={state}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn oauth_round_trip_creates_session() {
    let app = spawn_app().await;
    let state = start_login(&app).await;

    let response = app
        .send(callback(&format!("code=good&state={state}"), Some(&state)))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "http://localhost:3000");
    let session = set_cookie(&response, "rl_session").expect("session cookie");

    let body = expect_json(app.get("/auth/status", Some(&session)).await, StatusCode::OK).await;
    assert_eq!(body["user"]["login"], "octocat");

    // Signing in again keeps the same internal user
    let state = start_login(&app).await;
    let again = app
        .send(callback(&format!("code=good&state={state}"), Some(&state)))
        .await;
    let second = set_cookie(&again, "rl_session").expect("session cookie");
    let again_body =
        expect_json(app.get("/auth/status", Some(&second)).await, StatusCode::OK).await;
    assert_eq!(again_body["user"]["id"], body["user"]["id"]);
}

#[tokio::test]
async fn callback_with_wrong_state_goes_to_login() {
    let app = spawn_app().await;
    let state = start_login(&app).await;

    let response = app
        .send(callback("code=good&state=forged", Some(&state)))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "http://localhost:3000/login");
    assert!(set_cookie(&response, "rl_session").is_none());

    let missing_cookie = app
        .send(callback(&format!("code=good&state={state}"), None))
        .await;
    assert_eq!(location(&missing_cookie), "http://localhost:3000/login");
}

#[tokio::test]
async fn rejected_code_goes_to_login() {
    let app = spawn_app().await;
    let state = start_login(&app).await;

    let response = app
        .send(callback(
            &format!("code={REJECTED_OAUTH_CODE}&state={state}"),
            Some(&state),
        ))
        .await;
    assert_eq!(location(&response), "http://localhost:3000/login");
    assert!(set_cookie(&response, "rl_session").is_none());
}

#[tokio::test]
async fn provider_error_goes_to_login() {
    let app = spawn_app().await;
    let state = start_login(&app).await;

    let response = app
        .send(callback(
            &format!("error=access_denied&state={state}"),
            Some(&state),
        ))
        .await;
    assert_eq!(location(&response), "http://localhost:3000/login");
}

#[tokio::test]
async fn logout_ends_session() {
    let app = spawn_app().await;
    let token = app.sign_in();

    let response = app
        .send(
            Request::post("/auth/logout")
                .header(header::COOKIE, format!("rl_session={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(set_cookie(&response, "rl_session").as_deref(), Some(""));

    let after = app.get("/auth/status", Some(&token)).await;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_requires_session() {
    let app = spawn_app().await;
    let response = app
        .send(Request::post("/auth/logout").body(Body::empty()).unwrap())
        .await;
    let body = expect_json(response, StatusCode::UNAUTHORIZED).await;
    assert_eq!(body["status"], 401);
}

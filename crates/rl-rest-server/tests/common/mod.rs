// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use rl_analysis::mock::ScriptedGenerator;
use rl_github::mock::MockContentApi;
use rl_rest_server::{mock_dependencies::MockServerDependencies, Server, ServerConfig};
use serde_json::Value;
use tower::ServiceExt;

/// Router plus the fakes behind it
pub struct TestApp {
    pub deps: MockServerDependencies,
    router: Router,
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.session.cookie_secure = false;
    config.rate_limit.enabled = false;
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(
        MockContentApi::new(),
        ScriptedGenerator::new("Looks fine to me."),
    )
    .await
}

pub async fn spawn_app_with(github: MockContentApi, llm: ScriptedGenerator) -> TestApp {
    spawn_app_with_config(test_config(), github, llm).await
}

pub async fn spawn_app_with_config(
    config: ServerConfig,
    github: MockContentApi,
    llm: ScriptedGenerator,
) -> TestApp {
    let deps = MockServerDependencies::with_fakes(config.clone(), github, llm)
        .await
        .expect("mock deps");
    let router = Server::with_state(config, deps.state()).router();
    TestApp { deps, router }
}

impl TestApp {
    pub fn sign_in(&self) -> String {
        self.deps.sign_in().expect("sign in")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.send(get(uri, token)).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
        self.send(post_json(uri, token, body)).await
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    with_session(Request::get(uri), token)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    with_session(Request::post(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Browser-style session cookie
fn with_session(
    builder: axum::http::request::Builder,
    token: Option<&str>,
) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::COOKIE, format!("rl_session={token}")),
        None => builder,
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn expect_json(response: Response<Body>, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}

/// Value of cookie `name` among the response's `Set-Cookie` headers
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| {
            let pair = value.split(';').next()?;
            let (cookie_name, cookie_value) = pair.split_once('=')?;
            (cookie_name.trim() == name).then(|| cookie_value.to_string())
        })
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

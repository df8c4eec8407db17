// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

mod common;

use axum::http::StatusCode;
use common::*;
use rl_analysis::mock::ScriptedGenerator;
use rl_github::mock::MockContentApi;
use serde_json::json;

const REVIEW: &str = "OVERVIEW: Adds two numbers.
ANALYSIS: Overflow is unchecked.
CHANGES: Use checked_add.
RISKS: Callers must handle None.";

#[tokio::test]
async fn chat_requires_session() {
    let app = spawn_app().await;
    let response = app
        .post_json("/api/chat", None, json!({"message": "hi"}))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.deps.llm.calls(), 0);
}

#[tokio::test]
async fn analyze_action_returns_sections() {
    let app = spawn_app_with(MockContentApi::new(), ScriptedGenerator::new(REVIEW)).await;
    let token = app.sign_in();

    let body = expect_json(
        app.post_json(
            "/api/chat",
            Some(&token),
            json!({
                "message": "fn add(a: i32, b: i32) -> i32 { a + b }",
                "context": {
                    "repoName": "octocat/hello",
                    "filePath": "src/math.rs",
                    "action": "analyze"
                }
            }),
        )
        .await,
        StatusCode::OK,
    )
    .await;

    assert_eq!(body["analysis"]["overview"], "Adds two numbers.");
    assert_eq!(body["analysis"]["changes"], "Use checked_add.");
    assert_eq!(body["message"], REVIEW);
    assert!(body.get("codeChange").is_none());

    let prompt = &app.deps.llm.prompts()[0];
    assert!(prompt.contains("You are looking at the file: src/math.rs"));
    assert!(prompt.contains("fn add(a: i32, b: i32)"));
}

#[tokio::test]
async fn chat_reply_with_code_block_proposes_change() {
    let reply = "Here is a shorter version.\nCODE_START\nfn main() {}\nCODE_END\nDone.";
    let app = spawn_app_with(MockContentApi::new(), ScriptedGenerator::new(reply)).await;
    let token = app.sign_in();

    let body = expect_json(
        app.post_json(
            "/api/chat",
            Some(&token),
            json!({
                "message": "make it shorter",
                "context": {
                    "filePath": "src/main.rs",
                    "content": "fn main() { let _unused = 1; }",
                    "action": "chat"
                },
                "history": [
                    {"role": "user", "content": "what does this do?"},
                    {"role": "assistant", "content": "Nothing much."}
                ]
            }),
        )
        .await,
        StatusCode::OK,
    )
    .await;

    assert_eq!(body["codeChange"]["content"], "fn main() {}");
    assert_eq!(body["codeChange"]["description"], "Here is a shorter version.");
    assert!(body.get("analysis").is_none());

    let prompt = &app.deps.llm.prompts()[0];
    assert!(prompt.contains("fn main() { let _unused = 1; }"));
    assert!(prompt.contains("Assistant: Nothing much."));
    assert!(prompt.contains("User question/request: make it shorter"));
}

#[tokio::test]
async fn plain_chat_without_context() {
    let app = spawn_app().await;
    let token = app.sign_in();

    let body = expect_json(
        app.post_json("/api/chat", Some(&token), json!({"message": "hello"}))
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["message"], "Looks fine to me.");
    assert!(body.get("codeChange").is_none());
}

#[tokio::test]
async fn empty_message_is_400() {
    let app = spawn_app().await;
    let token = app.sign_in();

    let body = expect_json(
        app.post_json("/api/chat", Some(&token), json!({"message": ""}))
            .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert!(body["errors"]["message"].is_array());
    assert_eq!(app.deps.llm.calls(), 0);
}

#[tokio::test]
async fn llm_failure_is_502_without_detail() {
    let app = spawn_app_with(
        MockContentApi::new(),
        ScriptedGenerator::new("unused").fail_when("boom"),
    )
    .await;
    let token = app.sign_in();

    let body = expect_json(
        app.post_json("/api/chat", Some(&token), json!({"message": "boom"}))
            .await,
        StatusCode::BAD_GATEWAY,
    )
    .await;
    assert!(!body["detail"].as_str().unwrap().contains("scripted"));
}

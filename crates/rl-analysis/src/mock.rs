// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Scripted [`TextGenerator`] for tests

use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::TextGenerator;
use crate::error::{AnalysisError, AnalysisResult};

#[derive(Debug, Clone)]
enum Outcome {
    Reply(String),
    Fail(String),
}

/// Answers by the first rule whose needle occurs in the prompt, falling
/// back to a default reply. Every prompt is recorded.
#[derive(Debug)]
pub struct ScriptedGenerator {
    default_reply: String,
    rules: Vec<(String, Outcome)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(default_reply: impl Into<String>) -> Self {
        Self {
            default_reply: default_reply.into(),
            rules: Vec::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn reply_when(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Outcome::Reply(reply.into())));
        self
    }

    pub fn fail_when(mut self, needle: impl Into<String>) -> Self {
        let needle = needle.into();
        let message = format!("scripted failure for '{needle}'");
        self.rules.push((needle, Outcome::Fail(message)));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn calls(&self) -> usize {
        self.prompts().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn request_analysis(&self, prompt: &str) -> AnalysisResult<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prompt.to_string());

        let outcome = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| Outcome::Reply(self.default_reply.clone()));

        match outcome {
            Outcome::Reply(text) => Ok(text),
            Outcome::Fail(message) => Err(AnalysisError::Provider {
                provider: "scripted".into(),
                status: 500,
                message,
            }),
        }
    }
}

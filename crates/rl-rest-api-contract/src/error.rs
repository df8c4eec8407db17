// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for API contract validation and parsing

use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during API contract validation and parsing
#[derive(Debug, Error)]
pub enum ApiContractError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid repository name: {0}")]
    InvalidRepoName(#[from] rl_domain_types::InvalidRepoName),
}

/// Problem+JSON error response format as per RFC 7807
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub detail: String,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub errors: HashMap<String, Vec<String>>,
}

impl ProblemDetails {
    pub fn new(kind: &str, title: &str, status: u16, detail: impl Into<String>) -> Self {
        Self {
            problem_type: format!("https://repolens.dev/errors/{kind}"),
            title: title.to_string(),
            status: Some(status),
            detail: detail.into(),
            errors: HashMap::new(),
        }
    }

    pub fn with_errors(mut self, errors: HashMap<String, Vec<String>>) -> Self {
        self.errors = errors;
        self
    }
}

/// Flatten validator errors into `field -> messages`, using dotted paths for
/// nested structs and `field[i]` for list items.
pub fn field_errors(errors: &validator::ValidationErrors) -> HashMap<String, Vec<String>> {
    let mut out = HashMap::new();
    collect_field_errors(errors, "", &mut out);
    out
}

fn collect_field_errors(
    errors: &validator::ValidationErrors,
    prefix: &str,
    out: &mut HashMap<String, Vec<String>>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = list
                    .iter()
                    .map(|e| e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string()))
                    .collect::<Vec<_>>();
                out.entry(path).or_insert_with(Vec::new).extend(messages);
            }
            ValidationErrorsKind::Struct(nested) => collect_field_errors(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_field_errors(nested, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

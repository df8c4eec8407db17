// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("HTTP client error: {source}")]
    HttpClient {
        #[from]
        source: reqwest::Error,
    },

    #[error("Provider error from {provider} ({status}): {message}")]
    Provider {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Malformed provider response: {message}")]
    MalformedResponse { message: String },

    #[error("Provider returned no text")]
    EmptyResponse,

    #[error("Configuration error: {message}")]
    Config { message: String },
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

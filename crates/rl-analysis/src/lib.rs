// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Code analysis for RepoLens
//!
//! Prompts are built by [`prompts`], sent through a [`TextGenerator`] and the
//! free-form reply is turned into typed data by [`parser`]. [`batch`] runs
//! many file analyses with bounded concurrency for stored analyses.

pub mod batch;
pub mod client;
pub mod error;
pub mod mock;
pub mod parser;
pub mod prompts;

pub use batch::{analyze_files, SourceFile};
pub use client::{AnthropicClient, LlmConfig, TextGenerator};
pub use error::{AnalysisError, AnalysisResult};
pub use parser::{extract_code_change, parse_analysis};

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! RepoLens REST API server
//!
//! Signs users in with GitHub, fetches repository trees and file contents on
//! their behalf, asks an LLM to review code, and writes accepted changes
//! back to GitHub. Handlers get their collaborators from [`state::AppState`],
//! which is wired either by [`dependencies::DefaultServerDependencies`] or
//! by [`mock_dependencies::MockServerDependencies`] for tests.

pub mod auth;
pub mod config;
pub mod dependencies;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod mock_dependencies;
pub mod server;
pub mod services;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::Server;

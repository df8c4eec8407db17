// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Domain types for RepoLens
//!
//! These types describe repositories, file trees, analyses and chat
//! conversations. They are shared by the GitHub adapter, the analysis
//! pipeline, the local database and the REST server, and carry no I/O.

pub mod analysis;
pub mod chat;
pub mod repository;
pub mod tree;

pub use analysis::*;
pub use chat::*;
pub use repository::*;
pub use tree::*;

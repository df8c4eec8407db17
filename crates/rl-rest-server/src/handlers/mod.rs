// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Request handlers

pub mod analyses;
pub mod auth;
pub mod chat;
pub mod health;
pub mod openapi;
pub mod repositories;

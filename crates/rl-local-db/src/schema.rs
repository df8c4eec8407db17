// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Schema and migrations

use rusqlite::{Connection, OptionalExtension};

const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    );
";

/// v1: users, login sessions and stored analyses.
/// `analyses.changes` holds a JSON array of `StoredChange`.
const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id           TEXT PRIMARY KEY,
        github_id    TEXT NOT NULL UNIQUE,
        login        TEXT NOT NULL,
        name         TEXT,
        email        TEXT,
        access_token TEXT NOT NULL,
        created_at   TEXT NOT NULL,
        updated_at   TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sessions (
        id            TEXT PRIMARY KEY,
        user_id       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        selected_repo TEXT,
        created_at    TEXT NOT NULL,
        expires_at    TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS analyses (
        id         TEXT PRIMARY KEY,
        user_id    TEXT NOT NULL REFERENCES users(id),
        repo_name  TEXT NOT NULL,
        changes    TEXT NOT NULL DEFAULT '[]',
        status     TEXT NOT NULL
                   CHECK(status IN ('PENDING', 'PROCESSING', 'COMPLETED', 'FAILED')),
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_analyses_user ON analyses(user_id, created_at);
";

const CURRENT_VERSION: i64 = 1;

pub(crate) fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: Option<i64> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .optional()?;

    match version {
        None => {
            conn.execute_batch(SCHEMA_V1_SQL)?;
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [CURRENT_VERSION],
            )?;
            tracing::debug!(version = CURRENT_VERSION, "Initialized database schema");
        }
        Some(v) if v < CURRENT_VERSION => {
            conn.execute_batch(SCHEMA_V1_SQL)?;
            conn.execute("UPDATE schema_version SET version = ?1", [CURRENT_VERSION])?;
        }
        Some(_) => {}
    }

    Ok(())
}

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! SQLite persistence for RepoLens
//!
//! A single [`Database`] owns one connection behind a mutex. Queries are
//! short and run inline on the calling task. Store operations live in the
//! `users`, `sessions` and `analyses` modules as inherent methods.

mod analyses;
mod schema;
mod sessions;
mod users;

pub use sessions::SessionRecord;
pub use users::{NewUser, UserRecord};

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rl_domain_types::AnalysisStatus;

/// Database error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt value in column {column}: {value}")]
    Corrupt { column: &'static str, value: String },

    #[error("Analysis not found: {0}")]
    AnalysisNotFound(String),

    #[error("Analysis {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: AnalysisStatus,
        to: AnalysisStatus,
    },

    #[error("Database connection lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Handle to the RepoLens SQLite database
pub struct Database {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (or create) the database file at `path` and apply migrations
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database (tests and `:memory:` config)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Cheap connectivity probe for readiness checks
    pub fn ping(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))?;
            Ok(())
        })
    }

    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock().map_err(|_| Error::Poisoned)?;
        f(&guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repolens.db");

        let user_id = {
            let db = Database::open(&path).unwrap();
            db.upsert_github_user(&NewUser {
                github_id: "42".into(),
                login: "octocat".into(),
                name: None,
                email: None,
                access_token: "gho_token".into(),
            })
            .unwrap()
            .id
        };

        let db = Database::open(&path).unwrap();
        let user = db.get_user(&user_id).unwrap().expect("user persisted");
        assert_eq!(user.login, "octocat");
        db.ping().unwrap();
    }
}

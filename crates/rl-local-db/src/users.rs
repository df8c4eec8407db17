// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::{Database, Result};

/// Identity returned by the GitHub OAuth exchange
#[derive(Debug, Clone)]
pub struct NewUser {
    pub github_id: String,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub github_id: String,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    /// GitHub OAuth token; never leaves the server
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            github_id: row.get(1)?,
            login: row.get(2)?,
            name: row.get(3)?,
            email: row.get(4)?,
            access_token: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

const USER_COLUMNS: &str =
    "id, github_id, login, name, email, access_token, created_at, updated_at";

impl Database {
    /// Insert a user keyed by GitHub id, or refresh the token and profile of
    /// an existing one. The internal id is stable across logins.
    pub fn upsert_github_user(&self, user: &NewUser) -> Result<UserRecord> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO users (id, github_id, login, name, email, access_token, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                 ON CONFLICT(github_id)
                 DO UPDATE SET login = excluded.login,
                               name = excluded.name,
                               email = excluded.email,
                               access_token = excluded.access_token,
                               updated_at = excluded.updated_at",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    &user.github_id,
                    &user.login,
                    &user.name,
                    &user.email,
                    &user.access_token,
                    now,
                ],
            )?;

            let record = conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE github_id = ?1"),
                params![&user.github_id],
                UserRecord::from_row,
            )?;
            tracing::debug!(user_id = %record.id, login = %record.login, "Upserted GitHub user");
            Ok(record)
        })
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserRecord>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                    params![id],
                    UserRecord::from_row,
                )
                .optional()?)
        })
    }
}

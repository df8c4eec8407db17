// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::{Database, Result};

/// Server-side login session; the id is the cookie value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub selected_repo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            selected_repo: row.get(2)?,
            created_at: row.get(3)?,
            expires_at: row.get(4)?,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// 256 bits of randomness from two v4 uuids, hex encoded.
fn new_session_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

impl Database {
    pub fn create_session(&self, user_id: &str, ttl: Duration) -> Result<SessionRecord> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let record = SessionRecord {
                id: new_session_token(),
                user_id: user_id.to_owned(),
                selected_repo: None,
                created_at: now,
                expires_at: now + ttl,
            };
            conn.execute(
                "INSERT INTO sessions (id, user_id, selected_repo, created_at, expires_at)
                 VALUES (?1, ?2, NULL, ?3, ?4)",
                params![&record.id, &record.user_id, record.created_at, record.expires_at],
            )?;
            Ok(record)
        })
    }

    /// Look up a live session. Expired rows read as absent.
    pub fn get_session(&self, id: &str) -> Result<Option<SessionRecord>> {
        let record = self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, user_id, selected_repo, created_at, expires_at
                     FROM sessions WHERE id = ?1",
                    params![id],
                    SessionRecord::from_row,
                )
                .optional()?)
        })?;

        Ok(record.filter(|session| !session.is_expired(Utc::now())))
    }

    /// Returns false when the session does not exist.
    pub fn set_selected_repo(&self, session_id: &str, repo_name: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE sessions SET selected_repo = ?1 WHERE id = ?2",
                params![repo_name, session_id],
            )?;
            Ok(updated > 0)
        })
    }

    pub fn delete_session(&self, session_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
            Ok(())
        })
    }

    /// Drop every expired session, returning how many were removed
    pub fn purge_expired_sessions(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                params![Utc::now()],
            )?;
            if removed > 0 {
                tracing::debug!(removed, "Purged expired sessions");
            }
            Ok(removed)
        })
    }
}

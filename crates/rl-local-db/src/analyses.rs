// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::str::FromStr;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use rl_domain_types::{AnalysisStatus, StoredAnalysis, StoredChange};

use crate::{Database, Error, Result};

const ANALYSIS_COLUMNS: &str = "id, user_id, repo_name, changes, status, created_at";

/// Raw row before the JSON and enum columns are decoded
struct AnalysisRow {
    id: String,
    user_id: String,
    repo_name: String,
    changes: String,
    status: String,
    created_at: chrono::DateTime<Utc>,
}

impl AnalysisRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            repo_name: row.get(2)?,
            changes: row.get(3)?,
            status: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn decode(self) -> Result<StoredAnalysis> {
        let status = AnalysisStatus::from_str(&self.status).map_err(|_| Error::Corrupt {
            column: "analyses.status",
            value: self.status.clone(),
        })?;
        Ok(StoredAnalysis {
            id: self.id,
            user_id: self.user_id,
            repo_name: self.repo_name,
            changes: serde_json::from_str(&self.changes)?,
            status,
            created_at: self.created_at,
        })
    }
}

fn load(conn: &Connection, id: &str) -> Result<Option<StoredAnalysis>> {
    conn.query_row(
        &format!("SELECT {ANALYSIS_COLUMNS} FROM analyses WHERE id = ?1"),
        params![id],
        AnalysisRow::from_row,
    )
    .optional()?
    .map(AnalysisRow::decode)
    .transpose()
}

impl Database {
    /// Record a new batch analysis in `PROCESSING` with no changes yet
    pub fn create_analysis(&self, user_id: &str, repo_name: &str) -> Result<StoredAnalysis> {
        self.with_conn(|conn| {
            let analysis = StoredAnalysis {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.to_owned(),
                repo_name: repo_name.to_owned(),
                changes: Vec::new(),
                status: AnalysisStatus::Processing,
                created_at: Utc::now(),
            };
            conn.execute(
                "INSERT INTO analyses (id, user_id, repo_name, changes, status, created_at)
                 VALUES (?1, ?2, ?3, '[]', ?4, ?5)",
                params![
                    &analysis.id,
                    &analysis.user_id,
                    &analysis.repo_name,
                    analysis.status.to_string(),
                    analysis.created_at,
                ],
            )?;
            Ok(analysis)
        })
    }

    pub fn complete_analysis(&self, id: &str, changes: &[StoredChange]) -> Result<StoredAnalysis> {
        let changes = serde_json::to_string(changes)?;
        self.finish_analysis(id, AnalysisStatus::Completed, &changes)
    }

    pub fn fail_analysis(&self, id: &str) -> Result<StoredAnalysis> {
        self.finish_analysis(id, AnalysisStatus::Failed, "[]")
    }

    /// Only `PROCESSING` rows may move to a terminal state.
    fn finish_analysis(
        &self,
        id: &str,
        to: AnalysisStatus,
        changes_json: &str,
    ) -> Result<StoredAnalysis> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE analyses SET status = ?1, changes = ?2
                 WHERE id = ?3 AND status = ?4",
                params![
                    to.to_string(),
                    changes_json,
                    id,
                    AnalysisStatus::Processing.to_string()
                ],
            )?;

            let current = load(conn, id)?.ok_or_else(|| Error::AnalysisNotFound(id.to_owned()))?;
            if updated == 0 {
                return Err(Error::InvalidTransition {
                    id: id.to_owned(),
                    from: current.status,
                    to,
                });
            }
            tracing::debug!(analysis_id = %id, status = %to, "Analysis finished");
            Ok(current)
        })
    }

    pub fn get_analysis(&self, id: &str) -> Result<Option<StoredAnalysis>> {
        self.with_conn(|conn| load(conn, id))
    }

    /// All analyses owned by `user_id`, newest first
    pub fn list_analyses_for_user(&self, user_id: &str) -> Result<Vec<StoredAnalysis>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ANALYSIS_COLUMNS} FROM analyses
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt
                .query_map(params![user_id], AnalysisRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(AnalysisRow::decode).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewUser;
    use rl_domain_types::ChangeKind;

    fn db_with_user(github_id: &str) -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let id = add_user(&db, github_id);
        (db, id)
    }

    fn add_user(db: &Database, github_id: &str) -> String {
        db.upsert_github_user(&NewUser {
            github_id: github_id.into(),
            login: format!("user{github_id}"),
            name: None,
            email: None,
            access_token: "gho_x".into(),
        })
        .unwrap()
        .id
    }

    #[test]
    fn complete_stores_changes() {
        let (db, user_id) = db_with_user("7");
        let created = db.create_analysis(&user_id, "octo/hello").unwrap();
        assert_eq!(created.status, AnalysisStatus::Processing);
        assert!(created.changes.is_empty());

        let changes = vec![StoredChange {
            file_path: "src/main.rs".into(),
            suggestion: "Extract the parser".into(),
            kind: ChangeKind::Improvement,
        }];
        let done = db.complete_analysis(&created.id, &changes).unwrap();
        assert_eq!(done.status, AnalysisStatus::Completed);
        assert_eq!(done.changes, changes);

        let loaded = db.get_analysis(&created.id).unwrap().unwrap();
        assert_eq!(loaded, done);
    }

    #[test]
    fn terminal_analyses_cannot_transition_again() {
        let (db, user_id) = db_with_user("7");
        let created = db.create_analysis(&user_id, "octo/hello").unwrap();
        db.fail_analysis(&created.id).unwrap();

        let err = db.complete_analysis(&created.id, &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: AnalysisStatus::Failed,
                to: AnalysisStatus::Completed,
                ..
            }
        ));
        assert_eq!(
            db.get_analysis(&created.id).unwrap().unwrap().status,
            AnalysisStatus::Failed
        );
    }

    #[test]
    fn finishing_unknown_analysis_is_not_found() {
        let (db, _) = db_with_user("7");
        assert!(matches!(
            db.fail_analysis("nope"),
            Err(Error::AnalysisNotFound(_))
        ));
    }

    #[test]
    fn list_is_scoped_to_owner_and_newest_first() {
        let (db, alice) = db_with_user("1");
        let bob = add_user(&db, "2");

        let first = db.create_analysis(&alice, "a/one").unwrap();
        let second = db.create_analysis(&alice, "a/two").unwrap();
        db.create_analysis(&bob, "b/other").unwrap();

        let listed = db.list_analyses_for_user(&alice).unwrap();
        let ids: Vec<_> = listed.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }
}

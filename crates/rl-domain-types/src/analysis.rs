// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Analysis results and their persisted form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The four labelled sections of a structured code review.
///
/// Any section the model did not produce is an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct AnalysisSections {
    pub overview: String,
    pub analysis: String,
    pub changes: String,
    pub risks: String,
}

impl AnalysisSections {
    pub fn is_empty(&self) -> bool {
        self.overview.is_empty()
            && self.analysis.is_empty()
            && self.changes.is_empty()
            && self.risks.is_empty()
    }
}

/// A code edit proposed inside a chat reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct CodeChangeProposal {
    pub content: String,
    pub description: String,
}

/// Lifecycle of a stored analysis
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    /// Whether no further transitions are allowed
    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

/// Classification of a stored suggestion
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeKind {
    #[default]
    Improvement,
    Feature,
    Fix,
}

/// One file's suggestion inside a stored analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StoredChange {
    pub file_path: String,
    pub suggestion: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
}

/// A persisted batch analysis of repository files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StoredAnalysis {
    pub id: String,
    pub user_id: String,
    pub repo_name: String,
    pub changes: Vec<StoredChange>,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_text() {
        assert_eq!(AnalysisStatus::Processing.to_string(), "PROCESSING");
        assert_eq!(AnalysisStatus::from_str("FAILED").unwrap(), AnalysisStatus::Failed);
        assert!(AnalysisStatus::from_str("unknown").is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!AnalysisStatus::Pending.is_terminal());
        assert!(!AnalysisStatus::Processing.is_terminal());
        assert!(AnalysisStatus::Completed.is_terminal());
        assert!(AnalysisStatus::Failed.is_terminal());
    }

    #[test]
    fn stored_change_uses_camel_case() {
        let change = StoredChange {
            file_path: "src/app.ts".into(),
            suggestion: "Use const".into(),
            kind: ChangeKind::Improvement,
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["filePath"], "src/app.ts");
        assert_eq!(json["type"], "improvement");
    }
}

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Bounded-concurrency analysis of many files

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;

use rl_domain_types::{ChangeKind, StoredChange};

use crate::client::TextGenerator;
use crate::error::{AnalysisError, AnalysisResult};
use crate::prompts::batch_prompt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

/// Ask for improvements to every file, at most `concurrency` requests at a
/// time. Results keep the input order. The first failure fails the batch.
pub async fn analyze_files(
    generator: &dyn TextGenerator,
    files: &[SourceFile],
    concurrency: usize,
) -> AnalysisResult<Vec<StoredChange>> {
    debug!(files = files.len(), concurrency, "Starting batch analysis");

    stream::iter(files.iter().cloned())
        .map(move |file: SourceFile| async move {
            let suggestion = generator
                .request_analysis(&batch_prompt(&file.path, &file.content))
                .await?;
            Ok::<_, AnalysisError>(StoredChange {
                file_path: file.path,
                suggestion,
                kind: ChangeKind::Improvement,
            })
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedGenerator;

    fn file(path: &str) -> SourceFile {
        SourceFile {
            path: path.into(),
            content: format!("// {path}"),
        }
    }

    #[tokio::test]
    async fn results_follow_input_order() {
        let generator = ScriptedGenerator::new("generic")
            .reply_when("file b.rs", "improve b")
            .reply_when("file a.rs", "improve a");

        let changes = analyze_files(&generator, &[file("a.rs"), file("b.rs")], 4)
            .await
            .unwrap();

        let got: Vec<_> = changes
            .iter()
            .map(|c| (c.file_path.as_str(), c.suggestion.as_str(), c.kind))
            .collect();
        assert_eq!(
            got,
            vec![
                ("a.rs", "improve a", ChangeKind::Improvement),
                ("b.rs", "improve b", ChangeKind::Improvement),
            ]
        );
    }

    #[tokio::test]
    async fn one_failure_fails_the_batch() {
        let generator = ScriptedGenerator::new("ok").fail_when("file b.rs");

        let err = analyze_files(&generator, &[file("a.rs"), file("b.rs"), file("c.rs")], 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Provider { .. }));
    }

    #[tokio::test]
    async fn empty_input_makes_no_requests() {
        let generator = ScriptedGenerator::new("ok");
        let changes = analyze_files(&generator, &[], 4).await.unwrap();
        assert!(changes.is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn batch_runs_on_a_spawned_task() {
        let generator = std::sync::Arc::new(ScriptedGenerator::new("looks fine"));
        let files = vec![file("a.rs"), file("b.rs")];

        let task_generator = generator.clone();
        let changes = tokio::spawn(async move {
            analyze_files(task_generator.as_ref(), &files, 2).await
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(generator.calls(), 2);
    }
}

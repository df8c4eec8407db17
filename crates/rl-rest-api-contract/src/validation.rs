// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Validation helpers for API contract types

use crate::error::ApiContractError;
use rl_domain_types::RepoRef;
use validator::{Validate, ValidationError};

/// `validator` hook: the value must be an `owner/repo` name
pub fn validate_repo_name(name: &str) -> Result<(), ValidationError> {
    name.parse::<RepoRef>().map(|_| ()).map_err(|_| {
        let mut error = ValidationError::new("repo_name");
        error.message = Some("Repository name must be in the form 'owner/repo'".into());
        error
    })
}

/// Validate any request body
pub fn validate_request<T: Validate>(request: &T) -> Result<(), ApiContractError> {
    request.validate()?;
    Ok(())
}

/// Parse a validated repository name into its parts
pub fn parse_repo_ref(name: &str) -> Result<RepoRef, ApiContractError> {
    Ok(name.parse::<RepoRef>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;
    use crate::{field_errors, ProblemDetails};

    #[test]
    fn repo_name_rule() {
        assert!(validate_repo_name("octocat/hello").is_ok());
        assert!(validate_repo_name("octocat").is_err());
        assert!(validate_repo_name("a/b/c").is_err());
    }

    #[test]
    fn rejects_bad_repo_name_in_request() {
        let request = AnalyzeRepositoryRequest {
            repository_name: "not-a-repo".into(),
            branch: "main".into(),
        };
        let err = validate_request(&request).unwrap_err();
        assert!(matches!(err, ApiContractError::Validation(_)));
    }

    #[test]
    fn nested_file_errors_are_reported_by_index() {
        let request = CreateAnalysisRequest {
            repo_name: "octocat/hello".into(),
            files: vec![
                AnalysisFile {
                    path: "ok.rs".into(),
                    content: "fn a() {}".into(),
                },
                AnalysisFile {
                    path: String::new(),
                    content: String::new(),
                },
            ],
        };
        let errors = request.validate().unwrap_err();
        let fields = field_errors(&errors);
        assert_eq!(
            fields.get("files[1].path"),
            Some(&vec!["File path cannot be empty".to_string()])
        );
    }

    #[test]
    fn empty_file_list_is_rejected() {
        let request = CreateAnalysisRequest {
            repo_name: "octocat/hello".into(),
            files: vec![],
        };
        let fields = field_errors(&request.validate().unwrap_err());
        assert!(fields.contains_key("files"));
    }

    #[test]
    fn parse_repo_ref_splits_parts() {
        let repo = parse_repo_ref("octocat/hello").unwrap();
        assert_eq!(repo.owner, "octocat");
        assert!(matches!(
            parse_repo_ref("bad"),
            Err(ApiContractError::InvalidRepoName(_))
        ));
    }

    #[test]
    fn problem_details_serialization() {
        let problem = ProblemDetails::new("validation", "Validation Error", 400, "bad body");
        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["type"], "https://repolens.dev/errors/validation");
        assert_eq!(json["status"], 400);
        assert!(json.get("errors").is_none());
    }
}

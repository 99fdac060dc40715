// src/models/project.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

/// A student's submission for a course project.
/// Once `submitted` is true the project counts as done for eligibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSubmission {
    pub project_id: String,
    pub course_id: String,
    pub github_url: String,
    pub live_url: Option<String>,
    pub notes: Option<String>,
    pub submitted: bool,
    pub submitted_at: DateTime<Utc>,
}

/// DTO for submitting a project.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitProjectRequest {
    #[validate(length(min = 1, max = 500), custom(function = validate_github_url))]
    pub github_url: String,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub live_url: Option<String>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

/// Validates that a string is a correctly formatted http(s) URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_url")),
    }
}

/// Validates that the repository link points at GitHub.
fn validate_github_url(url: &str) -> Result<(), validator::ValidationError> {
    validate_url_string(url)?;
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase));
    match host.as_deref() {
        Some("github.com") | Some("www.github.com") => Ok(()),
        _ => Err(validator::ValidationError::new("not_a_github_url")),
    }
}

// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One answered question inside an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: String,
    pub selected_option_id: String,
}

/// The stored result of a student's single attempt at a test.
/// Created once on submission and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub test_id: String,
    pub course_id: String,
    pub answers: Vec<SubmittedAnswer>,
    pub correct_count: usize,
    pub total_questions: usize,

    /// Rounded score in the range 0..=100.
    pub score_percentage: u8,
    pub passed: bool,
    pub attempted_at: DateTime<Utc>,
}

/// DTO for submitting a test attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    #[validate(length(max = 500, message = "Too many answers submitted."))]
    pub answers: Vec<SubmittedAnswer>,
}

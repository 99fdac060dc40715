// src/models/tutor.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Where in the platform the question was asked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TutorContext {
    pub course_id: Option<String>,
    pub course_title: Option<String>,
    pub lesson_id: Option<String>,
    pub lesson_title: Option<String>,
    pub lab_id: Option<String>,
    pub lab_title: Option<String>,
}

/// DTO for asking the tutor a question.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TutorQuestion {
    #[validate(length(min = 1, max = 4000, message = "Question must be between 1 and 4000 characters."))]
    pub question: String,
    #[serde(default)]
    pub context: TutorContext,
}

/// The tutor's reply, passed through to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorReply {
    pub answer: String,

    /// Classification reported by the tutor service (e.g. "explanation", "hint").
    pub response_type: String,
}

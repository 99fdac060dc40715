// src/models/progress.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::sandbox::ExecutionResult;

/// A single completed lesson. Stored under its own key, so marks on
/// different lessons never overwrite each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson_id: String,
    pub completed_at: DateTime<Utc>,
}

/// Lesson completion for one course, assembled from the per-lesson records.
/// A lesson appears at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseProgress {
    pub course_id: String,
    pub completed_lessons: Vec<LessonProgress>,
}

impl CourseProgress {
    /// Orders lessons by completion time.
    pub fn from_lessons(course_id: &str, mut lessons: Vec<LessonProgress>) -> Self {
        lessons.sort_by(|a, b| {
            a.completed_at
                .cmp(&b.completed_at)
                .then_with(|| a.lesson_id.cmp(&b.lesson_id))
        });
        Self {
            course_id: course_id.to_string(),
            completed_lessons: lessons,
        }
    }

    pub fn is_completed(&self, lesson_id: &str) -> bool {
        self.completed_lessons.iter().any(|l| l.lesson_id == lesson_id)
    }
}

/// The latest code a student saved for a lab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabDraft {
    pub user_code: String,
    pub saved_at: DateTime<Utc>,
}

/// Written once, when the lab is first solved. Kept apart from the draft so
/// saving code can never clear it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabCompletion {
    pub completed_at: DateTime<Utc>,
}

/// Per-lab state: the latest draft and whether the lab has been solved.
///
/// `completed_at` is set whenever `completed` is true; both come from the
/// same `LabCompletion`, so they cannot disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabProgress {
    lab_id: String,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
    user_code: String,
}

impl LabProgress {
    pub fn assemble(lab_id: &str, draft: Option<LabDraft>, completion: Option<LabCompletion>) -> Self {
        let completed_at = completion.map(|c| c.completed_at);
        Self {
            lab_id: lab_id.to_string(),
            completed: completed_at.is_some(),
            completed_at,
            user_code: draft.map(|d| d.user_code).unwrap_or_default(),
        }
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn user_code(&self) -> &str {
        &self.user_code
    }
}

/// DTO for autosaving lab code. The size limit comes from the sandbox config.
#[derive(Debug, Deserialize)]
pub struct SaveDraftRequest {
    pub code: String,
}

/// DTO for running code, either in a lab or in the free playground.
/// The upper size limit comes from the sandbox config.
#[derive(Debug, Deserialize, Validate)]
pub struct RunCodeRequest {
    #[validate(length(min = 1, message = "Code must not be empty."))]
    pub code: String,
}

/// Response for a lab run.
#[derive(Debug, Serialize)]
pub struct LabRunResponse {
    pub result: ExecutionResult,

    /// `None` when the lab has no expected output to compare against.
    pub output_matches: Option<bool>,

    pub progress: LabProgress,
}

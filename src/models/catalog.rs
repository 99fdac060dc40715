// src/models/catalog.rs

use serde::{Deserialize, Serialize};

/// A course as described in the catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,

    /// Whether a passing test attempt is needed for a certificate.
    #[serde(default)]
    pub test_required: bool,

    /// Whether a submitted project is needed for a certificate.
    #[serde(default)]
    pub project_required: bool,
}

impl Course {
    pub fn has_lesson(&self, lesson_id: &str) -> bool {
        self.lessons.iter().any(|l| l.id == lesson_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// A practice lab: the student edits `starter_code` until its console output
/// matches `expected_output`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lab {
    pub id: String,
    pub course_id: String,
    #[serde(default)]
    pub lesson_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub starter_code: String,

    /// Labs without an expected output are free-form and never auto-complete.
    #[serde(default)]
    pub expected_output: Option<String>,
}

/// Represents a multiple-choice test, including its answer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Test {
    pub id: String,
    pub course_id: String,
    pub title: String,

    /// Minimum score (0-100) needed to pass.
    pub passing_percentage: u8,

    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,

    /// The text content of the question.
    pub prompt: String,

    pub options: Vec<QuestionOption>,

    /// The id of the correct option.
    pub correct_option_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub course_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// DTO for listing courses without lesson bodies.
#[derive(Debug, Serialize)]
pub struct CourseSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub lesson_count: usize,
    pub test_required: bool,
    pub project_required: bool,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id.clone(),
            title: course.title.clone(),
            description: course.description.clone(),
            lesson_count: course.lessons.len(),
            test_required: course.test_required,
            project_required: course.project_required,
        }
    }
}

/// DTO for sending a test to the client (excludes the answer key).
#[derive(Debug, Serialize)]
pub struct PublicTest {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub passing_percentage: u8,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for sending a question to the client (excludes the correct option).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub prompt: String,
    pub options: Vec<QuestionOption>,
}

impl From<&Test> for PublicTest {
    fn from(test: &Test) -> Self {
        Self {
            id: test.id.clone(),
            course_id: test.course_id.clone(),
            title: test.title.clone(),
            passing_percentage: test.passing_percentage,
            questions: test
                .questions
                .iter()
                .map(|q| PublicQuestion {
                    id: q.id.clone(),
                    prompt: q.prompt.clone(),
                    options: q.options.clone(),
                })
                .collect(),
        }
    }
}

use serde::Serialize;

use crate::models::catalog::Course;

/// Which completion signals a course demands for a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityPolicy {
    pub course_id: String,
    pub total_lessons: usize,
    pub test_required: bool,
    pub project_required: bool,
}

impl From<&Course> for EligibilityPolicy {
    fn from(course: &Course) -> Self {
        Self {
            course_id: course.id.clone(),
            total_lessons: course.lessons.len(),
            test_required: course.test_required,
            project_required: course.project_required,
        }
    }
}

/// Current state of a student's progress signals for one course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseSignals {
    pub completed_lessons: usize,
    /// True when any stored attempt for the course passed.
    pub test_passed: bool,
    /// True when any project for the course has been submitted.
    pub project_submitted: bool,
}

/// Where a student stands in a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStage {
    NotStarted,
    InProgress,
    LessonsDone,
    Eligible,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityResult {
    pub course_id: String,
    pub eligible: bool,
    pub lessons_complete: bool,
    /// `None` when the course does not require a test.
    pub test_passed: Option<bool>,
    /// `None` when the course does not require a project.
    pub project_submitted: Option<bool>,
    pub total_lessons: usize,
    pub completed_lessons: usize,
    pub stage: CourseStage,
}

/// Combines progress signals into a certificate verdict.
///
/// A course without lessons is never lesson-complete, so it can never be
/// eligible. The result is derived fresh from its inputs on every call.
pub fn compute_eligibility(policy: &EligibilityPolicy, signals: &CourseSignals) -> EligibilityResult {
    let lessons_complete =
        policy.total_lessons > 0 && signals.completed_lessons >= policy.total_lessons;

    let test_passed = policy.test_required.then_some(signals.test_passed);
    let project_submitted = policy.project_required.then_some(signals.project_submitted);

    let eligible = lessons_complete
        && test_passed.unwrap_or(true)
        && project_submitted.unwrap_or(true);

    let stage = if eligible {
        CourseStage::Eligible
    } else if lessons_complete {
        CourseStage::LessonsDone
    } else if signals.completed_lessons > 0 {
        CourseStage::InProgress
    } else {
        CourseStage::NotStarted
    };

    EligibilityResult {
        course_id: policy.course_id.clone(),
        eligible,
        lessons_complete,
        test_passed,
        project_submitted,
        total_lessons: policy.total_lessons,
        completed_lessons: signals.completed_lessons,
        stage,
    }
}

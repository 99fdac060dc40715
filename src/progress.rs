// src/progress.rs

use chrono::Utc;

use crate::{
    assessment::{CourseSignals, EligibilityPolicy, EligibilityResult, compute_eligibility, grade_attempt},
    error::AppError,
    models::{
        attempt::{Attempt, SubmittedAnswer},
        catalog::{Course, Project, Test},
        progress::{CourseProgress, LabCompletion, LabDraft, LabProgress, LessonProgress},
        project::ProjectSubmission,
    },
    store::{self, KeyValueStore},
    utils::html::clean_html,
};

/// One student's progress records on top of a key-value store.
///
/// Every key is namespaced by the student id, so trackers for different
/// students never see each other's data. Each record that can be written
/// concurrently lives under its own key and is written in one store call.
pub struct ProgressTracker<'a> {
    store: &'a dyn KeyValueStore,
    student_id: &'a str,
    /// `student_id` with ':' escaped so one student's prefix never matches another's keys.
    namespace: String,
}

/// Escapes the key separator so an id can never reach into a neighbouring key.
fn key_part(id: &str) -> String {
    id.replace('%', "%25").replace(':', "%3A")
}

impl<'a> ProgressTracker<'a> {
    pub fn new(store: &'a dyn KeyValueStore, student_id: &'a str) -> Self {
        Self {
            store,
            student_id,
            namespace: key_part(student_id),
        }
    }

    fn lesson_prefix(&self, course_id: &str) -> String {
        format!("lesson-progress:{}:{}:", self.namespace, key_part(course_id))
    }

    fn lesson_key(&self, course_id: &str, lesson_id: &str) -> String {
        format!("{}{}", self.lesson_prefix(course_id), key_part(lesson_id))
    }

    fn lab_draft_key(&self, lab_id: &str) -> String {
        format!("lab-draft:{}:{}", self.namespace, key_part(lab_id))
    }

    fn lab_completion_key(&self, lab_id: &str) -> String {
        format!("lab-completion:{}:{}", self.namespace, key_part(lab_id))
    }

    fn attempt_prefix(&self) -> String {
        format!("test-attempt:{}:", self.namespace)
    }

    fn attempt_key(&self, test_id: &str) -> String {
        format!("{}{}", self.attempt_prefix(), key_part(test_id))
    }

    fn project_prefix(&self) -> String {
        format!("project-submission:{}:", self.namespace)
    }

    fn project_key(&self, project_id: &str) -> String {
        format!("{}{}", self.project_prefix(), key_part(project_id))
    }

    // Lessons

    pub async fn course_progress(&self, course_id: &str) -> Result<CourseProgress, AppError> {
        let lessons = store::load_prefix(self.store, &self.lesson_prefix(course_id)).await?;
        Ok(CourseProgress::from_lessons(course_id, lessons))
    }

    /// Idempotent: marking an already completed lesson keeps its first timestamp.
    pub async fn mark_lesson_complete(
        &self,
        course_id: &str,
        lesson_id: &str,
    ) -> Result<CourseProgress, AppError> {
        self.record_lesson(course_id, lesson_id).await?;
        self.course_progress(course_id).await
    }

    /// Idempotent: unmarking a lesson that is not completed changes nothing.
    pub async fn mark_lesson_incomplete(
        &self,
        course_id: &str,
        lesson_id: &str,
    ) -> Result<CourseProgress, AppError> {
        self.forget_lesson(course_id, lesson_id).await?;
        self.course_progress(course_id).await
    }

    pub async fn toggle_lesson(
        &self,
        course_id: &str,
        lesson_id: &str,
    ) -> Result<CourseProgress, AppError> {
        if !self.forget_lesson(course_id, lesson_id).await? {
            self.record_lesson(course_id, lesson_id).await?;
        }
        self.course_progress(course_id).await
    }

    async fn record_lesson(&self, course_id: &str, lesson_id: &str) -> Result<bool, AppError> {
        let record = LessonProgress {
            lesson_id: lesson_id.to_string(),
            completed_at: Utc::now(),
        };
        let created = store::create(self.store, &self.lesson_key(course_id, lesson_id), &record).await?;
        if created {
            tracing::info!("Student {} completed lesson {}/{}", self.student_id, course_id, lesson_id);
        }
        Ok(created)
    }

    async fn forget_lesson(&self, course_id: &str, lesson_id: &str) -> Result<bool, AppError> {
        let removed = self.store.remove(&self.lesson_key(course_id, lesson_id)).await?;
        if removed {
            tracing::info!("Student {} reopened lesson {}/{}", self.student_id, course_id, lesson_id);
        }
        Ok(removed)
    }

    // Labs

    pub async fn lab_progress(&self, lab_id: &str) -> Result<LabProgress, AppError> {
        let draft: Option<LabDraft> = store::load(self.store, &self.lab_draft_key(lab_id)).await?;
        let completion: Option<LabCompletion> =
            store::load(self.store, &self.lab_completion_key(lab_id)).await?;
        Ok(LabProgress::assemble(lab_id, draft, completion))
    }

    /// Stores the latest code without touching completion.
    pub async fn save_lab_draft(&self, lab_id: &str, code: &str) -> Result<LabProgress, AppError> {
        self.write_draft(lab_id, code).await?;
        self.lab_progress(lab_id).await
    }

    /// Stores the solving code and marks the lab completed. The first
    /// completion time is kept.
    pub async fn complete_lab(&self, lab_id: &str, code: &str) -> Result<LabProgress, AppError> {
        self.write_draft(lab_id, code).await?;
        let completion = LabCompletion {
            completed_at: Utc::now(),
        };
        if store::create(self.store, &self.lab_completion_key(lab_id), &completion).await? {
            tracing::info!("Student {} completed lab {}", self.student_id, lab_id);
        }
        self.lab_progress(lab_id).await
    }

    async fn write_draft(&self, lab_id: &str, code: &str) -> Result<(), AppError> {
        let draft = LabDraft {
            user_code: code.to_string(),
            saved_at: Utc::now(),
        };
        store::save(self.store, &self.lab_draft_key(lab_id), &draft).await
    }

    // Tests

    pub async fn attempt(&self, test_id: &str) -> Result<Option<Attempt>, AppError> {
        store::load(self.store, &self.attempt_key(test_id)).await
    }

    /// Grades and stores the student's only attempt at `test`.
    ///
    /// Fails with `AlreadyAttempted` when an attempt exists; the stored attempt
    /// is left untouched in that case.
    pub async fn submit_attempt(
        &self,
        test: &Test,
        answers: Vec<SubmittedAnswer>,
    ) -> Result<Attempt, AppError> {
        let key = self.attempt_key(&test.id);

        if self.store.get(&key).await?.is_some() {
            return Err(AppError::AlreadyAttempted {
                test_id: test.id.clone(),
            });
        }

        let attempt = grade_attempt(test, answers, Utc::now());

        // A concurrent submission may have won the race since the check above.
        if !store::create(self.store, &key, &attempt).await? {
            return Err(AppError::AlreadyAttempted {
                test_id: test.id.clone(),
            });
        }

        tracing::info!(
            "Student {} scored {}% on test {} (passed: {})",
            self.student_id,
            attempt.score_percentage,
            test.id,
            attempt.passed
        );

        Ok(attempt)
    }

    /// Removes a stored attempt. Returns whether one existed.
    pub async fn clear_attempt(&self, test_id: &str) -> Result<bool, AppError> {
        let removed = self.store.remove(&self.attempt_key(test_id)).await?;
        if removed {
            tracing::warn!("Cleared attempt of student {} on test {}", self.student_id, test_id);
        }
        Ok(removed)
    }

    pub async fn attempts(&self) -> Result<Vec<Attempt>, AppError> {
        store::load_prefix(self.store, &self.attempt_prefix()).await
    }

    // Projects

    pub async fn project_submission(&self, project_id: &str) -> Result<Option<ProjectSubmission>, AppError> {
        store::load(self.store, &self.project_key(project_id)).await
    }

    /// Records a submission. Resubmitting replaces the links and notes.
    pub async fn submit_project(
        &self,
        project: &Project,
        github_url: &str,
        live_url: Option<&str>,
        notes: Option<&str>,
    ) -> Result<ProjectSubmission, AppError> {
        let submission = ProjectSubmission {
            project_id: project.id.clone(),
            course_id: project.course_id.clone(),
            github_url: github_url.trim().to_string(),
            live_url: live_url.map(str::trim).filter(|u| !u.is_empty()).map(str::to_string),
            notes: notes.map(clean_html).filter(|n| !n.trim().is_empty()),
            submitted: true,
            submitted_at: Utc::now(),
        };
        store::save(self.store, &self.project_key(&project.id), &submission).await?;
        tracing::info!("Student {} submitted project {}", self.student_id, project.id);
        Ok(submission)
    }

    pub async fn project_submissions(&self) -> Result<Vec<ProjectSubmission>, AppError> {
        store::load_prefix(self.store, &self.project_prefix()).await
    }

    // Eligibility

    /// Reads the three signals for `course` and derives the verdict.
    pub async fn eligibility(&self, course: &Course) -> Result<EligibilityResult, AppError> {
        let progress = self.course_progress(&course.id).await?;
        // Only lessons still in the catalog count.
        let completed_lessons = progress
            .completed_lessons
            .iter()
            .filter(|l| course.has_lesson(&l.lesson_id))
            .count();

        let test_passed = self
            .attempts()
            .await?
            .iter()
            .any(|a| a.course_id == course.id && a.passed);

        let project_submitted = self
            .project_submissions()
            .await?
            .iter()
            .any(|s| s.course_id == course.id && s.submitted);

        let signals = CourseSignals {
            completed_lessons,
            test_passed,
            project_submitted,
        };

        Ok(compute_eligibility(&EligibilityPolicy::from(course), &signals))
    }
}

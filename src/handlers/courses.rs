// src/handlers/courses.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    catalog::Catalog,
    error::AppError,
    models::catalog::CourseSummary,
    progress::ProgressTracker,
    state::AppState,
    utils::jwt::Claims,
};

/// Lists all courses in the catalog.
pub async fn list_courses(State(catalog): State<Arc<Catalog>>) -> Result<impl IntoResponse, AppError> {
    let courses: Vec<CourseSummary> = catalog.courses().iter().map(CourseSummary::from).collect();
    Ok(Json(courses))
}

/// Retrieves a single course with its lessons.
pub async fn get_course(
    State(catalog): State<Arc<Catalog>>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(catalog.course(&course_id)?.clone()))
}

/// Lessons the current student has completed in a course.
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let course = state.catalog.course(&course_id)?;
    let tracker = ProgressTracker::new(state.store.as_ref(), &claims.sub);
    Ok(Json(tracker.course_progress(&course.id).await?))
}

/// Marks a lesson completed. Repeating the call changes nothing.
pub async fn complete_lesson(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, lesson_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    ensure_lesson(&state.catalog, &course_id, &lesson_id)?;
    let tracker = ProgressTracker::new(state.store.as_ref(), &claims.sub);
    Ok(Json(tracker.mark_lesson_complete(&course_id, &lesson_id).await?))
}

/// Marks a lesson not completed. Repeating the call changes nothing.
pub async fn uncomplete_lesson(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, lesson_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    ensure_lesson(&state.catalog, &course_id, &lesson_id)?;
    let tracker = ProgressTracker::new(state.store.as_ref(), &claims.sub);
    Ok(Json(tracker.mark_lesson_incomplete(&course_id, &lesson_id).await?))
}

/// Flips a lesson between completed and not completed.
pub async fn toggle_lesson(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((course_id, lesson_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    ensure_lesson(&state.catalog, &course_id, &lesson_id)?;
    let tracker = ProgressTracker::new(state.store.as_ref(), &claims.sub);
    Ok(Json(tracker.toggle_lesson(&course_id, &lesson_id).await?))
}

/// Certificate eligibility for the current student, computed from live progress.
pub async fn get_eligibility(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let course = state.catalog.course(&course_id)?;
    let tracker = ProgressTracker::new(state.store.as_ref(), &claims.sub);
    Ok(Json(tracker.eligibility(course).await?))
}

fn ensure_lesson(catalog: &Catalog, course_id: &str, lesson_id: &str) -> Result<(), AppError> {
    let course = catalog.course(course_id)?;
    if !course.has_lesson(lesson_id) {
        return Err(AppError::NotFound(format!(
            "Lesson '{}' not found in course '{}'",
            lesson_id, course_id
        )));
    }
    Ok(())
}

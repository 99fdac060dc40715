// src/handlers/projects.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::project::SubmitProjectRequest,
    progress::ProgressTracker,
    state::AppState,
    utils::jwt::Claims,
};

pub async fn get_submission(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let project = state.catalog.project(&project_id)?;
    let tracker = ProgressTracker::new(state.store.as_ref(), &claims.sub);
    let submission = tracker
        .project_submission(&project.id)
        .await?
        .ok_or(AppError::NotFound("Project not submitted yet".to_string()))?;
    Ok(Json(submission))
}

/// Submits (or resubmits) a project. Notes are sanitized before storage.
pub async fn submit_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(project_id): Path<String>,
    Json(payload): Json<SubmitProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let project = state.catalog.project(&project_id)?;
    let tracker = ProgressTracker::new(state.store.as_ref(), &claims.sub);
    let submission = tracker
        .submit_project(
            project,
            &payload.github_url,
            payload.live_url.as_deref(),
            payload.notes.as_deref(),
        )
        .await?;
    Ok(Json(submission))
}

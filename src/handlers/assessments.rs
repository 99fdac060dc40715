// src/handlers/assessments.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{attempt::SubmitAttemptRequest, catalog::PublicTest},
    progress::ProgressTracker,
    state::AppState,
    utils::jwt::Claims,
};

/// Retrieves a test without its answer key.
pub async fn get_test(
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let test = state.catalog.test(&test_id)?;
    Ok(Json(PublicTest::from(test)))
}

/// Submits the student's answers for a test.
///
/// * Scores the answers against the catalog's key.
/// * Stores the attempt; each student gets exactly one attempt per test.
/// * Returns 409 when an attempt already exists.
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<String>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let test = state.catalog.test(&test_id)?;
    let tracker = ProgressTracker::new(state.store.as_ref(), &claims.sub);
    let attempt = tracker.submit_attempt(test, req.answers).await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Retrieves the student's stored attempt for a test.
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let test = state.catalog.test(&test_id)?;
    let tracker = ProgressTracker::new(state.store.as_ref(), &claims.sub);
    let attempt = tracker
        .attempt(&test.id)
        .await?
        .ok_or(AppError::NotFound("No attempt for this test yet".to_string()))?;
    Ok(Json(attempt))
}

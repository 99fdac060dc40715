// src/handlers/admin.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{error::AppError, progress::ProgressTracker, state::AppState};

/// Deletes a student's stored attempt so the test can be taken again.
/// Admin only.
pub async fn clear_attempt(
    State(state): State<AppState>,
    Path((student_id, test_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let tracker = ProgressTracker::new(state.store.as_ref(), &student_id);
    if !tracker.clear_attempt(&test_id).await? {
        return Err(AppError::NotFound("Attempt not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

// src/handlers/tutor.rs

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{error::AppError, models::tutor::TutorQuestion, state::AppState};

/// Forwards a question and its page context to the AI tutor.
pub async fn ask_tutor(
    State(state): State<AppState>,
    Json(payload): Json<TutorQuestion>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let tutor = state
        .tutor
        .as_ref()
        .ok_or(AppError::ServiceUnavailable("The AI tutor is not configured.".to_string()))?;
    Ok(Json(tutor.ask(&payload).await?))
}

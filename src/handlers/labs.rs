// src/handlers/labs.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::progress::{LabRunResponse, RunCodeRequest, SaveDraftRequest},
    progress::ProgressTracker,
    sandbox::{ExecutionResult, compare_output},
    state::AppState,
    utils::jwt::Claims,
};

/// Runs code in a sandbox worker, waiting for a free slot first.
///
/// The permit is held until the worker process has exited or been killed.
async fn run_in_sandbox(state: &AppState, code: &str) -> Result<ExecutionResult, AppError> {
    let _permit = state
        .sandbox_permits
        .acquire()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(state.sandbox.execute(code).await)
}

/// Executes arbitrary code in the sandbox without touching any lab.
pub async fn execute_code(
    State(state): State<AppState>,
    Json(payload): Json<RunCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let result = run_in_sandbox(&state, &payload.code).await?;
    Ok(Json(result))
}

/// Retrieves a lab's instructions, starter code and expected output.
pub async fn get_lab(
    State(state): State<AppState>,
    Path(lab_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.catalog.lab(&lab_id)?.clone()))
}

pub async fn get_lab_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(lab_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let lab = state.catalog.lab(&lab_id)?;
    let tracker = ProgressTracker::new(state.store.as_ref(), &claims.sub);
    Ok(Json(tracker.lab_progress(&lab.id).await?))
}

/// Autosaves the student's code. Completion is not affected.
pub async fn save_draft(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(lab_id): Path<String>,
    Json(payload): Json<SaveDraftRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_storable(&state, &payload.code)?;
    let lab = state.catalog.lab(&lab_id)?;
    let tracker = ProgressTracker::new(state.store.as_ref(), &claims.sub);
    Ok(Json(tracker.save_lab_draft(&lab.id, &payload.code).await?))
}

/// Runs the student's code for a lab.
///
/// * Executes the code in the sandbox.
/// * Compares the captured output with the lab's expected output.
/// * Marks the lab completed on a match, otherwise only saves the code.
pub async fn run_lab(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(lab_id): Path<String>,
    Json(payload): Json<RunCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    ensure_storable(&state, &payload.code)?;
    let lab = state.catalog.lab(&lab_id)?.clone();

    let result = run_in_sandbox(&state, &payload.code).await?;

    let output_matches = lab
        .expected_output
        .as_deref()
        .map(|expected| result.success && compare_output(&result.output, expected));

    let tracker = ProgressTracker::new(state.store.as_ref(), &claims.sub);
    let progress = if output_matches == Some(true) {
        tracker.complete_lab(&lab.id, &payload.code).await?
    } else {
        tracker.save_lab_draft(&lab.id, &payload.code).await?
    };

    Ok(Json(LabRunResponse {
        result,
        output_matches,
        progress,
    }))
}

/// Lab code is stored, so it must fit the same limit the sandbox enforces.
fn ensure_storable(state: &AppState, code: &str) -> Result<(), AppError> {
    let limit = state.config.sandbox.max_code_bytes;
    if code.len() > limit {
        return Err(AppError::BadRequest(format!(
            "Code must be at most {} bytes.",
            limit
        )));
    }
    Ok(())
}

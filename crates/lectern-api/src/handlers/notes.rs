//! Lecture-note endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use lectern_core::NoteParams;

use crate::error::ApiResult;
use crate::extract::OwnerId;
use crate::handlers::{
    job_delete, job_regenerate, job_status, validate_material, StatusResponse, SubmitResponse,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitNoteRequest {
    /// Raw lecture transcript to format.
    pub transcript: String,
    #[serde(flatten)]
    pub params: NoteParams,
}

pub async fn submit_note(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(req): Json<SubmitNoteRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    validate_material("transcript", &req.transcript)?;

    let job_id = state
        .notes
        .submit(owner_id, Some(&req.transcript), req.params)
        .await?;
    Ok(Json(SubmitResponse { job_id }))
}

pub async fn note_status(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StatusResponse>> {
    job_status(&state.notes, id, owner_id).await
}

pub async fn regenerate_note(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SubmitResponse>> {
    job_regenerate(&state.notes, id, owner_id).await
}

pub async fn delete_note(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    job_delete(&state.notes, id, owner_id).await
}

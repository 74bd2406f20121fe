//! Textbook explanation endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use lectern_core::{Error, TextbookParams};

use crate::error::ApiResult;
use crate::extract::OwnerId;
use crate::handlers::{
    job_delete, job_regenerate, job_status, validate_material, StatusResponse, SubmitResponse,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitTextbookRequest {
    /// Extracted book text to explain.
    pub text: String,
    #[serde(flatten)]
    pub params: TextbookParams,
}

pub async fn submit_textbook(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(req): Json<SubmitTextbookRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    if req.params.title.trim().is_empty() {
        return Err(Error::InvalidInput("title must not be empty".into()).into());
    }
    if req.params.page_count < 1 {
        return Err(Error::InvalidInput("page_count must be positive".into()).into());
    }
    validate_material("text", &req.text)?;

    let job_id = state
        .textbooks
        .submit(owner_id, Some(&req.text), req.params)
        .await?;
    Ok(Json(SubmitResponse { job_id }))
}

pub async fn textbook_status(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StatusResponse>> {
    job_status(&state.textbooks, id, owner_id).await
}

pub async fn regenerate_textbook(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SubmitResponse>> {
    job_regenerate(&state.textbooks, id, owner_id).await
}

pub async fn delete_textbook(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    job_delete(&state.textbooks, id, owner_id).await
}

//! Document drafting endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use lectern_core::{DocumentParams, Error};

use crate::error::ApiResult;
use crate::extract::OwnerId;
use crate::handlers::{
    job_delete, job_regenerate, job_status, validate_material, StatusResponse, SubmitResponse,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitDocumentRequest {
    #[serde(flatten)]
    pub params: DocumentParams,
    /// Optional inline source material to draft from.
    #[serde(default)]
    pub material: Option<String>,
}

pub async fn submit_document(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(req): Json<SubmitDocumentRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    if req.params.topic.trim().is_empty() {
        return Err(Error::InvalidInput("topic must not be empty".into()).into());
    }
    let material = req
        .material
        .as_deref()
        .filter(|text| !text.trim().is_empty());
    if let Some(text) = material {
        validate_material("material", text)?;
    }

    let job_id = state
        .documents
        .submit(owner_id, material, req.params)
        .await?;
    Ok(Json(SubmitResponse { job_id }))
}

pub async fn document_status(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StatusResponse>> {
    job_status(&state.documents, id, owner_id).await
}

pub async fn regenerate_document(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SubmitResponse>> {
    job_regenerate(&state.documents, id, owner_id).await
}

pub async fn delete_document(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    job_delete(&state.documents, id, owner_id).await
}

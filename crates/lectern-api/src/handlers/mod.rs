//! HTTP handlers.

pub mod activities;
pub mod documents;
pub mod notes;
pub mod textbooks;

use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use lectern_core::JobStatus;

use crate::error::ApiResult;
use crate::state::JobService;

/// Response for a successful submission or regeneration.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: Uuid,
}

/// Response for a status poll.
///
/// `output_key` is absent until the job completes; `error_message` is
/// present only on failure. Safe to poll at high frequency — this is a
/// single owner-scoped row read.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Shared owner-scoped status lookup.
pub(crate) async fn job_status<P: Clone + Send + Sync + 'static>(
    service: &JobService<P>,
    id: Uuid,
    owner_id: Uuid,
) -> ApiResult<Json<StatusResponse>> {
    let job = service.status(id, owner_id).await?;
    Ok(Json(StatusResponse {
        status: job.status,
        output_key: job.output_key,
        error_message: job.error_message,
    }))
}

/// Shared regeneration entry point.
pub(crate) async fn job_regenerate<P: Clone + Send + Sync + 'static>(
    service: &JobService<P>,
    id: Uuid,
    owner_id: Uuid,
) -> ApiResult<Json<SubmitResponse>> {
    let job_id = service.regenerate(id, owner_id).await?;
    Ok(Json(SubmitResponse { job_id }))
}

/// Shared deletion entry point.
pub(crate) async fn job_delete<P: Clone + Send + Sync + 'static>(
    service: &JobService<P>,
    id: Uuid,
    owner_id: Uuid,
) -> ApiResult<axum::http::StatusCode> {
    service.remove(id, owner_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// Validate a required material field: non-empty after trimming and within
/// the accepted size.
pub(crate) fn validate_material(field: &str, text: &str) -> ApiResult<()> {
    if text.trim().is_empty() {
        return Err(lectern_core::Error::InvalidInput(format!(
            "{} must not be empty",
            field
        ))
        .into());
    }
    if text.len() > lectern_core::defaults::MAX_INPUT_BYTES {
        return Err(lectern_core::Error::InvalidInput(format!(
            "{} exceeds the maximum accepted size",
            field
        ))
        .into());
    }
    Ok(())
}

//! Activity ledger endpoints.

use axum::extract::State;
use axum::Json;

use lectern_core::Activity;

use crate::error::ApiResult;
use crate::extract::OwnerId;
use crate::state::AppState;

/// The caller's usage ledger, newest first.
pub async fn list_activities(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
) -> ApiResult<Json<Vec<Activity>>> {
    let activities = state.activities.list_for_owner(owner_id).await?;
    Ok(Json(activities))
}

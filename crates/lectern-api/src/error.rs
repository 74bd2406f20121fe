//! HTTP mapping of core errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use lectern_core::Error;

/// Result alias for handler return types.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Wrapper turning a core [`Error`] into an HTTP response.
///
/// Ownership violations surface as not-found so existence is never leaked;
/// internal failures log the detail and return an opaque body.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::InvalidInput(m) => (StatusCode::BAD_REQUEST, m.clone()),
            Error::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            Error::NotFound(_) | Error::JobNotFound(_) => {
                (StatusCode::NOT_FOUND, "not found".to_string())
            }
            Error::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            Error::ContentRejected(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
            other => {
                error!(subsystem = "api", error = %other, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_of(e: Error) -> StatusCode {
        ApiError(e).into_response().status()
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(Error::InvalidInput("empty".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            status_of(Error::NotFound("job".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(Error::JobNotFound(Uuid::nil())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_conflict_maps_to_409() {
        assert_eq!(
            status_of(Error::Conflict("processing".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_unauthorized_maps_to_401() {
        assert_eq!(
            status_of(Error::Unauthorized("no header".into())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_content_rejected_maps_to_422() {
        assert_eq!(
            status_of(Error::ContentRejected("declined".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_internal_errors_are_opaque_500() {
        assert_eq!(
            status_of(Error::Internal("secret detail".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(Error::Database(sqlx::Error::PoolTimedOut)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

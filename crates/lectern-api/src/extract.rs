//! Request extractors.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use lectern_core::Error;

use crate::error::ApiError;

/// Header carrying the authenticated user id, set by the fronting auth
/// proxy. Authentication mechanics live there; this service only scopes
/// every read and write to the owner.
pub const OWNER_HEADER: &str = "x-lectern-user";

/// The authenticated owner of the request.
pub struct OwnerId(pub Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for OwnerId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError(Error::Unauthorized(format!("missing {} header", OWNER_HEADER)))
            })?;

        let id = Uuid::parse_str(value).map_err(|_| {
            ApiError(Error::Unauthorized(format!("invalid {} header", OWNER_HEADER)))
        })?;

        Ok(OwnerId(id))
    }
}

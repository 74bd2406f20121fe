//! # lectern-api
//!
//! HTTP API server for lectern: submission, status polling, regeneration,
//! deletion, and the activity ledger, per content type.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

use axum::http::HeaderName;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use error::{ApiError, ApiResult};
pub use extract::{OwnerId, OWNER_HEADER};
pub use state::{AppState, JobService};

use handlers::activities::list_activities;
use handlers::documents::{
    delete_document, document_status, regenerate_document, submit_document,
};
use handlers::notes::{delete_note, note_status, regenerate_note, submit_note};
use handlers::textbooks::{
    delete_textbook, regenerate_textbook, submit_textbook, textbook_status,
};

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation and debugging production incidents.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .route("/healthz", get(health))
        .route("/v1/documents", post(submit_document))
        .route("/v1/documents/:id/status", get(document_status))
        .route("/v1/documents/:id/regenerate", post(regenerate_document))
        .route("/v1/documents/:id", delete(delete_document))
        .route("/v1/notes", post(submit_note))
        .route("/v1/notes/:id/status", get(note_status))
        .route("/v1/notes/:id/regenerate", post(regenerate_note))
        .route("/v1/notes/:id", delete(delete_note))
        .route("/v1/textbooks", post(submit_textbook))
        .route("/v1/textbooks/:id/status", get(textbook_status))
        .route("/v1/textbooks/:id/regenerate", post(regenerate_textbook))
        .route("/v1/textbooks/:id", delete(delete_textbook))
        .route("/v1/activities", get(list_activities))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuidV7))
        // Material limit plus headroom for the JSON envelope.
        .layer(RequestBodyLimitLayer::new(
            lectern_core::defaults::MAX_INPUT_BYTES + 64 * 1024,
        ))
        .with_state(state)
}

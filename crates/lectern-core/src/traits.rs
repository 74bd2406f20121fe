//! Core traits for lectern abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// JOB STORE TRAITS
// =============================================================================

/// Persistence for one kind of generation job.
///
/// Implemented once per content type (document/note/textbook), each backed by
/// its own table. For kinds with a paired activity ledger row, every mutation
/// here mirrors the activity in the same transaction.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// The per-kind parameter shape carried on each row.
    type Params: Send + Sync;

    /// The content type this store persists.
    fn kind(&self) -> JobKind;

    /// Insert a new pending job (and its activity row, where applicable) as
    /// a single atomic unit. If any insert fails, nothing is persisted.
    async fn create(
        &self,
        owner_id: Uuid,
        params: Self::Params,
        input_keys: Vec<String>,
    ) -> Result<JobRecord<Self::Params>>;

    /// Fetch a job by id without owner scoping. Worker-side only.
    async fn fetch(&self, id: Uuid) -> Result<Option<JobRecord<Self::Params>>>;

    /// Fetch a job by id, scoped to its owner. Returns `None` both when the
    /// job does not exist and when it belongs to someone else.
    async fn get_owned(&self, id: Uuid, owner_id: Uuid)
        -> Result<Option<JobRecord<Self::Params>>>;

    /// Transition `pending → processing`, mirroring the activity row.
    ///
    /// Returns `false` when the job was not in `pending` (already claimed,
    /// or terminal) — the caller must not process it in that case. This is
    /// the single gate guaranteeing at most one active worker per job.
    async fn acquire(&self, id: Uuid) -> Result<bool>;

    /// Transition `processing → completed` in one transaction: status,
    /// `output_key` (written if not already set), and activity token counts.
    async fn complete(&self, id: Uuid, output_key: &str, usage: &TokenUsage) -> Result<()>;

    /// Transition to `failed` with an error message, mirroring the activity.
    async fn fail(&self, id: Uuid, message: &str) -> Result<()>;

    /// Reset an existing job back to `pending` for regeneration: clears the
    /// error message, stamps `regenerated_at`, and zeroes the activity's
    /// token counts. The `output_key` slot is kept so the next attempt
    /// overwrites in place.
    ///
    /// Rejects with [`crate::Error::Conflict`] while the job is `processing`.
    async fn reset_for_regeneration(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<JobRecord<Self::Params>>;

    /// Delete a job (owner-scoped) and its activity row, returning the
    /// deleted record so the caller can clean up associated objects.
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<JobRecord<Self::Params>>;
}

/// Read access to the activity usage ledger.
#[async_trait]
pub trait ActivityLedger: Send + Sync {
    /// List all activity rows for an owner, newest first.
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Activity>>;
}

// =============================================================================
// GENERATION TRAITS
// =============================================================================

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text for the given request. The full response is buffered
    /// before returning; callers never observe partial output.
    ///
    /// A backend that refuses the content on safety grounds returns
    /// [`crate::Error::ContentRejected`], distinguishable from generic
    /// failures.
    async fn generate(&self, req: GenerationRequest) -> Result<Completion>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Object safety: both traits are used behind Arc<dyn ...> throughout.
    #[test]
    fn test_traits_are_object_safe() {
        fn _store(_: &dyn JobStore<Params = NoteParams>) {}
        fn _client(_: &dyn GenerationClient) {}
    }
}

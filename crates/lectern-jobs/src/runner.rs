//! The background job state machine.
//!
//! One [`JobRunner`] per content type drives a job through
//! `pending → processing → {completed | failed}`:
//!
//! 1. Load the job row. Absent ⇒ integrity error, logged only — the
//!    submitter already got its response and cannot be notified.
//! 2. Acquire: transition `pending → processing`. The pending-only gate in
//!    the store makes a duplicate dispatch a logged no-op.
//! 3. Fetch and decode raw material from the object store.
//! 4. Generate. May take minutes; no database transaction is open across
//!    this await.
//! 5. Persist the buffered output to the object store — reusing the job's
//!    existing artifact key on regeneration, minting one otherwise.
//! 6. Commit: one transaction for status, output key, and token counts.
//! 7. Any error after step 2 ends in a best-effort `failed` write. Safety
//!    refusals store a user-readable message instead of raw error text.
//!
//! Transient database errors on any single transition are retried once;
//! generation and object-store failures go straight to `failed`.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use lectern_core::{Error, GenerationClient, JobRecord, JobStore, Result, TokenUsage};
use lectern_db::object_store::ObjectStore;
use lectern_db::retry::retry_transient;
use lectern_inference::usage::usage_or_estimate;

use crate::pipeline::{Pipeline, SourceMaterial};

/// User-readable message stored on a job when the generation backend
/// refuses the content. Raw backend error text is never persisted for
/// safety refusals.
pub const SAFETY_MESSAGE: &str =
    "The submitted material was declined by the content-safety check. \
     Please review it and try again.";

/// Drives the job lifecycle for one content type.
pub struct JobRunner<P> {
    store: Arc<dyn JobStore<Params = P>>,
    objects: Arc<dyn ObjectStore>,
    client: Arc<dyn GenerationClient>,
    pipeline: Arc<dyn Pipeline<Params = P>>,
}

impl<P: Send + Sync + 'static> JobRunner<P> {
    pub fn new(
        store: Arc<dyn JobStore<Params = P>>,
        objects: Arc<dyn ObjectStore>,
        client: Arc<dyn GenerationClient>,
        pipeline: Arc<dyn Pipeline<Params = P>>,
    ) -> Self {
        Self {
            store,
            objects,
            client,
            pipeline,
        }
    }

    /// The content type this runner serves.
    pub fn kind(&self) -> lectern_core::JobKind {
        self.pipeline.kind()
    }

    /// Execute one job to a terminal state.
    ///
    /// Never returns an error: every failure ends as a terminal status
    /// write (or a log line when even that is impossible). Callers poll
    /// the job row to observe the outcome.
    #[instrument(
        skip(self),
        fields(subsystem = "jobs", component = "runner", op = "run", job_kind = %self.pipeline.kind().as_str())
    )]
    pub async fn run(&self, job_id: Uuid) {
        let start = Instant::now();

        // 1. Load
        let job = match retry_transient(|| self.store.fetch(job_id)).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                // Integrity error: the submitter persisted this id before
                // dispatching, so the row should exist. No user is waiting
                // synchronously for this outcome.
                error!(job_id = %job_id, "Job missing at execution time");
                return;
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Failed to load job");
                return;
            }
        };

        // 2. Acquire
        match retry_transient(|| self.store.acquire(job_id)).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(job_id = %job_id, "Job is not pending, skipping");
                return;
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Failed to acquire job");
                return;
            }
        }

        // 3–6, with any failure routed to the terminal `failed` write.
        match self.process(&job).await {
            Ok(usage) => {
                info!(
                    job_id = %job_id,
                    tokens_sent = usage.prompt_tokens,
                    tokens_received = usage.output_tokens,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Job completed"
                );
            }
            Err(e) => {
                let message = match &e {
                    Error::ContentRejected(_) => SAFETY_MESSAGE.to_string(),
                    other => other.to_string(),
                };
                warn!(
                    job_id = %job_id,
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Job failed"
                );
                if let Err(fail_err) = retry_transient(|| self.store.fail(job_id, &message)).await
                {
                    error!(
                        job_id = %job_id,
                        error = %fail_err,
                        "Failed to record job failure"
                    );
                }
            }
        }
    }

    /// Steps 3–6: inputs, generation, artifact persistence, commit.
    async fn process(&self, job: &JobRecord<P>) -> Result<TokenUsage> {
        // 3. Fetch and decode inputs
        let mut inputs = Vec::with_capacity(job.input_keys.len());
        for key in &job.input_keys {
            let bytes = self.objects.get(key).await?;
            let text = String::from_utf8(bytes).map_err(|_| {
                Error::InvalidInput(format!("object {} is not valid UTF-8", key))
            })?;
            inputs.push(SourceMaterial {
                key: key.clone(),
                text,
            });
        }

        // 4. Generate. The response is fully buffered; partial output is
        // never persisted.
        let request = self.pipeline.build_request(job, &inputs);
        let prompt_chars =
            request.prompt.len() + request.system.as_deref().map_or(0, str::len);
        let completion = self.client.generate(request).await?;

        // 5. Persist the artifact. A regeneration reuses the job's existing
        // key so holders of the old key transparently see new content.
        let output_key = job
            .output_key
            .clone()
            .unwrap_or_else(|| self.pipeline.output_key(job));
        self.objects
            .put(
                &output_key,
                completion.text.as_bytes(),
                self.pipeline.output_content_type(),
            )
            .await?;

        // 6. Commit status + output key + token counts atomically.
        let usage = usage_or_estimate(
            completion.usage,
            self.pipeline.page_count_hint(job),
            prompt_chars,
            completion.text.len(),
        );
        retry_transient(|| self.store.complete(job.id, &output_key, &usage)).await?;

        Ok(usage)
    }

    /// Delete all objects associated with a job, logging failures.
    ///
    /// Fire-and-forget cleanup after row deletion: the row is the source
    /// of truth, so an orphaned blob is an acceptable, cleanable side
    /// effect and never fails the deletion itself.
    pub async fn cleanup_objects(&self, job: &JobRecord<P>) {
        let keys = job
            .input_keys
            .iter()
            .chain(job.output_key.as_ref());
        for key in keys {
            if let Err(e) = self.objects.delete(key).await {
                warn!(
                    job_id = %job.id,
                    object_key = %key,
                    error = %e,
                    "Failed to delete job object"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_message_is_user_readable() {
        // The stored text must not look like a raw exception.
        assert!(!SAFETY_MESSAGE.contains("Error"));
        assert!(!SAFETY_MESSAGE.contains("error:"));
        assert!(SAFETY_MESSAGE.ends_with("try again."));
    }
}

//! Application state and per-kind job services.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use lectern_core::{
    new_v7, ActivityLedger, DocumentParams, GenerationClient, JobKind, JobRecord, JobStore,
    NoteParams, Result, TextbookParams,
};
use lectern_db::object_store::ObjectStore;
use lectern_db::retry::retry_transient;
use lectern_db::Database;
use lectern_jobs::{
    Dispatcher, DocumentPipeline, JobRunner, NotePipeline, Pipeline, TextbookPipeline,
};

/// Everything one content type's handlers need: its store, its runner, the
/// shared object store, and the dispatcher.
#[derive(Clone)]
pub struct JobService<P> {
    pub kind: JobKind,
    pub store: Arc<dyn JobStore<Params = P>>,
    pub objects: Arc<dyn ObjectStore>,
    pub runner: Arc<JobRunner<P>>,
    pub dispatcher: Arc<dyn Dispatcher>,
}

impl<P: Clone + Send + Sync + 'static> JobService<P> {
    pub fn new(
        store: Arc<dyn JobStore<Params = P>>,
        objects: Arc<dyn ObjectStore>,
        client: Arc<dyn GenerationClient>,
        pipeline: Arc<dyn Pipeline<Params = P>>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        let kind = pipeline.kind();
        let runner = Arc::new(JobRunner::new(
            store.clone(),
            objects.clone(),
            client,
            pipeline,
        ));
        Self {
            kind,
            store,
            objects,
            runner,
            dispatcher,
        }
    }

    /// Submission: persist raw material, create the job row atomically,
    /// respond with the id, and hand the worker off without awaiting it.
    ///
    /// The material upload happens first so the job row never points at a
    /// missing object; if row creation then fails, the upload is rolled
    /// back best-effort and the worker is never dispatched.
    pub async fn submit(&self, owner_id: Uuid, material: Option<&str>, params: P) -> Result<Uuid> {
        let mut input_keys = Vec::new();
        if let Some(text) = material {
            let key = format!("inputs/{}/{}.txt", self.kind.as_str(), new_v7());
            self.objects.put(&key, text.as_bytes(), "text/plain").await?;
            input_keys.push(key);
        }

        let created = retry_transient(|| {
            self.store.create(owner_id, params.clone(), input_keys.clone())
        })
        .await;
        match created {
            Ok(job) => {
                self.runner.spawn(self.dispatcher.as_ref(), job.id);
                Ok(job.id)
            }
            Err(e) => {
                for key in &input_keys {
                    if let Err(del_err) = self.objects.delete(key).await {
                        warn!(
                            subsystem = "api",
                            object_key = %key,
                            error = %del_err,
                            "Failed to roll back uploaded input"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    /// Owner-scoped status lookup. Absent and foreign jobs are identical.
    pub async fn status(&self, id: Uuid, owner_id: Uuid) -> Result<JobRecord<P>> {
        retry_transient(|| self.store.get_owned(id, owner_id))
            .await?
            .ok_or_else(|| lectern_core::Error::NotFound(format!(
                "{} job {}",
                self.kind.as_str(),
                id
            )))
    }

    /// Reset to pending and dispatch a fresh generation attempt. Rejected
    /// with a conflict while the job is processing.
    pub async fn regenerate(&self, id: Uuid, owner_id: Uuid) -> Result<Uuid> {
        let job = retry_transient(|| self.store.reset_for_regeneration(id, owner_id)).await?;
        self.runner.spawn(self.dispatcher.as_ref(), job.id);
        Ok(job.id)
    }

    /// Delete the job row, then fire-and-forget blob cleanup. The row is
    /// the source of truth; cleanup failures never surface here.
    pub async fn remove(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        let job = retry_transient(|| self.store.delete(id, owner_id)).await?;
        let runner = self.runner.clone();
        self.dispatcher.dispatch(
            self.kind,
            id,
            Box::pin(async move {
                runner.cleanup_objects(&job).await;
            }),
        );
        Ok(())
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub documents: JobService<DocumentParams>,
    pub notes: JobService<NoteParams>,
    pub textbooks: JobService<TextbookParams>,
    pub activities: Arc<dyn ActivityLedger>,
}

impl AppState {
    /// Assemble state from the production database and collaborators.
    pub fn new(
        db: &Database,
        objects: Arc<dyn ObjectStore>,
        client: Arc<dyn GenerationClient>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            documents: JobService::new(
                Arc::new(db.documents.clone()),
                objects.clone(),
                client.clone(),
                Arc::new(DocumentPipeline::new()),
                dispatcher.clone(),
            ),
            notes: JobService::new(
                Arc::new(db.notes.clone()),
                objects.clone(),
                client.clone(),
                Arc::new(NotePipeline::new()),
                dispatcher.clone(),
            ),
            textbooks: JobService::new(
                Arc::new(db.textbooks.clone()),
                objects,
                client,
                Arc::new(TextbookPipeline::new()),
                dispatcher,
            ),
            activities: Arc::new(db.activities.clone()),
        }
    }

    /// Assemble state from pre-built services; used by tests to run the
    /// full router against in-memory stores.
    pub fn from_parts(
        documents: JobService<DocumentParams>,
        notes: JobService<NoteParams>,
        textbooks: JobService<TextbookParams>,
        activities: Arc<dyn ActivityLedger>,
    ) -> Self {
        Self {
            documents,
            notes,
            textbooks,
            activities,
        }
    }
}

//! # lectern-jobs
//!
//! Background generation worker for lectern.
//!
//! This crate provides:
//! - The generic job state machine (`pending → processing → terminal`)
//! - One prompt pipeline per content type (document, note, textbook)
//! - Fire-and-forget dispatch of detached worker tasks
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lectern_jobs::{Dispatcher, JobRunner, NotePipeline, TokioDispatcher};
//!
//! let runner = Arc::new(JobRunner::new(store, objects, client, Arc::new(NotePipeline::new())));
//! let dispatcher = TokioDispatcher::new();
//!
//! // Called from the submission handler after the job row is committed;
//! // the HTTP response is not delayed by generation.
//! runner.spawn(&dispatcher, job_id);
//! ```

pub mod dispatch;
pub mod pipeline;
pub mod pipelines;
pub mod runner;

// Re-export core types
pub use lectern_core::*;

pub use dispatch::{Dispatcher, TokioDispatcher};
pub use pipeline::{Pipeline, SourceMaterial};
pub use pipelines::{DocumentPipeline, NotePipeline, TextbookPipeline};
pub use runner::{JobRunner, SAFETY_MESSAGE};

use std::sync::Arc;
use uuid::Uuid;

impl<P: Send + Sync + 'static> JobRunner<P> {
    /// Hand this runner's work for `job_id` to a dispatcher without
    /// awaiting it.
    pub fn spawn(self: &Arc<Self>, dispatcher: &dyn Dispatcher, job_id: Uuid) {
        let runner = Arc::clone(self);
        let kind = runner.kind();
        dispatcher.dispatch(
            kind,
            job_id,
            Box::pin(async move {
                runner.run(job_id).await;
            }),
        );
    }
}

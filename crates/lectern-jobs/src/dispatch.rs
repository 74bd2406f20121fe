//! Fire-and-forget dispatch of background work.
//!
//! The submission handler must return its HTTP response without waiting on
//! generation, so the worker is handed off through this abstraction rather
//! than relying on any implicit post-response execution guarantee of the
//! host runtime. The in-process implementation detaches onto the tokio
//! runtime; deployments needing durability across process restarts can
//! substitute an external queue behind the same trait.

use futures::future::BoxFuture;
use tracing::debug;
use uuid::Uuid;

use lectern_core::JobKind;

/// Detached execution of a job's worker future.
pub trait Dispatcher: Send + Sync {
    /// Start `work` without awaiting it. Must not block the caller.
    fn dispatch(&self, kind: JobKind, job_id: Uuid, work: BoxFuture<'static, ()>);
}

/// In-process dispatcher backed by `tokio::spawn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDispatcher;

impl TokioDispatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Dispatcher for TokioDispatcher {
    fn dispatch(&self, kind: JobKind, job_id: Uuid, work: BoxFuture<'static, ()>) {
        debug!(
            subsystem = "jobs",
            component = "dispatch",
            job_kind = kind.as_str(),
            job_id = %job_id,
            "Dispatching background job"
        );
        tokio::spawn(work);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_tokio_dispatcher_runs_detached() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();

        let dispatcher = TokioDispatcher::new();
        dispatcher.dispatch(
            JobKind::Note,
            Uuid::new_v4(),
            Box::pin(async move {
                ran_clone.store(true, Ordering::SeqCst);
            }),
        );

        // dispatch() itself must return immediately; the work completes on
        // the runtime shortly after.
        for _ in 0..50 {
            if ran.load(Ordering::SeqCst) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("dispatched work never ran");
    }
}

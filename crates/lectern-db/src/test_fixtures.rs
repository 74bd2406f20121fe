//! In-memory test doubles for the job store.
//!
//! Always compiled so integration tests in other crates (worker, API) can
//! drive the full pipeline without a live PostgreSQL instance. The store
//! honors the same transition semantics as the SQL repositories, including
//! the pending-only acquire gate and job/activity lockstep, and records
//! every observed status transition for monotonicity assertions.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use lectern_core::{
    new_v7, Activity, ActivityLedger, Error, JobKind, JobRecord, JobStatus, JobStore, Result,
    TokenUsage,
};

struct MemoryState<P> {
    jobs: HashMap<Uuid, JobRecord<P>>,
    activities: HashMap<Uuid, Activity>,
    transitions: HashMap<Uuid, Vec<JobStatus>>,
}

/// In-memory [`JobStore`] implementation.
pub struct MemoryJobStore<P> {
    kind: JobKind,
    fail_activity_insert: bool,
    state: Mutex<MemoryState<P>>,
}

impl<P: Clone + Send + Sync> MemoryJobStore<P> {
    pub fn new(kind: JobKind) -> Self {
        Self {
            kind,
            fail_activity_insert: false,
            state: Mutex::new(MemoryState {
                jobs: HashMap::new(),
                activities: HashMap::new(),
                transitions: HashMap::new(),
            }),
        }
    }

    /// Make every activity insert fail, so `create` must leave no job row
    /// behind (submission atomicity). Only meaningful for kinds that carry
    /// an activity.
    pub fn with_activity_failure(mut self) -> Self {
        self.fail_activity_insert = true;
        self
    }

    /// All status values a job has held, in order, starting from creation.
    pub fn transitions(&self, id: Uuid) -> Vec<JobStatus> {
        self.state
            .lock()
            .unwrap()
            .transitions
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    /// The activity paired with a job, if any.
    pub fn activity(&self, job_id: Uuid) -> Option<Activity> {
        self.state.lock().unwrap().activities.get(&job_id).cloned()
    }

    /// Number of stored jobs.
    pub fn job_count(&self) -> usize {
        self.state.lock().unwrap().jobs.len()
    }
}

#[async_trait]
impl<P: Clone + Send + Sync + 'static> JobStore for MemoryJobStore<P> {
    type Params = P;

    fn kind(&self) -> JobKind {
        self.kind
    }

    async fn create(
        &self,
        owner_id: Uuid,
        params: P,
        input_keys: Vec<String>,
    ) -> Result<JobRecord<P>> {
        let now = Utc::now();
        let mut state = self.state.lock().unwrap();

        if self.kind.has_activity() && self.fail_activity_insert {
            // Simulated mid-transaction failure: nothing is persisted.
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }

        let job = JobRecord {
            id: new_v7(),
            owner_id,
            status: JobStatus::Pending,
            input_keys,
            output_key: None,
            params,
            error_message: None,
            created_at: now,
            regenerated_at: None,
        };

        if self.kind.has_activity() {
            state.activities.insert(
                job.id,
                Activity {
                    id: new_v7(),
                    job_kind: self.kind,
                    owner_id,
                    job_id: job.id,
                    status: JobStatus::Pending,
                    tokens_sent: 0,
                    tokens_received: 0,
                    created_at: now,
                    updated_at: now,
                },
            );
        }

        state.transitions.insert(job.id, vec![JobStatus::Pending]);
        state.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<JobRecord<P>>> {
        Ok(self.state.lock().unwrap().jobs.get(&id).cloned())
    }

    async fn get_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Option<JobRecord<P>>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .jobs
            .get(&id)
            .filter(|job| job.owner_id == owner_id)
            .cloned())
    }

    async fn acquire(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let Some(job) = state.jobs.get_mut(&id) else {
            return Ok(false);
        };
        if job.status != JobStatus::Pending {
            return Ok(false);
        }
        job.status = JobStatus::Processing;
        if let Some(activity) = state.activities.get_mut(&id) {
            activity.status = JobStatus::Processing;
            activity.updated_at = Utc::now();
        }
        state
            .transitions
            .entry(id)
            .or_default()
            .push(JobStatus::Processing);
        Ok(true)
    }

    async fn complete(&self, id: Uuid, output_key: &str, usage: &TokenUsage) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let job = state
            .jobs
            .get_mut(&id)
            .ok_or(Error::JobNotFound(id))?;
        if job.status != JobStatus::Processing {
            return Err(Error::Conflict(format!("job {} is not processing", id)));
        }
        job.status = JobStatus::Completed;
        job.output_key = Some(output_key.to_string());
        job.error_message = None;
        if let Some(activity) = state.activities.get_mut(&id) {
            activity.status = JobStatus::Completed;
            activity.tokens_sent = usage.prompt_tokens;
            activity.tokens_received = usage.output_tokens;
            activity.updated_at = Utc::now();
        }
        state
            .transitions
            .entry(id)
            .or_default()
            .push(JobStatus::Completed);
        Ok(())
    }

    async fn fail(&self, id: Uuid, message: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let job = state
            .jobs
            .get_mut(&id)
            .ok_or(Error::JobNotFound(id))?;
        if job.status != JobStatus::Processing {
            return Err(Error::Conflict(format!("job {} is not processing", id)));
        }
        job.status = JobStatus::Failed;
        job.error_message = Some(message.to_string());
        if let Some(activity) = state.activities.get_mut(&id) {
            activity.status = JobStatus::Failed;
            activity.updated_at = Utc::now();
        }
        state
            .transitions
            .entry(id)
            .or_default()
            .push(JobStatus::Failed);
        Ok(())
    }

    async fn reset_for_regeneration(&self, id: Uuid, owner_id: Uuid) -> Result<JobRecord<P>> {
        let now = Utc::now();
        let mut state = self.state.lock().unwrap();
        let job = state
            .jobs
            .get_mut(&id)
            .filter(|job| job.owner_id == owner_id)
            .ok_or_else(|| Error::NotFound(format!("job {}", id)))?;
        if job.status == JobStatus::Processing {
            return Err(Error::Conflict(
                "regeneration rejected while job is processing".into(),
            ));
        }
        job.status = JobStatus::Pending;
        job.error_message = None;
        job.regenerated_at = Some(now);
        let job = job.clone();
        if let Some(activity) = state.activities.get_mut(&id) {
            activity.status = JobStatus::Pending;
            activity.tokens_sent = 0;
            activity.tokens_received = 0;
            activity.updated_at = now;
        }
        state
            .transitions
            .entry(id)
            .or_default()
            .push(JobStatus::Pending);
        Ok(job)
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<JobRecord<P>> {
        let mut state = self.state.lock().unwrap();
        match state.jobs.get(&id) {
            Some(job) if job.owner_id == owner_id => {}
            _ => return Err(Error::NotFound(format!("job {}", id))),
        }
        let job = state
            .jobs
            .remove(&id)
            .ok_or_else(|| Error::NotFound(format!("job {}", id)))?;
        state.activities.remove(&id);
        Ok(job)
    }
}

#[async_trait]
impl<P: Clone + Send + Sync + 'static> ActivityLedger for MemoryJobStore<P> {
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Activity>> {
        let state = self.state.lock().unwrap();
        let mut activities: Vec<Activity> = state
            .activities
            .values()
            .filter(|activity| activity.owner_id == owner_id)
            .cloned()
            .collect();
        activities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(activities)
    }
}

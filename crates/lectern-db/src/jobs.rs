//! Job repository implementations.
//!
//! One table per content type (`document_job`, `note_job`, `textbook_job`),
//! all sharing the same column layout and transition SQL. The shared shape
//! lives in [`JobTable`]; the public repositories are thin kind-specific
//! wrappers implementing [`JobStore`].
//!
//! Every status transition is a short transaction: opened immediately
//! before the read-modify-write and committed right after, never spanning
//! a generation or object-store call.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use lectern_core::{
    new_v7, DocumentParams, Error, JobKind, JobRecord, JobStatus, JobStore, NoteParams, Result,
    TextbookParams, TokenUsage,
};

use crate::activities::PgActivityLedger;

const COLUMNS: &str =
    "id, owner_id, status, input_keys, output_key, params, error_message, created_at, regenerated_at";

/// Shared implementation for the three kind-specific job tables.
#[derive(Clone)]
struct JobTable {
    pool: PgPool,
    kind: JobKind,
    table: &'static str,
}

impl JobTable {
    fn job_from_row<P: DeserializeOwned>(&self, row: &PgRow) -> Result<JobRecord<P>> {
        let status_str: String = row.get("status");
        let status = JobStatus::parse(&status_str).ok_or_else(|| {
            Error::Internal(format!(
                "unknown job status '{}' in {}",
                status_str, self.table
            ))
        })?;
        let params: serde_json::Value = row.get("params");
        Ok(JobRecord {
            id: row.get("id"),
            owner_id: row.get("owner_id"),
            status,
            input_keys: row.get("input_keys"),
            output_key: row.get("output_key"),
            params: serde_json::from_value(params)?,
            error_message: row.get("error_message"),
            created_at: row.get("created_at"),
            regenerated_at: row.get("regenerated_at"),
        })
    }

    async fn create<P: Serialize + DeserializeOwned + Send + Sync>(
        &self,
        owner_id: Uuid,
        params: P,
        input_keys: Vec<String>,
    ) -> Result<JobRecord<P>> {
        let id = new_v7();
        let now = Utc::now();
        let params_json = serde_json::to_value(&params)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(&format!(
            "INSERT INTO {} (id, owner_id, status, input_keys, params, created_at)
             VALUES ($1, $2, 'pending', $3, $4, $5)",
            self.table
        ))
        .bind(id)
        .bind(owner_id)
        .bind(&input_keys)
        .bind(&params_json)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        // Paired activity row in the same transaction: if this insert
        // fails, the job insert rolls back with it.
        if self.kind.has_activity() {
            PgActivityLedger::insert_tx(&mut tx, self.kind, owner_id, id, now).await?;
        }

        tx.commit().await.map_err(Error::Database)?;

        Ok(JobRecord {
            id,
            owner_id,
            status: JobStatus::Pending,
            input_keys,
            output_key: None,
            params,
            error_message: None,
            created_at: now,
            regenerated_at: None,
        })
    }

    async fn fetch<P: DeserializeOwned>(&self, id: Uuid) -> Result<Option<JobRecord<P>>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE id = $1",
            COLUMNS, self.table
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(|r| self.job_from_row(r)).transpose()
    }

    async fn get_owned<P: DeserializeOwned>(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<JobRecord<P>>> {
        // Tenant isolation by predicate: a foreign job is indistinguishable
        // from an absent one.
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE id = $1 AND owner_id = $2",
            COLUMNS, self.table
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(|r| self.job_from_row(r)).transpose()
    }

    async fn acquire(&self, id: Uuid) -> Result<bool> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // The pending-only predicate is the single gate guaranteeing at
        // most one active worker per job.
        let result = sqlx::query(&format!(
            "UPDATE {} SET status = 'processing' WHERE id = $1 AND status = 'pending'",
            self.table
        ))
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let acquired = result.rows_affected() == 1;
        if acquired && self.kind.has_activity() {
            PgActivityLedger::mark_status_tx(&mut tx, self.kind, id, JobStatus::Processing, now)
                .await?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(acquired)
    }

    async fn complete(&self, id: Uuid, output_key: &str, usage: &TokenUsage) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let result = sqlx::query(&format!(
            "UPDATE {} SET status = 'completed', output_key = $2, error_message = NULL
             WHERE id = $1 AND status = 'processing'",
            self.table
        ))
        .bind(id)
        .bind(output_key)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::Conflict(format!(
                "{} job {} is not processing",
                self.kind.as_str(),
                id
            )));
        }

        if self.kind.has_activity() {
            PgActivityLedger::record_completion_tx(&mut tx, self.kind, id, usage, now).await?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn fail(&self, id: Uuid, message: &str) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let result = sqlx::query(&format!(
            "UPDATE {} SET status = 'failed', error_message = $2
             WHERE id = $1 AND status = 'processing'",
            self.table
        ))
        .bind(id)
        .bind(message)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::Conflict(format!(
                "{} job {} is not processing",
                self.kind.as_str(),
                id
            )));
        }

        if self.kind.has_activity() {
            PgActivityLedger::mark_status_tx(&mut tx, self.kind, id, JobStatus::Failed, now)
                .await?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn reset_for_regeneration<P: DeserializeOwned>(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<JobRecord<P>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE id = $1 AND owner_id = $2 FOR UPDATE",
            COLUMNS, self.table
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let row = row.ok_or_else(|| {
            Error::NotFound(format!("{} job {}", self.kind.as_str(), id))
        })?;
        let mut job: JobRecord<P> = self.job_from_row(&row)?;

        if job.status == JobStatus::Processing {
            return Err(Error::Conflict(
                "regeneration rejected while job is processing".into(),
            ));
        }

        sqlx::query(&format!(
            "UPDATE {} SET status = 'pending', error_message = NULL, regenerated_at = $2
             WHERE id = $1",
            self.table
        ))
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if self.kind.has_activity() {
            PgActivityLedger::reset_tx(&mut tx, self.kind, id, now).await?;
        }

        tx.commit().await.map_err(Error::Database)?;

        job.status = JobStatus::Pending;
        job.error_message = None;
        job.regenerated_at = Some(now);
        Ok(job)
    }

    async fn delete<P: DeserializeOwned>(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<JobRecord<P>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE id = $1 AND owner_id = $2 FOR UPDATE",
            COLUMNS, self.table
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let row = row.ok_or_else(|| {
            Error::NotFound(format!("{} job {}", self.kind.as_str(), id))
        })?;
        let job: JobRecord<P> = self.job_from_row(&row)?;

        sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.table))
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        if self.kind.has_activity() {
            PgActivityLedger::delete_tx(&mut tx, self.kind, id).await?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(job)
    }
}

macro_rules! pg_job_repository {
    ($name:ident, $params:ty, $kind:expr, $table:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone)]
        pub struct $name {
            inner: JobTable,
        }

        impl $name {
            /// Table backing this repository.
            pub const TABLE: &'static str = $table;

            /// Create a new repository with the given connection pool.
            pub fn new(pool: PgPool) -> Self {
                Self {
                    inner: JobTable {
                        pool,
                        kind: $kind,
                        table: $table,
                    },
                }
            }
        }

        #[async_trait]
        impl JobStore for $name {
            type Params = $params;

            fn kind(&self) -> JobKind {
                $kind
            }

            async fn create(
                &self,
                owner_id: Uuid,
                params: Self::Params,
                input_keys: Vec<String>,
            ) -> Result<JobRecord<Self::Params>> {
                self.inner.create(owner_id, params, input_keys).await
            }

            async fn fetch(&self, id: Uuid) -> Result<Option<JobRecord<Self::Params>>> {
                self.inner.fetch(id).await
            }

            async fn get_owned(
                &self,
                id: Uuid,
                owner_id: Uuid,
            ) -> Result<Option<JobRecord<Self::Params>>> {
                self.inner.get_owned(id, owner_id).await
            }

            async fn acquire(&self, id: Uuid) -> Result<bool> {
                self.inner.acquire(id).await
            }

            async fn complete(
                &self,
                id: Uuid,
                output_key: &str,
                usage: &TokenUsage,
            ) -> Result<()> {
                self.inner.complete(id, output_key, usage).await
            }

            async fn fail(&self, id: Uuid, message: &str) -> Result<()> {
                self.inner.fail(id, message).await
            }

            async fn reset_for_regeneration(
                &self,
                id: Uuid,
                owner_id: Uuid,
            ) -> Result<JobRecord<Self::Params>> {
                self.inner.reset_for_regeneration(id, owner_id).await
            }

            async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<JobRecord<Self::Params>> {
                self.inner.delete(id, owner_id).await
            }
        }
    };
}

pg_job_repository!(
    PgDocumentJobs,
    DocumentParams,
    JobKind::Document,
    "document_job",
    "PostgreSQL repository for document drafting jobs."
);

pg_job_repository!(
    PgNoteJobs,
    NoteParams,
    JobKind::Note,
    "note_job",
    "PostgreSQL repository for lecture-note jobs. Mutations mirror the paired activity row."
);

pg_job_repository!(
    PgTextbookJobs,
    TextbookParams,
    JobKind::Textbook,
    "textbook_job",
    "PostgreSQL repository for textbook explanation jobs. Mutations mirror the paired activity row."
);

//! Activity ledger repository.
//!
//! One activity row per note/textbook job, created inside the same
//! transaction as its job row and updated in lockstep with the job's
//! status transitions. Used for aggregate token-usage reporting.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use async_trait::async_trait;

use lectern_core::{
    new_v7, Activity, ActivityLedger, Error, JobKind, JobStatus, Result, TokenUsage,
};

const COLUMNS: &str =
    "id, job_kind, owner_id, job_id, status, tokens_sent, tokens_received, created_at, updated_at";

/// PostgreSQL implementation of the activity ledger.
#[derive(Clone)]
pub struct PgActivityLedger {
    pool: PgPool,
}

impl PgActivityLedger {
    /// Create a new ledger backed by the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn activity_from_row(row: &PgRow) -> Result<Activity> {
        let kind_str: String = row.get("job_kind");
        let status_str: String = row.get("status");
        Ok(Activity {
            id: row.get("id"),
            job_kind: JobKind::parse(&kind_str)
                .ok_or_else(|| Error::Internal(format!("unknown job kind '{}'", kind_str)))?,
            owner_id: row.get("owner_id"),
            job_id: row.get("job_id"),
            status: JobStatus::parse(&status_str)
                .ok_or_else(|| Error::Internal(format!("unknown job status '{}'", status_str)))?,
            tokens_sent: row.get("tokens_sent"),
            tokens_received: row.get("tokens_received"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    /// Fetch the activity paired with a job, if any.
    pub async fn get_for_job(&self, kind: JobKind, job_id: Uuid) -> Result<Option<Activity>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM activity WHERE job_kind = $1 AND job_id = $2",
            COLUMNS
        ))
        .bind(kind.as_str())
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(Self::activity_from_row).transpose()
    }

    // ------------------------------------------------------------------
    // Transaction-scoped helpers used by the job repositories. These run
    // inside the job's own transaction so job and activity always move
    // together.
    // ------------------------------------------------------------------

    /// Insert a pending activity paired with a freshly created job.
    pub async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        kind: JobKind,
        owner_id: Uuid,
        job_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Uuid> {
        let id = new_v7();
        sqlx::query(
            "INSERT INTO activity (id, job_kind, owner_id, job_id, status, tokens_sent, tokens_received, created_at, updated_at)
             VALUES ($1, $2, $3, $4, 'pending', 0, 0, $5, $5)",
        )
        .bind(id)
        .bind(kind.as_str())
        .bind(owner_id)
        .bind(job_id)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(id)
    }

    /// Mirror a job status transition onto its activity.
    pub async fn mark_status_tx(
        tx: &mut Transaction<'_, Postgres>,
        kind: JobKind,
        job_id: Uuid,
        status: JobStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE activity SET status = $3, updated_at = $4 WHERE job_kind = $1 AND job_id = $2",
        )
        .bind(kind.as_str())
        .bind(job_id)
        .bind(status.as_str())
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Record completion: status plus the attempt's token counts.
    pub async fn record_completion_tx(
        tx: &mut Transaction<'_, Postgres>,
        kind: JobKind,
        job_id: Uuid,
        usage: &TokenUsage,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE activity
             SET status = 'completed', tokens_sent = $3, tokens_received = $4, updated_at = $5
             WHERE job_kind = $1 AND job_id = $2",
        )
        .bind(kind.as_str())
        .bind(job_id)
        .bind(usage.prompt_tokens)
        .bind(usage.output_tokens)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Reset an activity alongside a regeneration request.
    pub async fn reset_tx(
        tx: &mut Transaction<'_, Postgres>,
        kind: JobKind,
        job_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE activity
             SET status = 'pending', tokens_sent = 0, tokens_received = 0, updated_at = $3
             WHERE job_kind = $1 AND job_id = $2",
        )
        .bind(kind.as_str())
        .bind(job_id)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Delete the activity paired with a deleted job.
    pub async fn delete_tx(
        tx: &mut Transaction<'_, Postgres>,
        kind: JobKind,
        job_id: Uuid,
    ) -> Result<()> {
        sqlx::query("DELETE FROM activity WHERE job_kind = $1 AND job_id = $2")
            .bind(kind.as_str())
            .bind(job_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl ActivityLedger for PgActivityLedger {
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Activity>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM activity WHERE owner_id = $1 ORDER BY created_at DESC",
            COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(Self::activity_from_row).collect()
    }
}

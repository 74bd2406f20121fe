//! # lectern-db
//!
//! PostgreSQL database layer and object storage for lectern.
//!
//! This crate provides:
//! - Connection pool management
//! - Job repositories (one table per content type) implementing
//!   [`lectern_core::JobStore`]
//! - The activity usage ledger, kept in lockstep with its job row
//! - The object-store adapter (filesystem and in-memory backends)
//! - The transient-error retry helper
//!
//! ## Example
//!
//! ```rust,ignore
//! use lectern_db::Database;
//! use lectern_core::{JobStore, NoteParams};
//!
//! let db = Database::connect("postgres://localhost/lectern").await?;
//! let job = db
//!     .notes
//!     .create(owner_id, NoteParams::default(), vec!["inputs/t.txt".into()])
//!     .await?;
//! ```

pub mod activities;
pub mod jobs;
pub mod object_store;
pub mod pool;
pub mod retry;

// In-memory doubles for integration tests in dependent crates.
// Always compiled so tests in other crates can use them without a live
// database.
pub mod test_fixtures;

// Re-export core types
pub use lectern_core::*;

pub use activities::PgActivityLedger;
pub use jobs::{PgDocumentJobs, PgNoteJobs, PgTextbookJobs};
pub use object_store::{normalize_key, FsObjectStore, MemoryObjectStore, ObjectStore};
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use retry::retry_transient;
pub use test_fixtures::MemoryJobStore;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::PgPool,
    /// Document drafting job repository.
    pub documents: PgDocumentJobs,
    /// Lecture-note job repository.
    pub notes: PgNoteJobs,
    /// Textbook explanation job repository.
    pub textbooks: PgTextbookJobs,
    /// Activity usage ledger.
    pub activities: PgActivityLedger,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            documents: PgDocumentJobs::new(pool.clone()),
            notes: PgNoteJobs::new(pool.clone()),
            textbooks: PgTextbookJobs::new(pool.clone()),
            activities: PgActivityLedger::new(pool.clone()),
            pool,
        }
    }

    /// Connect with default pool configuration.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Run embedded schema migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Internal(format!("migration failed: {}", e)))
    }
}

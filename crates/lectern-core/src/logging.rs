//! Structured logging schema and field name constants for lectern.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → job → sub-calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "inference", "jobs", "storage"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "runner", "pool", "object_store", "openai_compat"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "submit", "generate", "acquire", "complete"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Job UUID being processed.
pub const JOB_ID: &str = "job_id";

/// Job kind ("document", "note", "textbook").
pub const JOB_KIND: &str = "job_kind";

/// Owning user UUID.
pub const OWNER_ID: &str = "owner_id";

/// Object-store key being read or written.
pub const OBJECT_KEY: &str = "object_key";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Prompt tokens consumed by a generation call.
pub const TOKENS_SENT: &str = "tokens_sent";

/// Output tokens produced by a generation call.
pub const TOKENS_RECEIVED: &str = "tokens_received";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for generation.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

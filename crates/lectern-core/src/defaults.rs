//! Default values and tuning constants shared across lectern crates.

/// Default OpenAI-compatible generation endpoint (Ollama's compat API).
pub const GEN_BASE_URL: &str = "http://localhost:11434/v1";

/// Default generation model.
pub const GEN_MODEL: &str = "llama3.1:8b";

/// Timeout for generation requests (seconds). Generation may take tens of
/// seconds to minutes; the job worker tolerates the full window.
pub const GEN_TIMEOUT_SECS: u64 = 300;

/// Default sampling temperature.
pub const GEN_TEMPERATURE: f32 = 0.7;

/// Default nucleus sampling cutoff.
pub const GEN_TOP_P: f32 = 0.9;

/// Output token budget for document drafting jobs.
pub const DOCUMENT_MAX_OUTPUT_TOKENS: u32 = 4096;

/// Output token budget for note formatting jobs.
pub const NOTE_MAX_OUTPUT_TOKENS: u32 = 2048;

/// Output token budget for textbook explanation jobs.
pub const TEXTBOOK_MAX_OUTPUT_TOKENS: u32 = 8192;

/// Average prompt tokens per page of book text, used to estimate input
/// usage when the backend reports none. An approximation, not exact.
pub const AVG_TOKENS_PER_PAGE: i64 = 258;

/// Characters-per-token divisor for estimated token counts.
pub const EST_CHARS_PER_TOKEN: i64 = 4;

/// Maximum accepted size of submitted raw material (bytes).
pub const MAX_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Suggested client polling interval for job status (seconds).
pub const STATUS_POLL_INTERVAL_SECS: u64 = 5;

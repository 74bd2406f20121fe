//! Core data models for lectern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a generation job.
///
/// Transitions only move forward: `Pending → Processing → {Completed | Failed}`.
/// A regeneration request resets an existing row back to `Pending`; there is
/// no other path out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// String form stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse the database string form. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Whether no further transitions occur without a new regeneration request.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Content type of a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Free-form document drafted from a topic and instructions.
    Document,
    /// Formatted lecture notes built from a transcript.
    Note,
    /// Chapter-by-chapter explanation of submitted book text.
    Textbook,
}

impl JobKind {
    /// String form stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Document => "document",
            JobKind::Note => "note",
            JobKind::Textbook => "textbook",
        }
    }

    /// Parse the database string form. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "document" => Some(JobKind::Document),
            "note" => Some(JobKind::Note),
            "textbook" => Some(JobKind::Textbook),
            _ => None,
        }
    }

    /// Whether jobs of this kind carry a paired activity ledger row.
    pub fn has_activity(&self) -> bool {
        matches!(self, JobKind::Note | JobKind::Textbook)
    }
}

/// A persisted generation job, generic over the per-kind parameter shape.
///
/// One row per job in a kind-specific table. The worker is the only writer
/// of `status`, `output_key`, and token counts after creation; every read on
/// behalf of a user is scoped by `owner_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord<P> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub status: JobStatus,
    /// Object-store keys of the raw submitted material.
    pub input_keys: Vec<String>,
    /// Object-store key of the generated artifact. `None` until the first
    /// successful generation; reused (overwritten in place) on regeneration.
    pub output_key: Option<String>,
    /// Generation configuration captured at submission time. Immutable once
    /// the job starts processing.
    pub params: P,
    /// Populated only when `status` is `Failed`.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Stamped on each regeneration request.
    pub regenerated_at: Option<DateTime<Utc>>,
}

/// Parameters for document drafting jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentParams {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

/// Parameters for lecture-note formatting jobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteParams {
    /// Ask the model to open each section with a detected heading.
    #[serde(default)]
    pub detect_heading: bool,
    /// Append a closing summary section.
    #[serde(default)]
    pub include_summary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
}

/// How thoroughly textbook content should be explained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplainLevel {
    Concise,
    #[default]
    Standard,
    Thorough,
}

/// Parameters for textbook explanation jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextbookParams {
    pub title: String,
    pub page_count: i32,
    #[serde(default)]
    pub explain_level: ExplainLevel,
}

/// Token consumption reported by a generation backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: i64, output_tokens: i64) -> Self {
        Self {
            prompt_tokens,
            output_tokens,
            total_tokens: prompt_tokens + output_tokens,
        }
    }
}

/// A single generation request sent to a backend.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

/// A completed generation: the full buffered text plus usage metadata when
/// the backend reports it.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Usage-ledger record paired with note and textbook jobs.
///
/// Created in the same transaction as its job row and updated in lockstep
/// with the job's status transitions. Token counts are written once, when
/// the job completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub job_kind: JobKind,
    pub owner_id: Uuid,
    pub job_id: Uuid,
    pub status: JobStatus,
    pub tokens_sent: i64,
    pub tokens_received: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_round_trip() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_job_status_parse_unknown() {
        assert_eq!(JobStatus::parse("cancelled"), None);
        assert_eq!(JobStatus::parse(""), None);
        assert_eq!(JobStatus::parse("PENDING"), None);
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_job_status_serde_snake_case() {
        let json = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        let back: JobStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(back, JobStatus::Failed);
    }

    #[test]
    fn test_job_kind_round_trip() {
        for kind in [JobKind::Document, JobKind::Note, JobKind::Textbook] {
            assert_eq!(JobKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_job_kind_strings_are_unique() {
        let strings = [
            JobKind::Document.as_str(),
            JobKind::Note.as_str(),
            JobKind::Textbook.as_str(),
        ];
        let mut unique = strings.to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(strings.len(), unique.len());
    }

    #[test]
    fn test_job_kind_activity_pairing() {
        assert!(!JobKind::Document.has_activity());
        assert!(JobKind::Note.has_activity());
        assert!(JobKind::Textbook.has_activity());
    }

    #[test]
    fn test_token_usage_new_sums_total() {
        let usage = TokenUsage::new(120, 30);
        assert_eq!(usage.prompt_tokens, 120);
        assert_eq!(usage.output_tokens, 30);
        assert_eq!(usage.total_tokens, 150);
    }

    #[test]
    fn test_note_params_defaults() {
        let params: NoteParams = serde_json::from_str("{}").unwrap();
        assert!(!params.detect_heading);
        assert!(!params.include_summary);
        assert!(params.course.is_none());
        assert!(params.instructor.is_none());
    }

    #[test]
    fn test_explain_level_default() {
        assert_eq!(ExplainLevel::default(), ExplainLevel::Standard);
        let level: ExplainLevel = serde_json::from_str("\"thorough\"").unwrap();
        assert_eq!(level, ExplainLevel::Thorough);
    }

    #[test]
    fn test_textbook_params_serde() {
        let params = TextbookParams {
            title: "Linear Algebra".into(),
            page_count: 320,
            explain_level: ExplainLevel::Concise,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["page_count"], 320);
        assert_eq!(json["explain_level"], "concise");

        let back: TextbookParams = serde_json::from_value(json).unwrap();
        assert_eq!(back.title, "Linear Algebra");
        assert_eq!(back.explain_level, ExplainLevel::Concise);
    }

    #[test]
    fn test_job_record_serde_round_trip() {
        let job = JobRecord {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            status: JobStatus::Pending,
            input_keys: vec!["inputs/note/abc.txt".into()],
            output_key: None,
            params: NoteParams {
                detect_heading: true,
                include_summary: false,
                course: Some("CS 101".into()),
                instructor: None,
            },
            error_message: None,
            created_at: Utc::now(),
            regenerated_at: None,
        };

        let json = serde_json::to_string(&job).unwrap();
        let back: JobRecord<NoteParams> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, job.id);
        assert_eq!(back.status, JobStatus::Pending);
        assert!(back.params.detect_heading);
        assert_eq!(back.params.course.as_deref(), Some("CS 101"));
    }
}

//! Per-content-type generation pipelines.
//!
//! A pipeline owns what varies between the three content types: prompt
//! assembly, generation options, and artifact naming. The shared lifecycle
//! (load, acquire, generate, persist, commit) lives in
//! [`crate::runner::JobRunner`].

use lectern_core::{GenerationRequest, JobKind, JobRecord};

/// Raw material fetched from the object store and decoded for prompting.
#[derive(Debug, Clone)]
pub struct SourceMaterial {
    /// Object-store key the material was read from.
    pub key: String,
    /// Decoded text content.
    pub text: String,
}

/// Prompt assembly and artifact naming for one content type.
pub trait Pipeline: Send + Sync {
    /// The per-kind parameter shape.
    type Params: Send + Sync;

    /// The content type this pipeline serves.
    fn kind(&self) -> JobKind;

    /// Assemble the full generation request from the job's parameters and
    /// its decoded raw material.
    fn build_request(
        &self,
        job: &JobRecord<Self::Params>,
        inputs: &[SourceMaterial],
    ) -> GenerationRequest;

    /// Page count of the source material, when the parameters carry one.
    /// Used for token estimation fallbacks.
    fn page_count_hint(&self, _job: &JobRecord<Self::Params>) -> Option<i32> {
        None
    }

    /// Content type recorded with the generated artifact.
    fn output_content_type(&self) -> &'static str {
        "text/markdown"
    }

    /// Mint the artifact key for a job's first generation. Deterministic in
    /// the job id, so every later regeneration overwrites the same object.
    fn output_key(&self, job: &JobRecord<Self::Params>) -> String {
        format!("outputs/{}/{}.md", self.kind().as_str(), job.id)
    }
}

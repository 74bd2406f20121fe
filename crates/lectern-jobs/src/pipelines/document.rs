//! Document drafting pipeline.

use lectern_core::{defaults, DocumentParams, GenerationRequest, JobKind, JobRecord};

use crate::pipeline::{Pipeline, SourceMaterial};

/// Drafts a free-form document from a topic, optional instructions, and
/// optional inline source material.
#[derive(Debug, Default)]
pub struct DocumentPipeline;

impl DocumentPipeline {
    pub fn new() -> Self {
        Self
    }
}

impl Pipeline for DocumentPipeline {
    type Params = DocumentParams;

    fn kind(&self) -> JobKind {
        JobKind::Document
    }

    fn build_request(
        &self,
        job: &JobRecord<DocumentParams>,
        inputs: &[SourceMaterial],
    ) -> GenerationRequest {
        let params = &job.params;
        let mut prompt = format!("Draft a complete document on the topic: {}\n", params.topic);
        if let Some(instructions) = params.instructions.as_deref() {
            prompt.push_str(&format!("Follow these instructions: {}\n", instructions));
        }
        if let Some(tone) = params.tone.as_deref() {
            prompt.push_str(&format!("Write in a {} tone.\n", tone));
        }
        for material in inputs {
            prompt.push_str("\nSource material:\n");
            prompt.push_str(&material.text);
            prompt.push('\n');
        }

        GenerationRequest {
            system: Some(
                "You draft well-structured markdown documents from a topic and source material."
                    .into(),
            ),
            prompt,
            max_output_tokens: Some(defaults::DOCUMENT_MAX_OUTPUT_TOKENS),
            temperature: Some(defaults::GEN_TEMPERATURE),
            top_p: Some(defaults::GEN_TOP_P),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lectern_core::JobStatus;
    use uuid::Uuid;

    fn job(params: DocumentParams) -> JobRecord<DocumentParams> {
        JobRecord {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            status: JobStatus::Pending,
            input_keys: vec![],
            output_key: None,
            params,
            error_message: None,
            created_at: Utc::now(),
            regenerated_at: None,
        }
    }

    #[test]
    fn test_prompt_includes_topic_and_options() {
        let pipeline = DocumentPipeline::new();
        let job = job(DocumentParams {
            topic: "Photosynthesis".into(),
            instructions: Some("Focus on the light reactions".into()),
            tone: Some("formal".into()),
        });

        let request = pipeline.build_request(&job, &[]);
        assert!(request.prompt.contains("Photosynthesis"));
        assert!(request.prompt.contains("light reactions"));
        assert!(request.prompt.contains("formal tone"));
        assert_eq!(
            request.max_output_tokens,
            Some(defaults::DOCUMENT_MAX_OUTPUT_TOKENS)
        );
    }

    #[test]
    fn test_prompt_appends_source_material() {
        let pipeline = DocumentPipeline::new();
        let job = job(DocumentParams {
            topic: "Topic".into(),
            instructions: None,
            tone: None,
        });
        let inputs = [SourceMaterial {
            key: "inputs/document/x.txt".into(),
            text: "reference text here".into(),
        }];

        let request = pipeline.build_request(&job, &inputs);
        assert!(request.prompt.contains("reference text here"));
    }

    #[test]
    fn test_output_key_is_deterministic_per_job() {
        let pipeline = DocumentPipeline::new();
        let job = job(DocumentParams {
            topic: "T".into(),
            instructions: None,
            tone: None,
        });
        let key = pipeline.output_key(&job);
        assert_eq!(key, format!("outputs/document/{}.md", job.id));
        assert_eq!(pipeline.output_key(&job), key);
    }
}

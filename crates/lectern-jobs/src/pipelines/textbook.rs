//! Textbook explanation pipeline.

use lectern_core::{
    defaults, ExplainLevel, GenerationRequest, JobKind, JobRecord, TextbookParams,
};

use crate::pipeline::{Pipeline, SourceMaterial};

/// Produces a chapter-by-chapter explanation of submitted book text.
#[derive(Debug, Default)]
pub struct TextbookPipeline;

impl TextbookPipeline {
    pub fn new() -> Self {
        Self
    }

    fn level_instruction(level: ExplainLevel) -> &'static str {
        match level {
            ExplainLevel::Concise => "Keep each explanation brief, a paragraph per concept.",
            ExplainLevel::Standard => "Explain each concept in moderate depth with one example.",
            ExplainLevel::Thorough => {
                "Explain each concept in depth with worked examples and common pitfalls."
            }
        }
    }
}

impl Pipeline for TextbookPipeline {
    type Params = TextbookParams;

    fn kind(&self) -> JobKind {
        JobKind::Textbook
    }

    fn build_request(
        &self,
        job: &JobRecord<TextbookParams>,
        inputs: &[SourceMaterial],
    ) -> GenerationRequest {
        let params = &job.params;
        let mut prompt = format!(
            "Explain the textbook \"{}\" section by section, in reading order.\n{}\n",
            params.title,
            Self::level_instruction(params.explain_level),
        );
        for material in inputs {
            prompt.push_str("\nBook text:\n");
            prompt.push_str(&material.text);
            prompt.push('\n');
        }

        GenerationRequest {
            system: Some(
                "You explain textbook material for students, preserving the book's structure."
                    .into(),
            ),
            prompt,
            max_output_tokens: Some(defaults::TEXTBOOK_MAX_OUTPUT_TOKENS),
            temperature: Some(defaults::GEN_TEMPERATURE),
            top_p: Some(defaults::GEN_TOP_P),
        }
    }

    fn page_count_hint(&self, job: &JobRecord<TextbookParams>) -> Option<i32> {
        Some(job.params.page_count)
    }
}

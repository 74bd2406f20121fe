//! Lecture-note formatting pipeline.

use lectern_core::{defaults, GenerationRequest, JobKind, JobRecord, NoteParams};

use crate::pipeline::{Pipeline, SourceMaterial};

/// Turns a lecture transcript into formatted markdown notes.
#[derive(Debug, Default)]
pub struct NotePipeline;

impl NotePipeline {
    pub fn new() -> Self {
        Self
    }
}

impl Pipeline for NotePipeline {
    type Params = NoteParams;

    fn kind(&self) -> JobKind {
        JobKind::Note
    }

    fn build_request(
        &self,
        job: &JobRecord<NoteParams>,
        inputs: &[SourceMaterial],
    ) -> GenerationRequest {
        let params = &job.params;
        let mut prompt = String::from("Convert the following lecture transcript into clean, organized markdown notes.\n");
        if params.detect_heading {
            prompt.push_str(
                "Detect the lecture's topic and begin the notes with a heading; open each section with a heading of its own.\n",
            );
        }
        if params.include_summary {
            prompt.push_str("Close with a 'Summary' section of the key points.\n");
        }
        if let Some(course) = params.course.as_deref() {
            prompt.push_str(&format!("Course: {}\n", course));
        }
        if let Some(instructor) = params.instructor.as_deref() {
            prompt.push_str(&format!("Instructor: {}\n", instructor));
        }
        for material in inputs {
            prompt.push_str("\nTranscript:\n");
            prompt.push_str(&material.text);
            prompt.push('\n');
        }

        GenerationRequest {
            system: Some("You format lecture transcripts into study notes.".into()),
            prompt,
            max_output_tokens: Some(defaults::NOTE_MAX_OUTPUT_TOKENS),
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

    fn job(params: NoteParams) -> JobRecord<NoteParams> {
        JobRecord {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            status: JobStatus::Pending,
            input_keys: vec!["inputs/note/t.txt".into()],
            output_key: None,
            params,
            error_message: None,
            created_at: Utc::now(),
            regenerated_at: None,
        }
    }

    fn transcript() -> Vec<SourceMaterial> {
        vec![SourceMaterial {
            key: "inputs/note/t.txt".into(),
            text: "Hello world.".into(),
        }]
    }

    #[test]
    fn test_heading_flag_changes_prompt() {
        let pipeline = NotePipeline::new();

        let with = pipeline.build_request(
            &job(NoteParams {
                detect_heading: true,
                include_summary: false,
                course: None,
                instructor: None,
            }),
            &transcript(),
        );
        assert!(with.prompt.contains("begin the notes with a heading"));

        let without = pipeline.build_request(
            &job(NoteParams {
                detect_heading: false,
                include_summary: false,
                course: None,
                instructor: None,
            }),
            &transcript(),
        );
        assert!(!without.prompt.contains("begin the notes with a heading"));
    }

    #[test]
    fn test_summary_flag_changes_prompt() {
        let pipeline = NotePipeline::new();
        let request = pipeline.build_request(
            &job(NoteParams {
                detect_heading: false,
                include_summary: true,
                course: None,
                instructor: None,
            }),
            &transcript(),
        );
        assert!(request.prompt.contains("'Summary' section"));
    }

    #[test]
    fn test_course_and_instructor_context() {
        let pipeline = NotePipeline::new();
        let request = pipeline.build_request(
            &job(NoteParams {
                detect_heading: false,
                include_summary: false,
                course: Some("BIO 201".into()),
                instructor: Some("Dr. Okafor".into()),
            }),
            &transcript(),
        );
        assert!(request.prompt.contains("Course: BIO 201"));
        assert!(request.prompt.contains("Instructor: Dr. Okafor"));
    }

    #[test]
    fn test_transcript_text_included() {
        let pipeline = NotePipeline::new();
        let request = pipeline.build_request(
            &job(NoteParams {
                detect_heading: true,
                include_summary: false,
                course: None,
                instructor: None,
            }),
            &transcript(),
        );
        assert!(request.prompt.contains("Hello world."));
        assert_eq!(
            request.max_output_tokens,
            Some(defaults::NOTE_MAX_OUTPUT_TOKENS)
        );
    }
}

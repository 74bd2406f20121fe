//! The three content-type pipelines.

pub mod document;
pub mod note;
pub mod textbook;

pub use document::DocumentPipeline;
pub use note::NotePipeline;
pub use textbook::TextbookPipeline;

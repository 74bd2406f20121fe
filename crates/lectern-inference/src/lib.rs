//! # lectern-inference
//!
//! Text-generation backend abstraction for lectern.
//!
//! This crate provides:
//! - An OpenAI-compatible chat-completions backend (default)
//! - Verbatim usage-metadata capture with estimation fallbacks
//! - Content-safety rejection classification
//! - A mock backend for tests (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use lectern_inference::OpenAiCompatClient;
//! use lectern_core::{GenerationClient, GenerationRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = OpenAiCompatClient::from_env().unwrap();
//!     let completion = client
//!         .generate(GenerationRequest {
//!             prompt: "Summarize the water cycle.".into(),
//!             ..Default::default()
//!         })
//!         .await
//!         .unwrap();
//!     println!("{}", completion.text);
//! }
//! ```

pub mod openai;
pub mod usage;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use lectern_core::*;

pub use openai::OpenAiCompatClient;
pub use usage::{estimate_prompt_tokens, estimate_tokens, usage_or_estimate};

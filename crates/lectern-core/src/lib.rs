//! # lectern-core
//!
//! Core types, traits, and abstractions for lectern.
//!
//! This crate provides:
//! - The job lifecycle model (`JobStatus`, `JobKind`, `JobRecord`)
//! - Per-kind generation parameter shapes
//! - The activity usage-ledger model
//! - Repository and generation-backend traits
//! - The shared error type and structured-logging field constants

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::new_v7;

//! Core domain types for Factory CI/CD pipeline definitions.
//!
//! This crate contains:
//! - Pipeline definitions with their path/branch filters
//! - Stage definitions (ordering and dependency metadata)
//! - Stages and their run blocks
//! - Name validation shared by the decoders

pub mod error;
pub mod pipeline;
pub mod stage;

pub use error::{Error, Result};
pub use pipeline::{Filter, FilterRule, Pipeline, StageDefinition};
pub use stage::{RunBlock, Stage};

/// Check that a block label can be used as a pipeline or stage name.
pub fn validate_name(kind: &'static str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

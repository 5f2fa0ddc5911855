//! Error types for Factory domain types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid {kind} name: {name:?}")]
    InvalidName { kind: &'static str, name: String },
}

pub type Result<T> = std::result::Result<T, Error>;

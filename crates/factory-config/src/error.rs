//! Configuration decoding errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HCL parse error: {0}")]
    Parse(#[from] hcl::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("evaluation failed: {0}")]
    Eval(String),

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("duplicate definition: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Core(#[from] factory_core::Error),
}

impl From<hcl::eval::Error> for ConfigError {
    fn from(err: hcl::eval::Error) -> Self {
        ConfigError::Eval(err.to_string())
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

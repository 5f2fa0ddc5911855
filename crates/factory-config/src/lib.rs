//! HCL configuration decoding for Factory CI/CD.
//!
//! This crate handles:
//! - Decoding `pipeline`, `variables` and `stage` blocks into the
//!   `factory-core` model
//! - Global and per-stage variable scopes and expression resolution
//! - Diagnostics that accumulate across a whole file
//! - Discovering and loading configuration files from disk

pub mod diagnostics;
pub mod error;
pub mod file;
pub mod filter;
pub mod parser;
pub mod pipeline;
pub mod schema;
pub mod stage;
pub mod value;
pub mod variables;

pub use diagnostics::{Diagnostic, Diagnostics, Severity, Subject};
pub use error::{ConfigError, ConfigResult};
pub use file::{File, decode_file};
pub use parser::{
    DEFAULT_CONFIG_DIR, LoadedFile, Parser, ParserOptions, list_config_files,
    parse_factory_directory, parse_source,
};
pub use variables::{Scope, Variables};

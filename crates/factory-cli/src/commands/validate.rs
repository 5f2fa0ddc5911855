//! `factory validate`: check configuration without executing anything.

use anyhow::Result;
use factory_config::{Diagnostics, LoadedFile, Parser, ParserOptions};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::OutputFormat;

#[derive(Serialize)]
struct Report<'a> {
    valid: bool,
    files: &'a [LoadedFile],
    diagnostics: &'a Diagnostics,
}

/// Validate every configuration file at `path`. Returns whether the
/// configuration is free of errors.
pub fn validate(path: &Path, recursive: bool, format: OutputFormat) -> Result<bool> {
    let dir = std::path::absolute(path)?;
    debug!(path = %dir.display(), recursive = recursive, "Validating configuration");

    let parser = Parser::new(ParserOptions::default().recursive(recursive));
    let (files, diags) = parser.parse_directory(&dir);
    let valid = !diags.has_errors();

    match format {
        OutputFormat::Json => {
            let report = Report {
                valid,
                files: &files,
                diagnostics: &diags,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            super::print_diagnostics(&diags);
            if valid {
                println!("Success! {} configuration file(s) are valid.", files.len());
            } else {
                println!(
                    "Configuration is invalid: {} error(s) found.",
                    diags.errors().count()
                );
            }
        }
    }

    Ok(valid)
}

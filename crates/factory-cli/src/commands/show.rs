//! `factory show`: print the decoded configuration tree.

use anyhow::Result;
use factory_config::{Parser, ParserOptions};
use std::path::Path;

pub fn show(path: &Path, recursive: bool) -> Result<bool> {
    let parser = Parser::new(ParserOptions::default().recursive(recursive));
    let (files, diags) = parser.parse_directory(path);

    for loaded in &files {
        println!("# {}", loaded.path.display());
        println!("{}", loaded.file);
    }
    super::print_diagnostics(&diags);

    Ok(!diags.has_errors())
}

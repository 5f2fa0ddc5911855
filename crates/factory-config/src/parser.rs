//! Loading configuration files from disk.

use hcl::Body;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::file::{File, decode_file};
use crate::{ConfigError, Diagnostic, Diagnostics};

/// Directory searched by [`parse_factory_directory`].
pub const DEFAULT_CONFIG_DIR: &str = ".factory";

/// Options controlling file discovery.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Walk into subdirectories.
    pub recursive: bool,
    /// Extension (without the dot) of configuration files.
    pub extension: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            extension: "hcl".to_string(),
        }
    }
}

impl ParserOptions {
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// A decoded file together with the path it was read from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub file: File,
}

/// Reads and decodes configuration files.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParserOptions,
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Read and parse one file. `None` means nothing could be decoded and
    /// the diagnostics say why.
    pub fn load_hcl_file(&self, path: &Path) -> (Option<Body>, Diagnostics) {
        let src = match fs::read_to_string(path) {
            Ok(src) => src,
            Err(err) => {
                let diag = Diagnostic::from_error("Failed to read file", &ConfigError::from(err))
                    .with_filename(path);
                return (None, diag.into());
            }
        };

        match hcl::parse(&src) {
            Ok(body) => (Some(body), Diagnostics::new()),
            Err(err) => {
                let diag = syntax_error(err).with_filename(path);
                (None, diag.into())
            }
        }
    }

    /// Read, parse and decode one file. Every diagnostic names `path`.
    pub fn load_config_file(&self, path: &Path) -> (Option<LoadedFile>, Diagnostics) {
        debug!(path = %path.display(), "Loading config file");
        let (body, mut diags) = self.load_hcl_file(path);
        let Some(body) = body else {
            return (None, diags);
        };

        let (file, file_diags) = decode_file(&body);
        diags.extend(file_diags.with_filename(path));
        let loaded = LoadedFile {
            path: path.to_path_buf(),
            file,
        };
        (Some(loaded), diags)
    }

    /// Load each path in turn. Diagnostics keep the order of `paths`.
    pub fn load_files(&self, paths: &[PathBuf]) -> (Vec<LoadedFile>, Diagnostics) {
        let mut files = Vec::with_capacity(paths.len());
        let mut diags = Diagnostics::new();

        for path in paths {
            let (loaded, file_diags) = self.load_config_file(path);
            diags.extend(file_diags);
            files.extend(loaded);
        }

        (files, diags)
    }

    /// Discover and load every configuration file under `path`.
    pub fn parse_directory(&self, path: &Path) -> (Vec<LoadedFile>, Diagnostics) {
        let (paths, mut diags) = list_config_files(path, &self.options);
        let (files, file_diags) = self.load_files(&paths);
        diags.extend(file_diags);

        info!(
            path = %path.display(),
            files = files.len(),
            errors = diags.errors().count(),
            "Loaded configuration"
        );
        (files, diags)
    }
}

/// Decode configuration held in memory.
pub fn parse_source(src: &str) -> (Option<File>, Diagnostics) {
    match hcl::parse(src) {
        Ok(body) => {
            let (file, diags) = decode_file(&body);
            (Some(file), diags)
        }
        Err(err) => (None, syntax_error(err).into()),
    }
}

/// Load the `.factory` directory of the current working directory,
/// including its subdirectories.
pub fn parse_factory_directory() -> (Vec<LoadedFile>, Diagnostics) {
    Parser::new(ParserOptions::default().recursive(true))
        .parse_directory(Path::new(DEFAULT_CONFIG_DIR))
}

/// List configuration files at `path`.
///
/// A directory is scanned for files with the configured extension, in name
/// order; subdirectories are only entered when `options.recursive` is set.
/// A plain file is returned as-is if its extension matches.
pub fn list_config_files(path: &Path, options: &ParserOptions) -> (Vec<PathBuf>, Diagnostics) {
    let mut paths = Vec::new();
    let mut diags = Diagnostics::new();

    debug!(path = %path.display(), "Processing directory");

    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) => {
            diags.push(
                Diagnostic::error(
                    format!("No file or directory at {}", path.display()),
                    err.to_string(),
                )
                .with_filename(path),
            );
            return (paths, diags);
        }
    };

    if !metadata.is_dir() {
        if has_extension(path, &options.extension) {
            paths.push(path.to_path_buf());
        }
        return (paths, diags);
    }

    let entries = fs::read_dir(path).and_then(|rd| rd.collect::<Result<Vec<_>, _>>());
    let mut entries = match entries {
        Ok(entries) => entries,
        Err(err) => {
            diags.push(
                Diagnostic::error("Cannot read directory", err.to_string()).with_filename(path),
            );
            return (paths, diags);
        }
    };
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let sub_path = entry.path();
        // Symlinked directories are not followed.
        let is_dir = entry.file_type().is_ok_and(|ft| ft.is_dir());
        if is_dir {
            if options.recursive {
                let (sub_paths, sub_diags) = list_config_files(&sub_path, options);
                paths.extend(sub_paths);
                diags.extend(sub_diags);
            }
            continue;
        }

        if has_extension(&sub_path, &options.extension) {
            paths.push(sub_path);
        }
    }

    (paths, diags)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

fn syntax_error(err: hcl::Error) -> Diagnostic {
    Diagnostic::from_error("Invalid configuration syntax", &ConfigError::from(err))
}

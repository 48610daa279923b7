//! errgotrace core library - instruments Go functions to log the errors they return

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Files are processed one at a time; a failure never aborts the run
// - No global mutable state; configuration is resolved once and passed in
// - A file on disk is replaced atomically or not at all
// - Deterministic traversal order must be explicit
// - Identical input yields byte-for-byte identical output

pub mod codegen;
pub mod config;
pub mod edits;
pub mod error;
pub mod instrument;
pub mod language;
pub mod report;
pub mod reverse;
pub mod signature;

pub use config::{ErrgotraceConfig, ResolvedConfig};
pub use error::Error;
pub use instrument::{instrument_source, list_functions, reverse_source};
pub use language::{PrinterKind, SourcePrinter};
pub use report::{render_json, render_text, sort_reports, FileReport};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// What to do with each file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Inject tracing wrappers
    Instrument,
    /// Strip previously injected code
    Reverse,
    /// Report instrumentable functions without editing
    List,
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub action: Action,
    /// Rewrite files in place instead of printing to the output writer
    pub write_in_place: bool,
}

/// Aggregate outcome of a multi-file run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Files transformed or listed successfully
    pub processed: usize,
    /// Files ignored because they match a skip pattern
    pub skipped: usize,
    pub failures: Vec<Error>,
    /// Listing results, sorted; empty unless the action is [`Action::List`]
    pub reports: Vec<FileReport>,
}

impl RunSummary {
    pub fn any_failed(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Process every path, continuing past per-file failures
///
/// Directories expand to the `.go` files beneath them. Each failure is
/// reported on stderr as `errgotrace: <file>: <reason>` and recorded in the
/// summary.
pub fn process_files(
    paths: &[PathBuf],
    config: &ResolvedConfig,
    options: &RunOptions,
    printer: &dyn SourcePrinter,
    out: &mut dyn Write,
) -> RunSummary {
    let mut summary = RunSummary::default();

    for input in paths {
        let files = match expand_path(input) {
            Ok(files) => files,
            Err(e) => {
                eprintln!("errgotrace: {}", e);
                summary.failures.push(e);
                continue;
            }
        };

        for file in files {
            if config.should_skip(&file) {
                tracing::debug!(file = %file.display(), "skipped by pattern");
                summary.skipped += 1;
                continue;
            }

            match process_file(&file, config, options, printer, out) {
                Ok(report) => {
                    summary.processed += 1;
                    summary.reports.extend(report);
                }
                Err(e) => {
                    eprintln!("errgotrace: {}", e);
                    summary.failures.push(e);
                }
            }
        }
    }

    summary.reports = sort_reports(std::mem::take(&mut summary.reports));

    tracing::info!(
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed(),
        "run complete"
    );
    summary
}

/// Transform a single file and either rewrite it or print it to `out`
///
/// Returns the listing for [`Action::List`], otherwise `None`.
pub fn process_file(
    path: &Path,
    config: &ResolvedConfig,
    options: &RunOptions,
    printer: &dyn SourcePrinter,
    out: &mut dyn Write,
) -> Result<Option<FileReport>, Error> {
    let source = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let transformed = match options.action {
        Action::Instrument => instrument_source(path, &source, config, printer)?,
        Action::Reverse => reverse_source(path, &source),
        Action::List => return list_functions(path, &source, config, printer).map(Some),
    };

    let write_error = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    if options.write_in_place {
        if transformed == source {
            tracing::debug!(file = %path.display(), "unchanged");
        } else {
            atomic_write(path, &transformed).map_err(write_error)?;
        }
    } else {
        writeln!(out, "{}", transformed).map_err(write_error)?;
    }

    Ok(None)
}

/// Atomically replace `path` with `contents`, keeping its permissions
///
/// Writes a temp file in the same directory, syncs it, then renames it over
/// the original.
pub fn atomic_write(path: &Path, contents: &str) -> std::io::Result<()> {
    let permissions = fs::metadata(path).map(|m| m.permissions()).ok();

    let mut temp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    temp_name.push(".errgotrace.tmp");
    let temp_path = path.with_file_name(temp_name);

    let result = (|| {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        drop(file);
        if let Some(permissions) = permissions {
            fs::set_permissions(&temp_path, permissions)?;
        }
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Expand a command-line path: files pass through, directories are walked
fn expand_path(path: &Path) -> Result<Vec<PathBuf>, Error> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    collect_go_files_recursive(path, &mut files)?;
    // Sort files for deterministic order
    files.sort();
    Ok(files)
}

/// Returns true for directory names that should not be traversed
fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.') || name == "vendor" || name == "testdata"
}

fn is_go_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("go")
}

/// Recursively collect `.go` files, not following symlinks
fn collect_go_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), Error> {
    let read_error = |source| Error::Read {
        path: dir.to_path_buf(),
        source,
    };

    for entry_result in fs::read_dir(dir).map_err(read_error)? {
        let entry = entry_result.map_err(read_error)?;
        let path = entry.path();
        let metadata = fs::symlink_metadata(&path).map_err(|source| Error::Read {
            path: path.clone(),
            source,
        })?;

        if metadata.is_symlink() {
            continue;
        }

        if metadata.is_dir() {
            let skipped = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_skipped_dir);
            if !skipped {
                collect_go_files_recursive(&path, files)?;
            }
        } else if metadata.is_file() && is_go_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

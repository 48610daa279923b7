//! Per-file text transforms: instrument, reverse, list
//!
//! Global invariants enforced:
//! - Every offset is computed on canonical text produced by the printer
//! - A file is either fully transformed or rejected; no partial output
//! - Files already carrying the support import are never instrumented again
//! - Reversal never parses

use crate::codegen::{import_block, package_only_blocks, render_wrapper, setup_block, IMPORT_NAME};
use crate::config::ResolvedConfig;
use crate::edits::EditList;
use crate::error::Error;
use crate::language::{GoModule, GoParser, SourceParser, SourcePrinter};
use crate::report::{FileReport, FunctionEntry};
use crate::reverse::strip_markers;
use crate::signature::{extract_signature, FunctionFilter, FunctionSignature, SkipReason};
use std::path::Path;

/// Instrument every eligible function of `source`
///
/// Returns canonical text carrying the support import, one wrapper per
/// eligible function, and the setup trailer.
pub fn instrument_source(
    path: &Path,
    source: &str,
    config: &ResolvedConfig,
    printer: &dyn SourcePrinter,
) -> Result<String, Error> {
    let module = prepare(path, source, printer)?;
    let signatures = eligible_signatures(path, &module, &config.filter)?;

    let package_end = module.package_line_end().ok_or_else(|| Error::Parse {
        path: path.to_path_buf(),
        reason: "expected package clause".to_string(),
    })?;

    let edits = plan_edits(module.source(), package_end, &signatures, &config.import_path)
        .map_err(|e| Error::Edit {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let output = edits.apply(module.source()).map_err(|e| Error::Edit {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let canonical = printer
        .canonicalize(&output)
        .map_err(|e| Error::Generated {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    tracing::debug!(
        file = %path.display(),
        functions = signatures.len(),
        "instrumented"
    );
    Ok(canonical)
}

/// Remove every injected marker block from `source`
pub fn reverse_source(path: &Path, source: &str) -> String {
    let stripped = strip_markers(source);
    if stripped.unterminated {
        tracing::warn!(
            file = %path.display(),
            "unterminated marker block; dropped everything after it"
        );
    }
    tracing::debug!(file = %path.display(), blocks = stripped.blocks, "reversed");
    stripped.source
}

/// Report the functions [`instrument_source`] would wrap, without editing
pub fn list_functions(
    path: &Path,
    source: &str,
    config: &ResolvedConfig,
    printer: &dyn SourcePrinter,
) -> Result<FileReport, Error> {
    let module = prepare(path, source, printer)?;
    let signatures = eligible_signatures(path, &module, &config.filter)?;
    Ok(FileReport {
        file: path.display().to_string(),
        functions: signatures.iter().map(FunctionEntry::from_signature).collect(),
    })
}

/// Fail if the file already imports the support package under its reserved name
pub fn ensure_not_instrumented(path: &Path, module: &GoModule) -> Result<(), Error> {
    let already = module
        .imports()
        .iter()
        .any(|spec| spec.name.as_deref() == Some(IMPORT_NAME));
    if already {
        return Err(Error::AlreadyProcessed {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Canonicalize, parse and guard
fn prepare(path: &Path, source: &str, printer: &dyn SourcePrinter) -> Result<GoModule, Error> {
    let canonical = printer.canonicalize(source).map_err(|e| Error::Format {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let module = GoParser::new().parse(&canonical).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    ensure_not_instrumented(path, &module)?;
    Ok(module)
}

/// Signatures of every declaration selected by `filter`, in source order
fn eligible_signatures(
    path: &Path,
    module: &GoModule,
    filter: &FunctionFilter,
) -> Result<Vec<FunctionSignature>, Error> {
    let package = module.package_name().ok_or_else(|| Error::Parse {
        path: path.to_path_buf(),
        reason: "expected package name".to_string(),
    })?;

    let mut signatures = Vec::new();
    for decl in module.function_declarations() {
        match extract_signature(decl, module.source(), package, filter) {
            Ok(sig) => signatures.push(sig),
            Err(reason) => log_skip(path, decl, module.source(), reason),
        }
    }
    Ok(signatures)
}

fn log_skip(path: &Path, decl: tree_sitter::Node<'_>, source: &str, reason: SkipReason) {
    let name = decl
        .child_by_field_name("name")
        .and_then(|n| source.get(n.byte_range()))
        .unwrap_or("<unnamed>");
    tracing::debug!(
        file = %path.display(),
        function = name,
        line = decl.start_position().row + 1,
        reason = reason.as_str(),
        "skipping function"
    );
}

/// Import block first, then one wrapper per signature in source order, then
/// the setup trailer
///
/// Import and wrapper blocks go in front of the next non-blank line, so the
/// blank line each block ends with is the only one the stripper absorbs.
fn plan_edits(
    source: &str,
    package_end: usize,
    signatures: &[FunctionSignature],
    import_path: &str,
) -> Result<EditList, crate::edits::EditError> {
    let mut edits = EditList::new();
    let import_at = next_content_line(source, package_end);
    if import_at == source.len() {
        edits.add(import_at, package_only_blocks(import_path))?;
        return Ok(edits);
    }

    edits.add(import_at, import_block(import_path))?;
    for sig in signatures {
        edits.add(next_content_line(source, sig.body_offset), render_wrapper(sig))?;
    }
    edits.add(source.len(), setup_block())?;
    Ok(edits)
}

/// Start of the first non-empty line after the line containing `offset`
fn next_content_line(source: &str, offset: usize) -> usize {
    let Some(newline) = source[offset..].find('\n') else {
        return source.len();
    };
    let mut pos = offset + newline + 1;
    while source[pos..].starts_with('\n') {
        pos += 1;
    }
    pos
}

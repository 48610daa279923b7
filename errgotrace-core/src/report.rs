//! Listing output for `--list`
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs

use crate::signature::FunctionSignature;
use serde::{Deserialize, Serialize};

/// One function that would be instrumented
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FunctionEntry {
    /// Qualified name passed to the inspection entry point
    pub function: String,
    /// Name the original body is moved to
    pub implementation: String,
    pub line: u32,
    pub results: usize,
}

impl FunctionEntry {
    pub fn from_signature(sig: &FunctionSignature) -> Self {
        FunctionEntry {
            function: sig.qualified_name.clone(),
            implementation: sig.impl_name(),
            line: sig.span.start_line,
            results: sig.result_count,
        }
    }
}

/// Instrumentable functions of a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub file: String,
    pub functions: Vec<FunctionEntry>,
}

/// Sort reports by file, and each file's functions by line
pub fn sort_reports(mut reports: Vec<FileReport>) -> Vec<FileReport> {
    for report in &mut reports {
        report.functions.sort_by(|a, b| {
            a.line
                .cmp(&b.line)
                .then_with(|| a.function.cmp(&b.function))
        });
    }
    reports.sort_by(|a, b| a.file.cmp(&b.file));
    reports
}

/// Render reports as text output
pub fn render_text(reports: &[FileReport]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<30} {:<6} {:<40} {}\n",
        "FILE", "LINE", "FUNCTION", "IMPLEMENTATION"
    ));

    for report in reports {
        for entry in &report.functions {
            output.push_str(&format!(
                "{:<30} {:<6} {:<40} {}\n",
                truncate_or_pad(&report.file, 30),
                entry.line,
                entry.function,
                entry.implementation
            ));
        }
    }

    let total: usize = reports.iter().map(|r| r.functions.len()).sum();
    output.push_str(&format!(
        "\n{} function(s) in {} file(s)\n",
        total,
        reports.len()
    ));

    output
}

/// Render reports as JSON output
pub fn render_json(reports: &[FileReport]) -> String {
    serde_json::to_string_pretty(reports).unwrap_or_else(|_| "[]".to_string())
}

/// Truncate or pad string to fixed width, keeping the end of long paths
fn truncate_or_pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len > width {
        let keep = width.saturating_sub(3);
        let tail: String = s.chars().skip(len - keep).collect();
        format!("...{}", tail)
    } else {
        format!("{:<width$}", s, width = width)
    }
}

//! Canonical printers for Go source
//!
//! Two printers implement [`SourcePrinter`]:
//! - [`BuiltinPrinter`] normalizes layout without reflowing code. It never
//!   collapses blank lines, which keeps the marker-block stripper exact.
//! - [`GofmtPrinter`] pipes the text through an external `gofmt`, then
//!   splits one-line function bodies the same way the built-in printer does.

use crate::language::go::parser::GoParser;
use crate::language::parser::{PrintError, SourceParser, SourcePrinter};
use crate::language::tree_sitter_utils::collect_ranges_of_kind;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Which printer to use for canonicalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterKind {
    /// `gofmt` when it is on `PATH`, otherwise the built-in printer
    Auto,
    #[default]
    Builtin,
    Gofmt,
}

impl PrinterKind {
    /// Instantiate the printer this kind stands for
    pub fn build(self) -> Box<dyn SourcePrinter> {
        match self {
            PrinterKind::Builtin => Box::new(BuiltinPrinter::new()),
            PrinterKind::Gofmt => Box::new(GofmtPrinter::new()),
            PrinterKind::Auto => match find_on_path("gofmt") {
                Some(program) => Box::new(GofmtPrinter::with_program(program)),
                None => Box::new(BuiltinPrinter::new()),
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrinterKind::Auto => "auto",
            PrinterKind::Builtin => "builtin",
            PrinterKind::Gofmt => "gofmt",
        }
    }
}

/// Locate an executable in the directories listed by `PATH`
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        let exe = dir.join(format!("{}.exe", program));
        exe.is_file().then_some(exe)
    })
}

/// Layout normalizer backed by the tree-sitter Go grammar
///
/// Canonical form:
/// - LF line endings
/// - no trailing spaces or tabs, except inside multi-line raw strings
/// - no leading blank lines and exactly one trailing newline
/// - every top-level function body opens with `{` at the end of a line and
///   closes with `}` at the start of a line (`{}` becomes `{\n}`)
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPrinter {
    parser: GoParser,
}

impl BuiltinPrinter {
    pub fn new() -> Self {
        BuiltinPrinter {
            parser: GoParser::new(),
        }
    }
}

impl SourcePrinter for BuiltinPrinter {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn canonicalize(&self, source: &str) -> Result<String, PrintError> {
        let mut text = source.replace("\r\n", "\n");
        let mut module = self.parser.parse(&text)?;

        let fixes = body_brace_fixes(&module);
        if !fixes.is_empty() {
            text = apply_replacements(&text, &fixes);
            module = self.parser.parse(&text)?;
        }

        let mut raw_strings = Vec::new();
        collect_ranges_of_kind(module.root(), "raw_string_literal", &mut raw_strings);
        raw_strings.retain(|&(start, end)| text[start..end].contains('\n'));

        Ok(normalize_lines(&text, &raw_strings))
    }
}

/// Replacement of `text[start..end]`
type Replacement = (usize, usize, &'static str);

fn body_brace_fixes(module: &crate::language::go::GoModule) -> Vec<Replacement> {
    let source = module.source();
    let mut fixes = Vec::new();

    for decl in module.function_declarations() {
        let Some(body) = decl.child_by_field_name("body") else {
            continue;
        };
        let open = body.start_byte();
        let close = body.end_byte().saturating_sub(1);
        if close <= open || &source[close..=close] != "}" {
            continue;
        }

        let inner = &source[open + 1..close];
        if inner.trim_matches([' ', '\t']).is_empty() {
            if inner != "\n" {
                fixes.push((open + 1, close, "\n"));
            }
            continue;
        }

        let lead = inner.len() - inner.trim_start_matches([' ', '\t']).len();
        if !inner[lead..].starts_with('\n') {
            fixes.push((open + 1, open + 1 + lead, "\n\t"));
        }

        let kept = inner.trim_end_matches([' ', '\t']).len();
        if !inner[..kept].ends_with('\n') {
            fixes.push((open + 1 + kept, close, "\n"));
        }
    }

    fixes
}

fn apply_replacements(text: &str, fixes: &[Replacement]) -> String {
    let mut out = String::with_capacity(text.len() + fixes.len() * 2);
    let mut pos = 0;
    for &(start, end, replacement) in fixes {
        out.push_str(&text[pos..start]);
        out.push_str(replacement);
        pos = end;
    }
    out.push_str(&text[pos..]);
    out
}

fn normalize_lines(text: &str, protected: &[(usize, usize)]) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let content = line.strip_suffix('\n').unwrap_or(line);
        let newline_at = offset + content.len();
        let inside_raw = protected
            .iter()
            .any(|&(start, end)| start < newline_at && newline_at < end);

        if inside_raw {
            out.push_str(content);
        } else {
            out.push_str(content.trim_end_matches([' ', '\t']));
        }
        out.push('\n');
        offset += line.len();
    }

    let trimmed = out.trim_start_matches('\n').trim_end_matches('\n');
    let mut canonical = String::with_capacity(trimmed.len() + 1);
    canonical.push_str(trimmed);
    canonical.push('\n');
    canonical
}

/// Formatter that delegates to an external `gofmt` binary
///
/// gofmt keeps one-line function bodies on one line, but injected wrappers
/// need the opening brace to end its line. Bodies are split after formatting
/// and the result is formatted once more.
#[derive(Debug, Clone)]
pub struct GofmtPrinter {
    program: PathBuf,
    parser: GoParser,
}

impl GofmtPrinter {
    /// Run `gofmt` resolved through `PATH` at spawn time
    pub fn new() -> Self {
        Self::with_program("gofmt")
    }

    pub fn with_program(program: impl AsRef<Path>) -> Self {
        GofmtPrinter {
            program: program.as_ref().to_path_buf(),
            parser: GoParser::new(),
        }
    }

    fn run(&self, source: &str) -> Result<String, PrintError> {
        let tool_error = |message: String| PrintError::Tool {
            tool: "gofmt",
            message,
        };

        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| tool_error(format!("failed to run {}: {}", self.program.display(), e)))?;

        // Feed stdin from a separate thread so a large output cannot block us
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| tool_error("stdin unavailable".to_string()))?;
        let input = source.to_string();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .map_err(|e| tool_error(e.to_string()))?;
        writer
            .join()
            .map_err(|_| tool_error("stdin writer panicked".to_string()))?
            .map_err(|e| tool_error(format!("failed to write stdin: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(tool_error(stderr.trim().replace("<standard input>:", "")));
        }

        String::from_utf8(output.stdout).map_err(|e| tool_error(e.to_string()))
    }
}

impl Default for GofmtPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl SourcePrinter for GofmtPrinter {
    fn name(&self) -> &'static str {
        "gofmt"
    }

    fn canonicalize(&self, source: &str) -> Result<String, PrintError> {
        let formatted = self.run(source)?;
        let module = self.parser.parse(&formatted)?;
        let fixes = body_brace_fixes(&module);
        if fixes.is_empty() {
            return Ok(formatted);
        }
        self.run(&apply_replacements(&formatted, &fixes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(source: &str) -> String {
        BuiltinPrinter::new().canonicalize(source).unwrap()
    }

    #[test]
    fn test_builtin_normalizes_line_endings_and_whitespace() {
        let source = "\n\npackage main  \r\n\r\nfunc f() int {\r\n\treturn 1\t\r\n}\r\n\n\n";
        assert_eq!(
            canonical(source),
            "package main\n\nfunc f() int {\n\treturn 1\n}\n"
        );
    }

    #[test]
    fn test_builtin_keeps_blank_line_runs() {
        let source = "package main\n\n\n\nvar x = 1\n";
        assert_eq!(canonical(source), source);
    }

    #[test]
    fn test_builtin_splits_single_line_bodies() {
        let source = "package main\n\nfunc f() error { return nil }\n\nfunc g() error {}\n";
        assert_eq!(
            canonical(source),
            "package main\n\nfunc f() error {\n\treturn nil\n}\n\nfunc g() error {\n}\n"
        );
    }

    #[test]
    fn test_builtin_leaves_function_literals_alone() {
        let source = "package main\n\nvar f = func() error { return nil }\n";
        assert_eq!(canonical(source), source);
    }

    #[test]
    fn test_builtin_preserves_raw_string_whitespace() {
        let source = "package main\n\nvar s = `line one   \nline two\t\n`\n";
        assert_eq!(canonical(source), source);
    }

    #[test]
    fn test_builtin_is_idempotent() {
        let source = "package main\r\n\nimport \"fmt\"   \n\nfunc (t *T) M(a, b int) (int, error) { fmt.Println(a); return b, nil }\n\ntype T struct{}\n";
        let once = canonical(source);
        let twice = canonical(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_builtin_rejects_invalid_source() {
        let err = BuiltinPrinter::new()
            .canonicalize("package main\n\nfunc f( {\n")
            .unwrap_err();
        assert!(matches!(err, PrintError::Syntax(_)));
    }

    #[test]
    fn test_printer_kind_serde_names() {
        let kind: PrinterKind = serde_json::from_str("\"gofmt\"").unwrap();
        assert_eq!(kind, PrinterKind::Gofmt);
        assert_eq!(PrinterKind::default(), PrinterKind::Builtin);
        assert_eq!(PrinterKind::Builtin.build().name(), "builtin");
    }

    #[test]
    fn test_gofmt_missing_binary_is_tool_error() {
        let printer = GofmtPrinter::with_program("/nonexistent/errgotrace-gofmt");
        let err = printer.canonicalize("package main\n").unwrap_err();
        assert!(matches!(err, PrintError::Tool { tool: "gofmt", .. }));
    }

    #[test]
    fn test_gofmt_formats_when_available() {
        let Some(program) = find_on_path("gofmt") else {
            eprintln!("gofmt not on PATH, skipping");
            return;
        };
        let printer = GofmtPrinter::with_program(program);
        let out = printer
            .canonicalize("package main\nfunc f()  int {return 1}\n")
            .unwrap();
        assert_eq!(out, "package main\n\nfunc f() int {\n\treturn 1\n}\n");
        assert_eq!(printer.canonicalize(&out).unwrap(), out);
    }

    #[test]
    fn test_body_fixes_split_gofmt_one_liners() {
        let source = "package main\n\nfunc f() error { return nil }\n\nfunc g() (int, error) { a(); return 1, nil }\n";
        let module = GoParser::new().parse(source).unwrap();
        let fixes = body_brace_fixes(&module);
        assert_eq!(
            apply_replacements(source, &fixes),
            "package main\n\nfunc f() error {\n\treturn nil\n}\n\nfunc g() (int, error) {\n\ta(); return 1, nil\n}\n"
        );
    }
}

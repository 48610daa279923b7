//! Rendering of the code injected into instrumented files
//!
//! All generated text is bounded by [`BEGIN_MARKER`] / [`END_MARKER`] lines so
//! the stripper can remove it without parsing. Blocks are inserted at the
//! start of a line and end with a blank line, which is the one blank line the
//! stripper absorbs after each block. The setup trailer is the exception: it
//! is appended at the end of the file, after a blank line of its own.

use crate::signature::FunctionSignature;
use std::fmt::Write;

pub const BEGIN_MARKER: &str = "/* BEGIN_ERRGOTRACE */";
pub const END_MARKER: &str = "/* END_ERRGOTRACE */";

/// Local name of the support package import
pub const IMPORT_NAME: &str = "__errgotrace";

/// Default import path of the runtime support package
pub const DEFAULT_IMPORT_PATH: &str = "github.com/gellweiler/errgotrace/log";

/// Support package entry point receiving the function name and its results
pub const INSPECT_FN: &str = "InspectReturnValues";

/// Support package entry point run once per file
pub const SETUP_FN: &str = "Setup";

/// Prefix of the bindings that capture the renamed implementation's results
pub const RESULT_PREFIX: &str = "__result";

/// Import declaration placed before the first line following the package clause
pub fn import_block(import_path: &str) -> String {
    format!(
        "{}\n{}\n{}\n\n",
        BEGIN_MARKER,
        import_declaration(import_path),
        END_MARKER
    )
}

/// Top-level declaration appended at the end of the file
pub fn setup_block() -> String {
    format!("\n{}\n{}\n{}\n", BEGIN_MARKER, setup_declaration(), END_MARKER)
}

/// Import and setup for a file holding nothing but its package clause
///
/// Both blocks follow a single blank line with no blank line after either,
/// so the layout survives printers that collapse blank-line runs.
pub fn package_only_blocks(import_path: &str) -> String {
    format!(
        "\n{}\n{}\n{}\n{}\n{}\n{}\n",
        BEGIN_MARKER,
        import_declaration(import_path),
        END_MARKER,
        BEGIN_MARKER,
        setup_declaration(),
        END_MARKER
    )
}

fn import_declaration(import_path: &str) -> String {
    format!("import {} {}", IMPORT_NAME, go_string_literal(import_path))
}

fn setup_declaration() -> String {
    format!("var _ = {}.{}()", IMPORT_NAME, SETUP_FN)
}

/// Render the block inserted before the first non-blank line of `sig`'s body
///
/// The block closes the original body as a wrapper that forwards to the
/// renamed implementation, then reopens the original body under the new name:
///
/// ```text
/// func (s *S) Open(name string) (*File, error) {
/// /* BEGIN_ERRGOTRACE */
///     __result0, __result1 := s.__Open(name)
///     __errgotrace.InspectReturnValues("pkg.*S.Open", __result0, __result1)
///     return __result0, __result1
/// }
///
/// func (s *S) __Open(name string) (*File, error) {
///     /* END_ERRGOTRACE */
///
///     ...original body...
/// ```
pub fn render_wrapper(sig: &FunctionSignature) -> String {
    let impl_name = sig.impl_name();
    let results = result_bindings(sig.result_count);

    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "{}", BEGIN_MARKER);
    let _ = writeln!(
        out,
        "\t{} := {}({})",
        results,
        call_target(sig, &impl_name),
        call_arguments(sig)
    );
    let _ = writeln!(
        out,
        "\t{}.{}({}, {})",
        IMPORT_NAME,
        INSPECT_FN,
        go_string_literal(&sig.qualified_name),
        results
    );
    let _ = writeln!(out, "\treturn {}", results);
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
    let _ = writeln!(out, "{} {{", impl_header(sig, &impl_name));
    let _ = writeln!(out, "\t{}", END_MARKER);
    let _ = writeln!(out);
    out
}

/// `__result0, __result1, ...`, one per result slot
fn result_bindings(count: usize) -> String {
    (0..count)
        .map(|i| format!("{}{}", RESULT_PREFIX, i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The callee expression; methods are only called through a named receiver
fn call_target(sig: &FunctionSignature, impl_name: &str) -> String {
    let mut target = match &sig.receiver_name {
        Some(receiver) => format!("{}.{}", receiver, impl_name),
        None => impl_name.to_string(),
    };
    if !sig.type_param_names.is_empty() {
        let _ = write!(target, "[{}]", sig.type_param_names.join(", "));
    }
    target
}

/// Forwarded arguments, spreading variadic parameters
fn call_arguments(sig: &FunctionSignature) -> String {
    sig.params
        .iter()
        .map(|p| {
            if p.is_variadic {
                format!("{}...", p.name)
            } else {
                p.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `func [receiver ]name[type params](params) results`
fn impl_header(sig: &FunctionSignature, impl_name: &str) -> String {
    let mut header = String::from("func ");
    if !sig.receiver_text.is_empty() {
        header.push_str(&sig.receiver_text);
        header.push(' ');
    }
    header.push_str(impl_name);
    header.push_str(&sig.type_params_text);

    let params = sig
        .params
        .iter()
        .map(|p| {
            let ellipsis = if p.is_variadic { "..." } else { "" };
            format!("{} {}{}", p.name, ellipsis, p.type_text)
        })
        .collect::<Vec<_>>()
        .join(", ");
    let _ = write!(header, "({}) {}", params, sig.results_text);
    header
}

/// Quote `value` as an interpreted Go string literal
pub fn go_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

//! Language abstraction layer
//!
//! This module provides the parser/printer capability boundary and the Go
//! implementation of it.

pub mod go;
pub mod parser;
pub mod span;
pub mod tree_sitter_utils;

pub use go::{BuiltinPrinter, GoModule, GoParser, GofmtPrinter, ImportSpec, PrinterKind};
pub use parser::{PrintError, SourceParser, SourcePrinter, SyntaxError};
pub use span::SourceSpan;

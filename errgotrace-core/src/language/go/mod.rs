//! Go language support
//!
//! Parsing and canonical printing of Go source using the tree-sitter-go
//! grammar.

pub mod parser;
pub mod printer;

pub use parser::{GoModule, GoParser, ImportSpec};
pub use printer::{BuiltinPrinter, GofmtPrinter, PrinterKind};

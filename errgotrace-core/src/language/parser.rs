//! Parser and printer capability boundary
//!
//! The transformation engine never depends on a concrete formatter. It asks a
//! [`SourceParser`] for a structural tree and a [`SourcePrinter`] for canonical
//! text, and every offset it computes is relative to that canonical text.

use std::fmt;

/// Position and description of the first syntax problem in a file
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{line}:{column}: {message}")]
pub struct SyntaxError {
    /// 1-indexed line
    pub line: u32,
    /// 1-indexed byte column
    pub column: u32,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        SyntaxError {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Failure to produce canonical text
#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    /// The input is not syntactically valid
    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    /// An external formatter could not be run or rejected the input
    #[error("{tool}: {message}")]
    Tool { tool: &'static str, message: String },
}

/// Turns source text into a structural tree
pub trait SourceParser {
    type Module;

    /// Parse `source`, failing on the first syntax error
    fn parse(&self, source: &str) -> Result<Self::Module, SyntaxError>;
}

/// Turns source text into canonical source text
///
/// Implementations must be deterministic and idempotent:
/// `canonicalize(canonicalize(x)) == canonicalize(x)`.
pub trait SourcePrinter {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    fn canonicalize(&self, source: &str) -> Result<String, PrintError>;
}

impl fmt::Debug for dyn SourcePrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourcePrinter({})", self.name())
    }
}

//! Byte and line positions of declarations inside canonical source

use tree_sitter::Node;

/// Contiguous region of canonical source text
///
/// Byte offsets index into the canonical (re-printed) text, never the raw
/// input, because printing may move things around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    /// Byte offset of the start of the span (inclusive)
    pub start: usize,
    /// Byte offset of the end of the span (exclusive)
    pub end: usize,
    /// Line number of the start (1-indexed)
    pub start_line: u32,
    /// Line number of the end (1-indexed)
    pub end_line: u32,
    /// Column number of the start (1-indexed, in bytes)
    pub start_col: u32,
}

impl From<Node<'_>> for SourceSpan {
    fn from(node: Node<'_>) -> Self {
        // tree-sitter rows and columns are 0-indexed
        SourceSpan {
            start: node.start_byte(),
            end: node.end_byte(),
            start_line: node.start_position().row as u32 + 1,
            end_line: node.end_position().row as u32 + 1,
            start_col: node.start_position().column as u32 + 1,
        }
    }
}

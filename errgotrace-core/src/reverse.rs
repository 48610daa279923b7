//! Removal of previously injected marker blocks
//!
//! Works line by line without the parser: an injected block on its own is not
//! a valid Go fragment, so the markers are the only reliable structure.

use crate::codegen::{BEGIN_MARKER, END_MARKER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Emit lines
    Normal,
    /// Discard lines until the end marker
    InBlock,
    /// One-line lookahead after a block: a blank line here is discarded
    AfterBlock,
}

/// Result of stripping a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stripped {
    pub source: String,
    /// Number of marker blocks removed
    pub blocks: usize,
    /// True if the input ended inside a block
    pub unterminated: bool,
}

fn is_begin(line: &str) -> bool {
    line.trim() == BEGIN_MARKER
}

fn is_end(line: &str) -> bool {
    line.trim() == END_MARKER
}

/// Delete every marker block plus at most one blank line after each
///
/// Emitted lines are joined with `\n` and a single trailing newline is
/// trimmed from the result.
pub fn strip_markers(source: &str) -> Stripped {
    let mut state = State::Normal;
    let mut out = String::with_capacity(source.len());
    let mut blocks = 0;

    for line in source.lines() {
        match state {
            State::AfterBlock if line.trim().is_empty() => {
                state = State::Normal;
            }
            State::Normal | State::AfterBlock => {
                if is_begin(line) {
                    state = State::InBlock;
                } else {
                    state = State::Normal;
                    out.push_str(line);
                    out.push('\n');
                }
            }
            State::InBlock => {
                if is_end(line) {
                    blocks += 1;
                    state = State::AfterBlock;
                }
            }
        }
    }

    if out.ends_with('\n') {
        out.pop();
    }

    Stripped {
        source: out,
        blocks,
        unterminated: state == State::InBlock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(source: &str) -> String {
        strip_markers(source).source
    }

    #[test]
    fn test_no_markers_only_trims_one_newline() {
        assert_eq!(strip("a\nb\n"), "a\nb");
        assert_eq!(strip("a\nb"), "a\nb");
        assert_eq!(strip("a\n\n"), "a\n");
        assert_eq!(strip(""), "");
    }

    #[test]
    fn test_block_and_following_blank_removed() {
        let source = "a\n/* BEGIN_ERRGOTRACE */\nx\n/* END_ERRGOTRACE */\n\nb\n";
        let stripped = strip_markers(source);
        assert_eq!(stripped.source, "a\nb");
        assert_eq!(stripped.blocks, 1);
        assert!(!stripped.unterminated);
    }

    #[test]
    fn test_only_one_blank_line_absorbed() {
        let source = "a\n/* BEGIN_ERRGOTRACE */\nx\n/* END_ERRGOTRACE */\n\n\nb\n";
        assert_eq!(strip(source), "a\n\nb");
    }

    #[test]
    fn test_whitespace_only_line_after_block_is_absorbed() {
        let source = "a\n/* BEGIN_ERRGOTRACE */\nx\n/* END_ERRGOTRACE */\n\t \nb\n";
        assert_eq!(strip(source), "a\nb");
    }

    #[test]
    fn test_non_blank_line_after_block_is_kept() {
        let source = "a\n/* BEGIN_ERRGOTRACE */\nx\n/* END_ERRGOTRACE */\nb\n\nc\n";
        assert_eq!(strip(source), "a\nb\n\nc");
    }

    #[test]
    fn test_adjacent_blocks() {
        let source = "a\n/* BEGIN_ERRGOTRACE */\nx\n/* END_ERRGOTRACE */\n/* BEGIN_ERRGOTRACE */\ny\n/* END_ERRGOTRACE */\n\nb\n";
        let stripped = strip_markers(source);
        assert_eq!(stripped.source, "a\nb");
        assert_eq!(stripped.blocks, 2);
    }

    #[test]
    fn test_blocks_separated_by_blank_line() {
        let source = "/* BEGIN_ERRGOTRACE */\nx\n/* END_ERRGOTRACE */\n\n/* BEGIN_ERRGOTRACE */\ny\n/* END_ERRGOTRACE */\n\nb\n";
        assert_eq!(strip(source), "b");
    }

    #[test]
    fn test_indented_markers_with_trailing_space() {
        let source = "func f() error {\n\t/* BEGIN_ERRGOTRACE */  \n\tx\n\t/* END_ERRGOTRACE */\t\n\n\treturn nil\n}\n";
        assert_eq!(strip(source), "func f() error {\n\treturn nil\n}");
    }

    #[test]
    fn test_nested_looking_begin_is_discarded() {
        let source = "a\n/* BEGIN_ERRGOTRACE */\n/* BEGIN_ERRGOTRACE */\nx\n/* END_ERRGOTRACE */\nb\n";
        assert_eq!(strip(source), "a\nb");
    }

    #[test]
    fn test_marker_inside_code_line_is_not_a_marker() {
        let source = "x := 1 /* BEGIN_ERRGOTRACE */\ny := 2\n";
        assert_eq!(strip(source), "x := 1 /* BEGIN_ERRGOTRACE */\ny := 2");
    }

    #[test]
    fn test_stray_end_marker_is_kept() {
        let source = "a\n/* END_ERRGOTRACE */\nb\n";
        assert_eq!(strip(source), "a\n/* END_ERRGOTRACE */\nb");
    }

    #[test]
    fn test_unterminated_block_discards_rest() {
        let stripped = strip_markers("a\n/* BEGIN_ERRGOTRACE */\nx\ny\n");
        assert_eq!(stripped.source, "a");
        assert_eq!(stripped.blocks, 0);
        assert!(stripped.unterminated);
    }

    #[test]
    fn test_block_at_end_of_file() {
        let source = "a\n}\n\n/* BEGIN_ERRGOTRACE */\nvar _ = __errgotrace.Setup()\n/* END_ERRGOTRACE */\n";
        assert_eq!(strip(source), "a\n}\n");
    }

    #[test]
    fn test_crlf_input() {
        let source = "a\r\n/* BEGIN_ERRGOTRACE */\r\nx\r\n/* END_ERRGOTRACE */\r\n\r\nb\r\n";
        assert_eq!(strip(source), "a\nb");
    }
}

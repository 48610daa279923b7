//! Positional text insertions over canonical source
//!
//! Global invariants enforced:
//! - Edits are pure insertions, never deletions or replacements
//! - Offsets index into canonical text and are non-decreasing in emission order
//! - Application is a single linear merge; emitted output is never re-scanned

/// Insertion of `text` at byte `offset`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub offset: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("edit at offset {offset} precedes earlier edit at offset {previous}")]
    OutOfOrder { offset: usize, previous: usize },

    #[error("edit at offset {offset} is past the end of the source ({len} bytes)")]
    OutOfBounds { offset: usize, len: usize },

    #[error("edit at offset {offset} splits a UTF-8 character")]
    NotCharBoundary { offset: usize },
}

/// Ordered insertions for one file
#[derive(Debug, Clone, Default)]
pub struct EditList {
    edits: Vec<Edit>,
}

impl EditList {
    pub fn new() -> Self {
        EditList { edits: Vec::new() }
    }

    /// Record an insertion; offsets must not go backwards
    pub fn add(&mut self, offset: usize, text: impl Into<String>) -> Result<(), EditError> {
        if let Some(last) = self.edits.last() {
            if offset < last.offset {
                return Err(EditError::OutOfOrder {
                    offset,
                    previous: last.offset,
                });
            }
        }
        self.edits.push(Edit {
            offset,
            text: text.into(),
        });
        Ok(())
    }

    /// Merge the insertions into `source` in one pass
    ///
    /// Edits sharing an offset are emitted in the order they were added.
    pub fn apply(&self, source: &str) -> Result<String, EditError> {
        let extra: usize = self.edits.iter().map(|e| e.text.len()).sum();
        let mut out = String::with_capacity(source.len() + extra);
        let mut pos = 0;

        for edit in &self.edits {
            if edit.offset > source.len() {
                return Err(EditError::OutOfBounds {
                    offset: edit.offset,
                    len: source.len(),
                });
            }
            if !source.is_char_boundary(edit.offset) {
                return Err(EditError::NotCharBoundary {
                    offset: edit.offset,
                });
            }
            out.push_str(&source[pos..edit.offset]);
            out.push_str(&edit.text);
            pos = edit.offset;
        }
        out.push_str(&source[pos..]);

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_empty_list_is_identity() {
        let edits = EditList::new();
        assert_eq!(edits.apply("package main\n").unwrap(), "package main\n");
    }

    #[test]
    fn test_apply_inserts_at_offsets() {
        let mut edits = EditList::new();
        edits.add(0, "<").unwrap();
        edits.add(3, "|").unwrap();
        edits.add(6, ">").unwrap();
        assert_eq!(edits.apply("abcdef").unwrap(), "<abc|def>");
    }

    #[test]
    fn test_same_offset_keeps_emission_order() {
        let mut edits = EditList::new();
        edits.add(1, "x").unwrap();
        edits.add(1, "y").unwrap();
        assert_eq!(edits.apply("ab").unwrap(), "axyb");
    }

    #[test]
    fn test_rejects_decreasing_offsets() {
        let mut edits = EditList::new();
        edits.add(5, "a").unwrap();
        assert_eq!(
            edits.add(2, "b"),
            Err(EditError::OutOfOrder {
                offset: 2,
                previous: 5
            })
        );
        assert_eq!(edits.apply("0123456789").unwrap(), "01234a56789");
    }

    #[test]
    fn test_rejects_out_of_bounds() {
        let mut edits = EditList::new();
        edits.add(10, "x").unwrap();
        assert_eq!(
            edits.apply("short"),
            Err(EditError::OutOfBounds { offset: 10, len: 5 })
        );
    }

    #[test]
    fn test_rejects_split_character() {
        let mut edits = EditList::new();
        edits.add(1, "x").unwrap();
        assert_eq!(
            edits.apply("é"),
            Err(EditError::NotCharBoundary { offset: 1 })
        );
    }
}

//! Span-based source rewriting
//!
//! Rewrites are collected first and applied afterwards in one pass over the
//! text, so the syntax tree is never mutated.

use std::ops::Range;

use thiserror::Error;

/// Replace the bytes in `range` with `replacement`. An empty range inserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl Edit {
    pub fn replace(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }

    pub fn remove(range: Range<usize>) -> Self {
        Self::replace(range, String::new())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("overlapping edits at {first:?} and {second:?}")]
pub struct EditConflict {
    pub first: Range<usize>,
    pub second: Range<usize>,
}

/// Applies `edits` to `source`. Insertions at the same offset keep the order
/// they were given in.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> Result<String, EditConflict> {
    edits.sort_by_key(|edit| (edit.range.start, edit.range.end));

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;

    for (i, edit) in edits.iter().enumerate() {
        if edit.range.start < cursor || edit.range.end > source.len() {
            return Err(EditConflict {
                first: edits[i.saturating_sub(1)].range.clone(),
                second: edit.range.clone(),
            });
        }
        out.push_str(&source[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
    }

    out.push_str(&source[cursor..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_edits() {
        let source = "const b = require('./b');";
        let edits = vec![
            Edit::replace(18..23, "\"./src/b.js\""),
            Edit::insert(0, "/* head */ "),
            Edit::insert(source.len(), "\n// tail"),
        ];
        assert_eq!(
            apply_edits(source, edits).unwrap(),
            "/* head */ const b = require(\"./src/b.js\");\n// tail"
        );
    }

    #[test]
    fn test_insertions_keep_order() {
        let edits = vec![Edit::insert(1, "x"), Edit::insert(1, "y"), Edit::remove(1..2)];
        assert_eq!(apply_edits("abc", edits).unwrap(), "axyc");
    }

    #[test]
    fn test_overlap_is_rejected() {
        let edits = vec![Edit::replace(0..4, "x"), Edit::replace(2..6, "y")];
        let err = apply_edits("abcdefg", edits).unwrap_err();
        assert_eq!(err.first, 0..4);
        assert_eq!(err.second, 2..6);
    }

    #[test]
    fn test_no_edits() {
        assert_eq!(apply_edits("same", Vec::new()).unwrap(), "same");
    }
}

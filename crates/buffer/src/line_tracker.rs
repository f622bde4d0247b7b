// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing

//! The line tracker contract.
//!
//! A line tracker mirrors the edits applied to a text store, but only keeps
//! line lengths and delimiters. It answers offset↔line queries without looking
//! at the text. Lines are zero-based; each line's length includes its
//! delimiter, and the last line never has one.

use std::fmt;

use crate::delimiter::{Delimiter, DelimiterScanner};
use crate::error::{BufferError, Result};
use crate::types::Region;

/// Tracks line boundaries of a text it never stores.
pub trait LineTracker: fmt::Debug + Send {
    /// The scanner used to find delimiters in inserted text.
    fn scanner(&self) -> &dyn DelimiterScanner;

    /// Total number of chars covered by the tracked lines.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lines; at least 1.
    fn number_of_lines(&self) -> usize;

    /// Line containing `offset`. `offset == len()` yields the last line.
    fn line_number_of_offset(&self, offset: usize) -> Result<usize>;

    /// Offset and length (without delimiter) of the line containing `offset`.
    fn line_information_of_offset(&self, offset: usize) -> Result<Region>;

    /// Offset of the first char of `line`.
    fn line_offset(&self, line: usize) -> Result<usize>;

    /// Length of `line` including its delimiter.
    fn line_length(&self, line: usize) -> Result<usize>;

    /// Delimiter ending `line`, `None` for the last line.
    fn line_delimiter(&self, line: usize) -> Result<Option<Delimiter>>;

    /// Offset and length (without delimiter) of `line`.
    fn line_information(&self, line: usize) -> Result<Region>;

    /// Mirrors replacing `length` chars at `offset` with `text`.
    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<()>;

    /// Forgets all lines and tracks `text` from scratch.
    fn set(&mut self, text: &str);

    fn legal_line_delimiters(&self) -> &[Delimiter] {
        self.scanner().legal_delimiters()
    }

    /// Number of delimiters in `text`, i.e. the lines it would add.
    fn compute_number_of_lines(&self, text: &str) -> usize {
        let chars: Vec<char> = text.chars().collect();
        self.scanner().count_delimiters(&chars)
    }

    /// Number of lines touched by `[offset, offset + length)`; 1 for an
    /// empty range.
    fn number_of_lines_in(&self, offset: usize, length: usize) -> Result<usize> {
        let start = self.line_number_of_offset(offset)?;
        if length == 0 {
            return Ok(1);
        }
        let end = offset
            .checked_add(length)
            .ok_or_else(|| bad_location(offset, length, self.len()))?;
        let end = self.line_number_of_offset(end)?;
        Ok(end - start + 1)
    }
}

pub(crate) fn bad_location(offset: usize, length: usize, len: usize) -> BufferError {
    BufferError::BadLocation {
        offset,
        length,
        len,
    }
}

/// Applies a signed delta to a count that the tracker invariants keep
/// non-negative.
pub(crate) fn shift(value: usize, delta: isize) -> usize {
    debug_assert!(
        value.checked_add_signed(delta).is_some(),
        "count {value} cannot shift by {delta}"
    );
    value.wrapping_add_signed(delta)
}

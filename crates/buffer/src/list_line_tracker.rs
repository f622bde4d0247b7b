// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing

//! Line tracker backed by a sorted line table.
//!
//! Keeps one entry per line with its absolute start offset, so lookups are a
//! binary search and line access is O(1). Edits splice the affected entries
//! and shift every following start offset, which is O(n) in the number of
//! lines. Good enough for small documents and a handy reference for the tree.

use crate::delimiter::{DefaultDelimiterScanner, Delimiter, DelimiterScanner};
use crate::error::{BufferError, Result};
use crate::line_tracker::{bad_location, shift, LineTracker};
use crate::types::Region;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    /// Offset of the first char of the line.
    offset: usize,
    /// Length including the delimiter.
    length: usize,
    delimiter: Option<Delimiter>,
}

impl Line {
    fn end(&self) -> usize {
        self.offset + self.length
    }

    fn pure_length(&self) -> usize {
        self.length - self.delimiter.as_ref().map_or(0, Delimiter::char_len)
    }
}

/// Tracks line boundaries in a sorted table of lines.
///
/// `lines[0].offset == 0` always, and the table is never empty.
#[derive(Debug)]
pub struct ListLineTracker {
    lines: Vec<Line>,
    scanner: Box<dyn DelimiterScanner>,
}

impl ListLineTracker {
    /// Creates a tracker for the empty text using `\r`, `\n` and `\r\n`.
    pub fn new() -> Self {
        Self::with_scanner(Box::new(DefaultDelimiterScanner::new()))
    }

    pub fn with_scanner(scanner: Box<dyn DelimiterScanner>) -> Self {
        Self {
            lines: vec![Line {
                offset: 0,
                length: 0,
                delimiter: None,
            }],
            scanner,
        }
    }

    fn line(&self, line: usize) -> Result<&Line> {
        self.lines.get(line).ok_or(BufferError::BadLine {
            line,
            lines: self.lines.len(),
        })
    }

    /// Index of the line containing `offset`, assuming `offset <= len`.
    fn index_of(&self, offset: usize) -> usize {
        self.lines
            .partition_point(|line| line.offset <= offset)
            .saturating_sub(1)
    }

    /// Splits `text` into lines, the first continuing `head` chars already in
    /// place at `start`, the last followed by `tail` chars ending in
    /// `tail_delimiter`.
    fn split_lines(
        &self,
        start: usize,
        head: usize,
        text: &[char],
        tail: usize,
        tail_delimiter: Option<Delimiter>,
    ) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut offset = start;
        let mut pending = head;
        let mut consumed = 0;
        while let Some(found) = self.scanner.next_delimiter(text, consumed) {
            let length = pending + found.end() - consumed;
            lines.push(Line {
                offset,
                length,
                delimiter: Some(found.delimiter.clone()),
            });
            offset += length;
            pending = 0;
            consumed = found.end();
        }
        let length = pending + text.len() - consumed + tail;
        // A delimited line cannot be empty; its remains were consumed.
        if length > 0 || tail_delimiter.is_none() {
            lines.push(Line {
                offset,
                length,
                delimiter: tail_delimiter,
            });
        }
        lines
    }
}

impl Default for ListLineTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LineTracker for ListLineTracker {
    fn scanner(&self) -> &dyn DelimiterScanner {
        self.scanner.as_ref()
    }

    fn len(&self) -> usize {
        self.lines.last().map_or(0, Line::end)
    }

    fn number_of_lines(&self) -> usize {
        self.lines.len()
    }

    fn line_number_of_offset(&self, offset: usize) -> Result<usize> {
        if offset > self.len() {
            return Err(bad_location(offset, 0, self.len()));
        }
        Ok(self.index_of(offset))
    }

    fn line_information_of_offset(&self, offset: usize) -> Result<Region> {
        let line = &self.lines[self.line_number_of_offset(offset)?];
        Ok(Region::new(line.offset, line.pure_length()))
    }

    fn line_offset(&self, line: usize) -> Result<usize> {
        self.line(line).map(|line| line.offset)
    }

    fn line_length(&self, line: usize) -> Result<usize> {
        self.line(line).map(|line| line.length)
    }

    fn line_delimiter(&self, line: usize) -> Result<Option<Delimiter>> {
        self.line(line).map(|line| line.delimiter.clone())
    }

    fn line_information(&self, line: usize) -> Result<Region> {
        self.line(line)
            .map(|line| Region::new(line.offset, line.pure_length()))
    }

    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<()> {
        let len = self.len();
        let end = match offset.checked_add(length) {
            Some(end) if end <= len => end,
            _ => return Err(bad_location(offset, length, len)),
        };

        let first = self.index_of(offset);
        let last = if end < self.lines[first].end() {
            first
        } else {
            self.index_of(end)
        };

        let text: Vec<char> = text.chars().collect();
        let start = self.lines[first].offset;
        let tail = self.lines[last].end() - end;
        let tail_delimiter = self.lines[last].delimiter.clone();
        let replacement = self.split_lines(start, offset - start, &text, tail, tail_delimiter);

        let added = replacement.len();
        self.lines.splice(first..=last, replacement);
        let delta = text.len() as isize - length as isize;
        for line in &mut self.lines[first + added..] {
            line.offset = shift(line.offset, delta);
        }
        Ok(())
    }

    fn set(&mut self, text: &str) {
        let text: Vec<char> = text.chars().collect();
        self.lines = self.split_lines(0, 0, &text, 0, None);
    }
}

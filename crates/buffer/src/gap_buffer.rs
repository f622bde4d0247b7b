// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing

//! Gap buffer implementation for efficient text editing.
//!
//! A gap buffer is a character array with one unused region (the gap) that
//! follows the most recent edit. Edits near the gap only touch the gap edges;
//! edits elsewhere move the gap, reallocating the array with fresh slack.
//!
//! Two watermarks govern the gap size. While an edit lands on the gap and
//! leaves between `low_watermark` and `high_watermark` free slots, it is done
//! in place. Otherwise the array is rebuilt with a gap of `high_watermark`
//! slots (adjusted by the size change of the edit) at the edit point.

use crate::config::GapConfig;
use crate::error::Result;
use crate::text_store::TextStore;

/// A gap buffer for efficient text storage and manipulation.
#[derive(Debug, Clone)]
pub struct GapTextStore {
    /// The underlying storage. Contains [pre-gap content | gap | post-gap content].
    content: Vec<char>,
    /// Index where the gap starts (first unused position).
    gap_start: usize,
    /// Index where the gap ends (first used position after gap).
    gap_end: usize,
    low_watermark: usize,
    high_watermark: usize,
}

impl GapTextStore {
    /// Creates an empty store with the default watermarks.
    pub fn new() -> Self {
        Self::from_config(&GapConfig::default())
    }

    /// Creates an empty store with the given watermarks.
    ///
    /// `low_watermark` must not exceed `high_watermark`.
    pub fn with_watermarks(low_watermark: usize, high_watermark: usize) -> Self {
        debug_assert!(low_watermark <= high_watermark);
        Self {
            content: Vec::new(),
            gap_start: 0,
            gap_end: 0,
            low_watermark,
            high_watermark,
        }
    }

    pub fn from_config(config: &GapConfig) -> Self {
        Self::with_watermarks(config.low_watermark, config.high_watermark)
    }

    /// Returns the current gap size.
    fn gap_len(&self) -> usize {
        self.gap_end - self.gap_start
    }

    /// Returns the gap window in physical coordinates.
    #[cfg(test)]
    fn gap(&self) -> (usize, usize) {
        (self.gap_start, self.gap_end)
    }

    /// Returns an iterator over all characters in the buffer.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.content[..self.gap_start]
            .iter()
            .chain(self.content[self.gap_end..].iter())
            .copied()
    }

    /// Makes sure the gap starts at `offset` with room for `size_hint` more
    /// chars (negative when the edit shrinks the text).
    fn adjust_gap(&mut self, offset: usize, size_hint: isize) {
        if offset == self.gap_start {
            let size = self.gap_len() as isize - size_hint;
            if self.low_watermark as isize <= size && size <= self.high_watermark as isize {
                return;
            }
        }
        self.move_and_resize_gap(offset, size_hint);
    }

    /// Rebuilds the content array with the gap at `offset`.
    fn move_and_resize_gap(&mut self, offset: usize, size_hint: isize) {
        let old_size = self.gap_len();
        let new_size = self.high_watermark as isize + size_hint;

        tracing::trace!(
            offset,
            old_gap = old_size,
            new_gap = new_size.max(0),
            "reallocating gap"
        );

        if new_size < 0 {
            // No slack needed: collapse the gap and leave an empty one at `offset`.
            self.content.drain(self.gap_start..self.gap_end);
            self.gap_start = offset;
            self.gap_end = offset;
            return;
        }

        let new_size = new_size as usize;
        let mut content = vec!['\0'; self.content.len() - old_size + new_size];
        let new_gap_start = offset;
        let new_gap_end = new_gap_start + new_size;

        if old_size == 0 {
            content[..new_gap_start].copy_from_slice(&self.content[..new_gap_start]);
            content[new_gap_end..].copy_from_slice(&self.content[new_gap_start..]);
        } else if new_gap_start < self.gap_start {
            let delta = self.gap_start - new_gap_start;
            content[..new_gap_start].copy_from_slice(&self.content[..new_gap_start]);
            content[new_gap_end..new_gap_end + delta]
                .copy_from_slice(&self.content[new_gap_start..self.gap_start]);
            content[new_gap_end + delta..].copy_from_slice(&self.content[self.gap_end..]);
        } else {
            let delta = new_gap_start - self.gap_start;
            content[..self.gap_start].copy_from_slice(&self.content[..self.gap_start]);
            content[self.gap_start..self.gap_start + delta]
                .copy_from_slice(&self.content[self.gap_end..self.gap_end + delta]);
            content[new_gap_end..].copy_from_slice(&self.content[self.gap_end + delta..]);
        }

        self.content = content;
        self.gap_start = new_gap_start;
        self.gap_end = new_gap_end;
    }
}

impl Default for GapTextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TextStore for GapTextStore {
    fn char_at(&self, offset: usize) -> char {
        if offset < self.gap_start {
            self.content[offset]
        } else {
            self.content[offset + self.gap_len()]
        }
    }

    fn get(&self, offset: usize, length: usize) -> String {
        let end = offset + length;
        if end <= self.gap_start {
            return self.content[offset..end].iter().collect();
        }
        let gap = self.gap_len();
        if self.gap_start <= offset {
            return self.content[offset + gap..end + gap].iter().collect();
        }
        // The range straddles the gap.
        self.content[offset..self.gap_start]
            .iter()
            .chain(&self.content[self.gap_end..end + gap])
            .collect()
    }

    fn len(&self) -> usize {
        self.content.len() - self.gap_len()
    }

    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<()> {
        let text: Vec<char> = text.chars().collect();
        let text_len = text.len();

        // Deletion touching the gap: just widen the gap.
        if text_len == 0 && offset <= self.gap_start && offset + length >= self.gap_start {
            let after_gap = offset + length - self.gap_start;
            self.gap_start = offset;
            self.gap_end += after_gap;
            return Ok(());
        }

        self.adjust_gap(offset + length, text_len as isize - length as isize);

        // The replaced chars now sit right before the gap; overwrite them.
        let common = text_len.min(length);
        self.content[offset..offset + common].copy_from_slice(&text[..common]);

        if length > text_len {
            self.gap_start -= length - text_len;
        } else if text_len > length {
            self.content[offset + length..offset + text_len].copy_from_slice(&text[length..]);
            self.gap_start += text_len - length;
        }
        Ok(())
    }

    fn set(&mut self, text: &str) -> Result<()> {
        // Locality of the next edit is unknown, so keep no gap at all.
        self.content = text.chars().collect();
        self.gap_start = self.content.len();
        self.gap_end = self.content.len();
        Ok(())
    }
}

impl std::fmt::Display for GapTextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for ch in self.chars() {
            write!(f, "{}", ch)?;
        }
        Ok(())
    }
}

// Chunk: docs/chunks/rewrite_sessions - Batched rewrite sessions

//! Text store used while a sequential rewrite session is active.
//!
//! A sequential rewrite walks the document front to back (or back to front),
//! replacing ranges that never overlap. Instead of editing the source store
//! each time, [`SequentialRewriteTextStore`] keeps the replacements as an
//! ordered list and answers reads by interleaving source text with replacement
//! text. The list is folded into the source in one pass when the session ends.

use std::collections::VecDeque;

use crate::error::{BufferError, Result};
use crate::text_store::TextStore;

/// One recorded replacement.
#[derive(Debug, Clone)]
struct Replace {
    /// Offset in the source store.
    offset: usize,
    /// Offset in the rewritten text.
    new_offset: usize,
    /// Number of source chars replaced.
    length: usize,
    text: Vec<char>,
}

impl Replace {
    /// Rewritten-minus-source offset for text after this replacement.
    fn delta(&self) -> isize {
        self.new_offset as isize - self.offset as isize + self.text.len() as isize
            - self.length as isize
    }

    fn new_end(&self) -> usize {
        self.new_offset + self.text.len()
    }
}

/// Where an edit falls relative to the recorded replacements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Before,
    After,
    OutOfOrder,
}

fn source_offset(offset: usize, delta: isize) -> usize {
    offset.wrapping_add_signed(-delta)
}

/// Records ordered replacements on top of a source store.
#[derive(Debug)]
pub struct SequentialRewriteTextStore {
    replaces: VecDeque<Replace>,
    source: Box<dyn TextStore>,
    strict: bool,
}

impl SequentialRewriteTextStore {
    /// Wraps `source`. With `strict`, an edit that is neither before the first
    /// nor after the last recorded replacement is rejected instead of flushing.
    pub fn new(source: Box<dyn TextStore>, strict: bool) -> Self {
        Self {
            replaces: VecDeque::new(),
            source,
            strict,
        }
    }

    /// Number of replacements not yet applied to the source.
    pub fn pending(&self) -> usize {
        self.replaces.len()
    }

    /// Applies all recorded replacements to the source and returns it.
    pub fn into_source(mut self) -> Result<Box<dyn TextStore>> {
        self.commit()?;
        Ok(self.source)
    }

    /// Fails with [`BufferError::NotSequential`] if a strict store would
    /// reject replacing `length` chars at `offset`.
    pub fn check_order(&self, offset: usize, length: usize) -> Result<()> {
        if self.strict && self.placement(offset, length) == Placement::OutOfOrder {
            return Err(BufferError::NotSequential { offset });
        }
        Ok(())
    }

    fn placement(&self, offset: usize, length: usize) -> Placement {
        let (Some(first), Some(last)) = (self.replaces.front(), self.replaces.back()) else {
            return Placement::After;
        };
        if offset + length <= first.new_offset {
            Placement::Before
        } else if offset >= last.new_end() {
            Placement::After
        } else {
            Placement::OutOfOrder
        }
    }

    /// Folds the recorded replacements into the source store.
    pub fn commit(&mut self) -> Result<()> {
        if self.replaces.is_empty() {
            return Ok(());
        }
        let mut text = String::with_capacity(self.len());
        let mut position = 0;
        for replace in self.replaces.drain(..) {
            text.push_str(&self.source.get(position, replace.offset - position));
            text.extend(&replace.text);
            position = replace.offset + replace.length;
        }
        text.push_str(&self.source.get(position, self.source.len() - position));
        self.source.set(&text)
    }
}

impl TextStore for SequentialRewriteTextStore {
    fn char_at(&self, offset: usize) -> char {
        let mut delta = 0;
        for replace in &self.replaces {
            if offset < replace.new_offset {
                break;
            }
            if offset < replace.new_end() {
                return replace.text[offset - replace.new_offset];
            }
            delta = replace.delta();
        }
        self.source.char_at(source_offset(offset, delta))
    }

    fn get(&self, offset: usize, length: usize) -> String {
        if self.replaces.is_empty() {
            return self.source.get(offset, length);
        }
        let end = offset + length;
        let mut out = String::with_capacity(length);
        let mut position = offset;
        let mut delta = 0;
        for replace in &self.replaces {
            if position >= end {
                break;
            }
            if position < replace.new_offset {
                let until = end.min(replace.new_offset);
                out.push_str(
                    &self
                        .source
                        .get(source_offset(position, delta), until - position),
                );
                position = until;
            }
            if position < end && position < replace.new_end() {
                let until = end.min(replace.new_end());
                out.extend(
                    &replace.text[position - replace.new_offset..until - replace.new_offset],
                );
                position = until;
            }
            delta = replace.delta();
        }
        if position < end {
            out.push_str(&self.source.get(source_offset(position, delta), end - position));
        }
        out
    }

    fn len(&self) -> usize {
        let delta = self.replaces.back().map_or(0, Replace::delta);
        self.source.len().wrapping_add_signed(delta)
    }

    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<()> {
        let text: Vec<char> = text.chars().collect();
        match self.placement(offset, length) {
            Placement::Before => {
                // Everything recorded shifts by the size change.
                let shift = text.len() as isize - length as isize;
                for replace in &mut self.replaces {
                    replace.new_offset = replace.new_offset.wrapping_add_signed(shift);
                }
                self.replaces.push_front(Replace {
                    offset,
                    new_offset: offset,
                    length,
                    text,
                });
            }
            Placement::After => {
                let delta = self.replaces.back().map_or(0, Replace::delta);
                self.replaces.push_back(Replace {
                    offset: source_offset(offset, delta),
                    new_offset: offset,
                    length,
                    text,
                });
            }
            Placement::OutOfOrder if self.strict => {
                return Err(BufferError::NotSequential { offset });
            }
            Placement::OutOfOrder => {
                tracing::debug!(offset, "non-sequential edit, committing rewrite");
                self.commit()?;
                let text: String = text.into_iter().collect();
                self.source.replace(offset, length, &text)?;
            }
        }
        Ok(())
    }

    fn set(&mut self, text: &str) -> Result<()> {
        self.replaces.clear();
        self.source.set(text)
    }
}

// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing

//! Character storage abstraction.
//!
//! A [`TextStore`] holds the raw characters of a document. Stores do not
//! validate offsets: the document checks every range before calling in, and
//! out-of-range access on a store panics on slice indexing.

use std::fmt;

use crate::error::{BufferError, Result};

/// Raw character storage addressed by char offsets.
pub trait TextStore: fmt::Debug + Send {
    /// Returns the char at `offset`.
    fn char_at(&self, offset: usize) -> char;

    /// Returns the `length` chars starting at `offset`.
    fn get(&self, offset: usize, length: usize) -> String;

    /// Number of chars stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces `length` chars at `offset` with `text`.
    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<()>;

    /// Replaces the whole content with `text`.
    fn set(&mut self, text: &str) -> Result<()>;
}

/// An unmodifiable store backed by a char slice.
///
/// Reads are constant time. [`TextStore::replace`] and [`TextStore::set`]
/// fail with [`BufferError::Unsupported`].
#[derive(Debug, Clone, Default)]
pub struct StringTextStore {
    text: Box<[char]>,
}

impl StringTextStore {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.chars().collect(),
        }
    }

    pub(crate) fn chars(&self) -> &[char] {
        &self.text
    }
}

impl TextStore for StringTextStore {
    fn char_at(&self, offset: usize) -> char {
        self.text[offset]
    }

    fn get(&self, offset: usize, length: usize) -> String {
        self.text[offset..offset + length].iter().collect()
    }

    fn len(&self) -> usize {
        self.text.len()
    }

    fn replace(&mut self, _offset: usize, _length: usize, _text: &str) -> Result<()> {
        Err(BufferError::Unsupported("replace on an unmodifiable text store"))
    }

    fn set(&mut self, _text: &str) -> Result<()> {
        Err(BufferError::Unsupported("set on an unmodifiable text store"))
    }
}

impl fmt::Display for StringTextStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.text.iter().try_for_each(|ch| write!(f, "{ch}"))
    }
}

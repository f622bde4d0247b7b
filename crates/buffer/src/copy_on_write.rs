// Chunk: docs/chunks/copy_on_write_store - Lazily allocated mutable text store

//! Copy-on-write text store.
//!
//! Many buffers are filled once, read and dropped without ever being edited.
//! [`CopyOnWriteTextStore`] serves those from an unmodifiable snapshot and
//! only fills the mutable store when the first `replace` arrives.

use crate::error::Result;
use crate::gap_buffer::GapTextStore;
use crate::text_store::{StringTextStore, TextStore};

/// A store that starts as a read-only snapshot and switches to a mutable
/// store `S` on the first `replace`.
#[derive(Debug)]
pub struct CopyOnWriteTextStore<S = GapTextStore> {
    /// `Some` until the first `replace` after construction or `set`.
    snapshot: Option<StringTextStore>,
    modifiable: S,
}

impl<S: TextStore> CopyOnWriteTextStore<S> {
    /// Wraps `modifiable`; the store starts as an empty snapshot.
    pub fn new(modifiable: S) -> Self {
        Self {
            snapshot: Some(StringTextStore::default()),
            modifiable,
        }
    }

    /// Wraps `modifiable`, serving `text` from a snapshot until the first edit.
    pub fn with_text(modifiable: S, text: &str) -> Self {
        Self {
            snapshot: Some(StringTextStore::new(text)),
            modifiable,
        }
    }

    /// Returns true while reads are still served from the snapshot.
    pub fn is_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    fn current(&self) -> &dyn TextStore {
        match &self.snapshot {
            Some(snapshot) => snapshot,
            None => &self.modifiable,
        }
    }
}

impl Default for CopyOnWriteTextStore<GapTextStore> {
    fn default() -> Self {
        Self::new(GapTextStore::new())
    }
}

impl<S: TextStore> TextStore for CopyOnWriteTextStore<S> {
    fn char_at(&self, offset: usize) -> char {
        self.current().char_at(offset)
    }

    fn get(&self, offset: usize, length: usize) -> String {
        self.current().get(offset, length)
    }

    fn len(&self) -> usize {
        self.current().len()
    }

    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<()> {
        if let Some(snapshot) = self.snapshot.take() {
            let content: String = snapshot.chars().iter().collect();
            if let Err(err) = self.modifiable.set(&content) {
                self.snapshot = Some(snapshot);
                return Err(err);
            }
        }
        self.modifiable.replace(offset, length, text)
    }

    fn set(&mut self, text: &str) -> Result<()> {
        self.modifiable.set("")?;
        self.snapshot = Some(StringTextStore::new(text));
        Ok(())
    }
}

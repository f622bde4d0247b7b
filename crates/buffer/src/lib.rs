// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing

//! lite-text-buffer: an incremental text buffer engine.
//!
//! This crate stores a document's characters in a gap buffer and tracks its
//! line structure in a differential AVL tree, so that offset↔line queries and
//! edits stay O(log n) no matter how large the document grows.
//!
//! # Overview
//!
//! The main type is [`Document`], which provides:
//! - Range replacement and whole-text replacement
//! - Line queries by offset or by line number
//! - Dirty line reporting to minimize redraws
//! - Before/after edit notifications to [`DocumentListener`]s
//! - Rewrite sessions that defer line tracking during bulk edits
//!
//! The building blocks are public too: [`GapTextStore`],
//! [`CopyOnWriteTextStore`] and [`SequentialRewriteTextStore`] implement
//! [`TextStore`]; [`TreeLineTracker`] and [`ListLineTracker`] implement
//! [`LineTracker`]; delimiter recognition is pluggable via
//! [`DelimiterScanner`].
//!
//! # Example
//!
//! ```
//! use lite_text_buffer::{DirtyLines, Document, Region};
//!
//! let mut doc = Document::from_str("Hello, world!");
//! assert_eq!(doc.number_of_lines().unwrap(), 1);
//!
//! // Split into multiple lines
//! let dirty = doc.replace(6, 1, "\n").unwrap();
//! assert_eq!(dirty, DirtyLines::FromLineToEnd(0));
//! assert_eq!(doc.number_of_lines().unwrap(), 2);
//! assert_eq!(doc.line_information(1).unwrap(), Region::new(7, 6));
//! assert_eq!(doc.line_content(1).unwrap(), "world!");
//! ```
//!
//! # Dirty Line Tracking
//!
//! Each mutation returns a [`DirtyLines`] value indicating which lines were
//! affected:
//!
//! - `DirtyLines::None` - No report (the edit was queued by a rewrite session)
//! - `DirtyLines::Single(line)` - Only one line changed
//! - `DirtyLines::Range { from, to }` - Lines `[from, to)` changed in place
//! - `DirtyLines::FromLineToEnd(line)` - All lines from `line` to the end changed
//!   (used when lines are split or joined)

mod config;
mod copy_on_write;
mod delimiter;
mod document;
mod error;
mod event;
mod gap_buffer;
mod line_tracker;
mod list_line_tracker;
mod sequential_store;
mod text_store;
mod tree_line_tracker;
mod types;

pub use config::{BufferConfig, GapConfig, TrackerKind};
pub use copy_on_write::CopyOnWriteTextStore;
pub use delimiter::{
    ConfigurableDelimiterScanner, DefaultDelimiterScanner, Delimiter, DelimiterMatch,
    DelimiterScanner,
};
pub use document::Document;
pub use error::{BufferError, Result};
pub use event::{
    DocumentEvent, DocumentListener, ListenerId, RewriteSession, RewriteSessionEvent,
    RewriteSessionType,
};
pub use gap_buffer::GapTextStore;
pub use line_tracker::LineTracker;
pub use list_line_tracker::ListLineTracker;
pub use sequential_store::SequentialRewriteTextStore;
pub use text_store::{StringTextStore, TextStore};
pub use tree_line_tracker::TreeLineTracker;
pub use types::{DirtyLines, Position, Region};

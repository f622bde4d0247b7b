// Chunk: docs/chunks/document_events - Edit notifications and rewrite session tokens

//! Change notifications delivered to [`DocumentListener`]s.

use std::fmt;

/// Describes one edit: `length` chars at `offset` replaced by `text`.
///
/// Offsets are those the caller passed to the document, before the edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEvent {
    pub offset: usize,
    pub length: usize,
    pub text: String,
    /// Modification stamp of the document once the edit is applied.
    pub modification_stamp: u64,
}

/// The flavours of rewrite session.
///
/// All kinds except [`RewriteSessionType::UnrestrictedSmall`] defer line
/// tracking until the session ends. The sequential kinds additionally record
/// edits instead of applying them to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewriteSessionType {
    /// Arbitrary edits anywhere in the document.
    Unrestricted,
    /// Arbitrary edits, few enough that lines keep being tracked per edit.
    UnrestrictedSmall,
    /// Non-overlapping edits walking in one direction; out-of-order edits
    /// fall back to applying everything recorded so far.
    Sequential,
    /// Like [`RewriteSessionType::Sequential`] but out-of-order edits fail.
    StrictlySequential,
}

impl RewriteSessionType {
    /// Returns true if line tracking is postponed while the session runs.
    pub fn defers_line_tracking(self) -> bool {
        !matches!(self, RewriteSessionType::UnrestrictedSmall)
    }

    /// Returns true if edits are recorded by a sequential store.
    pub fn is_sequential(self) -> bool {
        matches!(
            self,
            RewriteSessionType::Sequential | RewriteSessionType::StrictlySequential
        )
    }
}

/// Token for an active rewrite session, returned by
/// [`Document::start_rewrite_session`](crate::Document::start_rewrite_session).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RewriteSession {
    id: u64,
    kind: RewriteSessionType,
}

impl RewriteSession {
    pub(crate) fn new(id: u64, kind: RewriteSessionType) -> Self {
        Self { id, kind }
    }

    pub fn kind(&self) -> RewriteSessionType {
        self.kind
    }
}

/// Session lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteSessionEvent {
    Started(RewriteSession),
    Stopped(RewriteSession),
}

/// Identifies a registered listener for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Receives edit and session notifications from a document.
///
/// Listeners are called synchronously, in registration order, from inside
/// the edit. They cannot reach back into the document.
pub trait DocumentListener: fmt::Debug + Send {
    /// Called before the edit touches the store.
    fn document_about_to_be_changed(&mut self, event: &DocumentEvent);

    /// Called after both the store and the line tracker were updated (or the
    /// tracker update was queued by a rewrite session).
    fn document_changed(&mut self, event: &DocumentEvent);

    fn rewrite_session_changed(&mut self, _event: &RewriteSessionEvent) {}
}

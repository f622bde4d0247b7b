// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing
// Chunk: docs/chunks/rewrite_sessions - Batched rewrite sessions

//! Document is the main public API for text editing operations.
//!
//! It combines a [`TextStore`] (character storage) with a [`LineTracker`]
//! (line boundaries) and keeps the two in sync on every edit. Listeners are
//! told about each edit before and after it lands.
//!
//! Each mutation returns [`DirtyLines`] describing which lines changed,
//! enabling downstream rendering to minimize redraws.
//!
//! # Rewrite sessions
//!
//! A caller about to issue many edits where only the final text matters can
//! start a rewrite session. Line tracking is then deferred: edits are queued
//! and the tracker is rebuilt once from the final text when the session
//! stops. Line queries made while edits are queued fail with
//! [`BufferError::PendingRewrite`] until [`Document::flush_rewrite_session`]
//! replays the queue.

use std::sync::{Arc, Mutex};

use crate::config::{BufferConfig, TrackerKind};
use crate::copy_on_write::CopyOnWriteTextStore;
use crate::delimiter::{
    ConfigurableDelimiterScanner, DefaultDelimiterScanner, Delimiter, DelimiterScanner,
};
use crate::error::{BufferError, Result};
use crate::event::{
    DocumentEvent, DocumentListener, ListenerId, RewriteSession, RewriteSessionEvent,
    RewriteSessionType,
};
use crate::gap_buffer::GapTextStore;
use crate::line_tracker::{bad_location, LineTracker};
use crate::list_line_tracker::ListLineTracker;
use crate::sequential_store::SequentialRewriteTextStore;
use crate::text_store::{StringTextStore, TextStore};
use crate::tree_line_tracker::TreeLineTracker;
use crate::types::{DirtyLines, Position, Region};

/// The store a document edits, wrapped while a sequential session runs.
#[derive(Debug)]
enum Storage {
    Direct(Box<dyn TextStore>),
    Sequential(SequentialRewriteTextStore),
}

/// A tracker request held back by a rewrite session.
#[derive(Debug)]
enum PendingEdit {
    Replace {
        offset: usize,
        length: usize,
        text: String,
    },
    Set(String),
}

#[derive(Debug)]
struct ActiveSession {
    token: RewriteSession,
    /// False once the session was flushed or for small sessions.
    deferring: bool,
    pending: Vec<PendingEdit>,
}

/// A text document: character storage plus line tracking.
#[derive(Debug)]
pub struct Document {
    store: Storage,
    tracker: Box<dyn LineTracker>,
    listeners: Vec<(ListenerId, Box<dyn DocumentListener>)>,
    next_listener_id: u64,
    modification_stamp: u64,
    session: Option<ActiveSession>,
    next_session_id: u64,
    lock_object: Option<Arc<Mutex<()>>>,
    legacy_last_line_region: bool,
    /// Mutation counter for sampling debug assertions (debug builds only).
    #[cfg(debug_assertions)]
    debug_mutation_count: u64,
}

impl Document {
    /// Creates an empty document with a copy-on-write gap buffer and a tree
    /// line tracker.
    pub fn new() -> Self {
        Self::with_parts(
            Box::new(CopyOnWriteTextStore::<GapTextStore>::default()),
            Box::new(TreeLineTracker::new()),
        )
    }

    /// Creates a document initialized with the given content.
    ///
    /// Note: We don't implement `FromStr` because it requires returning `Result`,
    /// but building a document from a string cannot fail.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Self {
        Self::with_parts(
            Box::new(CopyOnWriteTextStore::with_text(GapTextStore::new(), content)),
            Box::new(TreeLineTracker::new()),
        )
    }

    /// Builds a document from `config`.
    pub fn with_config(config: &BufferConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            tracker = ?config.tracker,
            copy_on_write = config.copy_on_write,
            low_watermark = config.gap.low_watermark,
            high_watermark = config.gap.high_watermark,
            "building document from config"
        );

        let scanner: Box<dyn DelimiterScanner> = match &config.line_delimiters {
            Some(delimiters) => {
                Box::new(ConfigurableDelimiterScanner::new(delimiters.as_slice())?)
            }
            None => Box::new(DefaultDelimiterScanner::new()),
        };
        let tracker: Box<dyn LineTracker> = match config.tracker {
            TrackerKind::Tree => Box::new(TreeLineTracker::with_scanner(scanner)),
            TrackerKind::List => Box::new(ListLineTracker::with_scanner(scanner)),
        };
        let gap = GapTextStore::from_config(&config.gap);
        let store: Box<dyn TextStore> = if config.copy_on_write {
            Box::new(CopyOnWriteTextStore::new(gap))
        } else {
            Box::new(gap)
        };

        let mut document = Self::with_parts(store, tracker);
        document.legacy_last_line_region = config.legacy_last_line_region;
        Ok(document)
    }

    /// Assembles a document from a store and a tracker. The tracker is reset
    /// to the store's current content.
    pub fn with_parts(store: Box<dyn TextStore>, mut tracker: Box<dyn LineTracker>) -> Self {
        tracker.set(&store.get(0, store.len()));
        Self {
            store: Storage::Direct(store),
            tracker,
            listeners: Vec::new(),
            next_listener_id: 0,
            modification_stamp: 0,
            session: None,
            next_session_id: 0,
            lock_object: None,
            legacy_last_line_region: false,
            #[cfg(debug_assertions)]
            debug_mutation_count: 0,
        }
    }

    fn store(&self) -> &dyn TextStore {
        match &self.store {
            Storage::Direct(store) => store.as_ref(),
            Storage::Sequential(store) => store,
        }
    }

    fn store_mut(&mut self) -> &mut dyn TextStore {
        match &mut self.store {
            Storage::Direct(store) => store.as_mut(),
            Storage::Sequential(store) => store,
        }
    }

    // ==================== Text Access ====================

    /// Returns the total character count.
    pub fn len(&self) -> usize {
        self.store().len()
    }

    /// Returns true if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entire content as a String.
    pub fn get(&self) -> String {
        self.store().get(0, self.len())
    }

    /// Returns the `length` chars starting at `offset`.
    pub fn get_range(&self, offset: usize, length: usize) -> Result<String> {
        self.check_range(offset, length)?;
        Ok(self.store().get(offset, length))
    }

    pub fn char_at(&self, offset: usize) -> Result<char> {
        if offset >= self.len() {
            return Err(bad_location(offset, 1, self.len()));
        }
        Ok(self.store().char_at(offset))
    }

    fn check_range(&self, offset: usize, length: usize) -> Result<usize> {
        let len = self.len();
        match offset.checked_add(length) {
            Some(end) if end <= len => Ok(end),
            _ => Err(bad_location(offset, length, len)),
        }
    }

    // ==================== Lines ====================

    /// The tracker, unless line updates are queued by a rewrite session.
    fn lines(&self) -> Result<&dyn LineTracker> {
        match &self.session {
            Some(session) if !session.pending.is_empty() => Err(BufferError::PendingRewrite),
            _ => Ok(self.tracker.as_ref()),
        }
    }

    /// Returns the number of lines. Always at least 1.
    pub fn number_of_lines(&self) -> Result<usize> {
        Ok(self.lines()?.number_of_lines())
    }

    /// Number of lines touched by `[offset, offset + length)`.
    pub fn number_of_lines_in(&self, offset: usize, length: usize) -> Result<usize> {
        self.check_range(offset, length)?;
        self.lines()?.number_of_lines_in(offset, length)
    }

    pub fn line_number_of_offset(&self, offset: usize) -> Result<usize> {
        self.lines()?.line_number_of_offset(offset)
    }

    /// Offset and length (without delimiter) of the line containing `offset`.
    pub fn line_information_of_offset(&self, offset: usize) -> Result<Region> {
        self.lines()?.line_information_of_offset(offset)
    }

    pub fn line_offset(&self, line: usize) -> Result<usize> {
        self.lines()?.line_offset(line)
    }

    /// Length of `line` including its delimiter.
    pub fn line_length(&self, line: usize) -> Result<usize> {
        self.lines()?.line_length(line)
    }

    pub fn line_delimiter(&self, line: usize) -> Result<Option<Delimiter>> {
        self.lines()?.line_delimiter(line)
    }

    /// Offset and length (without delimiter) of `line`.
    ///
    /// With `legacy_last_line_region` enabled, asking for the line just past
    /// the end yields an empty region at the end of the text when the last
    /// line is not empty.
    pub fn line_information(&self, line: usize) -> Result<Region> {
        let lines = self.lines()?;
        let result = lines.line_information(line);
        if let Err(BufferError::BadLine { .. }) = result {
            if self.legacy_last_line_region
                && line > 0
                && line == lines.number_of_lines()
                && lines.line_length(line - 1)? > 0
            {
                return Ok(Region::new(lines.len(), 0));
            }
        }
        result
    }

    /// Returns the content of `line` without its delimiter.
    pub fn line_content(&self, line: usize) -> Result<String> {
        let region = self.lines()?.line_information(line)?;
        Ok(self.store().get(region.offset, region.length))
    }

    pub fn position_of_offset(&self, offset: usize) -> Result<Position> {
        let region = self.lines()?.line_information_of_offset(offset)?;
        let line = self.lines()?.line_number_of_offset(offset)?;
        Ok(Position::new(line, offset - region.offset))
    }

    /// Converts a position to an offset. The column may point at the end of
    /// the line but not into its delimiter.
    pub fn offset_of_position(&self, position: Position) -> Result<usize> {
        let region = self.lines()?.line_information(position.line)?;
        if position.col > region.length {
            return Err(bad_location(region.offset + position.col, 0, self.len()));
        }
        Ok(region.offset + position.col)
    }

    pub fn legal_line_delimiters(&self) -> &[Delimiter] {
        self.tracker.legal_line_delimiters()
    }

    /// Number of delimiters in `text`.
    pub fn compute_number_of_lines(&self, text: &str) -> usize {
        self.tracker.compute_number_of_lines(text)
    }

    /// The delimiter new lines should use: the one ending the first line,
    /// otherwise `\n` if legal, otherwise the first legal delimiter.
    ///
    /// While a rewrite session has queued edits the first line is found by
    /// scanning the text instead of asking the stale tracker.
    pub fn default_line_delimiter(&self) -> Delimiter {
        let first = match self.lines() {
            Ok(lines) => lines.line_delimiter(0).ok().flatten(),
            Err(_) => {
                let content: Vec<char> = self.get().chars().collect();
                self.tracker
                    .scanner()
                    .next_delimiter(&content, 0)
                    .map(|found| found.delimiter)
            }
        };
        if let Some(delimiter) = first {
            return delimiter;
        }
        let legal = self.legal_line_delimiters();
        legal
            .iter()
            .find(|delimiter| delimiter.as_str() == "\n")
            .or_else(|| legal.first())
            .cloned()
            .unwrap_or_else(|| Delimiter::new("\n"))
    }

    // ==================== Mutations ====================

    /// Replaces `length` chars at `offset` with `text`.
    ///
    /// Returns the lines that changed, or [`DirtyLines::None`] while a
    /// rewrite session defers line tracking.
    pub fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<DirtyLines> {
        let end = self.check_range(offset, length)?;
        if let Storage::Sequential(store) = &self.store {
            store.check_order(offset, length)?;
        }
        let inserted = text.chars().count();
        tracing::trace!(offset, length, inserted, "replace");

        // Widen the range so no delimiter straddles its edges once the new
        // text is in place.
        let (start, stitched_end) = self
            .tracker
            .scanner()
            .stitch_bounds(self.store(), offset, end);
        let first_line = if self.is_deferring() {
            0
        } else {
            self.tracker.line_number_of_offset(start)?
        };

        let event = DocumentEvent {
            offset,
            length,
            text: text.to_string(),
            modification_stamp: self.modification_stamp + 1,
        };
        self.fire(|listener| listener.document_about_to_be_changed(&event));

        self.store_mut().replace(offset, length, text)?;

        let new_end = stitched_end - length + inserted;
        let tracker_text = self.store().get(start, new_end - start);
        let dirty = match &mut self.session {
            Some(session) if session.deferring => {
                session.pending.push(PendingEdit::Replace {
                    offset: start,
                    length: stitched_end - start,
                    text: tracker_text,
                });
                DirtyLines::None
            }
            _ => {
                let lines_before = self.tracker.number_of_lines();
                self.tracker
                    .replace(start, stitched_end - start, &tracker_text)?;
                if self.tracker.number_of_lines() == lines_before {
                    // The widened end may reach into the next line; only the
                    // caller's range decides which lines changed.
                    let last_line = self.tracker.line_number_of_offset(offset + inserted)?;
                    if last_line > first_line {
                        DirtyLines::Range {
                            from: first_line,
                            to: last_line + 1,
                        }
                    } else {
                        DirtyLines::Single(first_line)
                    }
                } else {
                    DirtyLines::FromLineToEnd(first_line)
                }
            }
        };

        self.modification_stamp = event.modification_stamp;
        self.fire(|listener| listener.document_changed(&event));
        self.assert_lines_consistent();
        Ok(dirty)
    }

    /// Replaces the whole content with `text`.
    pub fn set(&mut self, text: &str) -> Result<DirtyLines> {
        tracing::trace!(len = text.chars().count(), "set");
        let event = DocumentEvent {
            offset: 0,
            length: self.len(),
            text: text.to_string(),
            modification_stamp: self.modification_stamp + 1,
        };
        self.fire(|listener| listener.document_about_to_be_changed(&event));

        self.store_mut().set(text)?;
        let dirty = match &mut self.session {
            Some(session) if session.deferring => {
                // Earlier queued edits are superseded by the new content.
                session.pending.clear();
                session.pending.push(PendingEdit::Set(text.to_string()));
                DirtyLines::None
            }
            _ => {
                self.tracker.set(text);
                DirtyLines::FromLineToEnd(0)
            }
        };

        self.modification_stamp = event.modification_stamp;
        self.fire(|listener| listener.document_changed(&event));
        self.assert_lines_consistent();
        Ok(dirty)
    }

    /// Monotonic counter bumped by every successful edit.
    pub fn modification_stamp(&self) -> u64 {
        self.modification_stamp
    }

    // ==================== Rewrite Sessions ====================

    fn is_deferring(&self) -> bool {
        self.session.as_ref().is_some_and(|session| session.deferring)
    }

    /// Returns the active rewrite session, if any.
    pub fn active_rewrite_session(&self) -> Option<&RewriteSession> {
        self.session.as_ref().map(|session| &session.token)
    }

    /// Starts a rewrite session of the given kind.
    ///
    /// Fails with [`BufferError::RewriteSessionActive`] if one is running.
    pub fn start_rewrite_session(&mut self, kind: RewriteSessionType) -> Result<RewriteSession> {
        if self.session.is_some() {
            return Err(BufferError::RewriteSessionActive);
        }
        self.next_session_id += 1;
        let token = RewriteSession::new(self.next_session_id, kind);
        tracing::debug!(?kind, "starting rewrite session");

        if kind.is_sequential() {
            let strict = kind == RewriteSessionType::StrictlySequential;
            let placeholder = Storage::Direct(Box::new(StringTextStore::default()));
            self.store = match std::mem::replace(&mut self.store, placeholder) {
                Storage::Direct(source) => {
                    Storage::Sequential(SequentialRewriteTextStore::new(source, strict))
                }
                sequential @ Storage::Sequential(_) => sequential,
            };
        }
        self.session = Some(ActiveSession {
            token: token.clone(),
            deferring: kind.defers_line_tracking(),
            pending: Vec::new(),
        });

        let event = RewriteSessionEvent::Started(token.clone());
        self.fire(|listener| listener.rewrite_session_changed(&event));
        Ok(token)
    }

    /// Applies the line updates queued by the active session so line queries
    /// work again. The rest of the session tracks lines per edit.
    pub fn flush_rewrite_session(&mut self) -> Result<()> {
        let Some(session) = &mut self.session else {
            return Ok(());
        };
        let pending = std::mem::take(&mut session.pending);
        session.deferring = false;
        tracing::debug!(queued = pending.len(), "flushing rewrite session");

        for edit in pending {
            match edit {
                PendingEdit::Replace {
                    offset,
                    length,
                    text,
                } => self.tracker.replace(offset, length, &text)?,
                PendingEdit::Set(text) => self.tracker.set(&text),
            }
        }
        Ok(())
    }

    /// Stops `session` and rebuilds line information from the final text.
    ///
    /// A token that is not the active session is ignored.
    pub fn stop_rewrite_session(&mut self, session: &RewriteSession) -> Result<DirtyLines> {
        if self.active_rewrite_session() != Some(session) {
            return Ok(DirtyLines::None);
        }

        if let Storage::Sequential(store) = &mut self.store {
            store.commit()?;
            let placeholder = Storage::Direct(Box::new(StringTextStore::default()));
            if let Storage::Sequential(store) = std::mem::replace(&mut self.store, placeholder) {
                self.store = Storage::Direct(store.into_source()?);
            }
        }

        let Some(active) = self.session.take() else {
            return Ok(DirtyLines::None);
        };
        tracing::debug!(
            kind = ?active.token.kind(),
            discarded = active.pending.len(),
            "stopping rewrite session"
        );
        let text = self.get();
        self.tracker.set(&text);

        let event = RewriteSessionEvent::Stopped(active.token);
        self.fire(|listener| listener.rewrite_session_changed(&event));
        Ok(DirtyLines::FromLineToEnd(0))
    }

    // ==================== Listeners ====================

    /// Registers `listener` and returns the id to remove it with.
    pub fn add_listener(&mut self, listener: Box<dyn DocumentListener>) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Unregisters and returns the listener, if it is still registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> Option<Box<dyn DocumentListener>> {
        let index = self.listeners.iter().position(|(other, _)| *other == id)?;
        Some(self.listeners.remove(index).1)
    }

    fn fire(&mut self, notify: impl Fn(&mut dyn DocumentListener)) {
        for (_, listener) in &mut self.listeners {
            notify(listener.as_mut());
        }
    }

    // ==================== Locking ====================

    /// Associates a lock that callers sharing this document agree to hold.
    /// The document itself never locks it.
    pub fn set_lock_object(&mut self, lock: Option<Arc<Mutex<()>>>) {
        self.lock_object = lock;
    }

    pub fn lock_object(&self) -> Option<Arc<Mutex<()>>> {
        self.lock_object.clone()
    }

    // ==================== Validation ====================

    /// Debug assertion: verifies that the incrementally maintained lines
    /// match a fresh scan of the content.
    ///
    /// Checks every 64th mutation so the O(n) scan doesn't dominate tight
    /// loops. Compiled out in release builds.
    #[cfg(debug_assertions)]
    fn assert_lines_consistent(&mut self) {
        self.debug_mutation_count += 1;
        if self.debug_mutation_count % 64 != 0 {
            return;
        }
        let Ok(lines) = self.lines() else {
            return;
        };
        let content: Vec<char> = self.get().chars().collect();
        let mut expected = Vec::new();
        let mut from = 0;
        while let Some(found) = lines.scanner().next_delimiter(&content, from) {
            expected.push((from, Some(found.delimiter.clone())));
            from = found.end();
        }
        expected.push((from, None));

        let actual: Vec<_> = (0..lines.number_of_lines())
            .map(|line| {
                (
                    lines.line_offset(line).unwrap_or(usize::MAX),
                    lines.line_delimiter(line).ok().flatten(),
                )
            })
            .collect();
        assert_eq!(
            actual, expected,
            "line tracker drift detected after {} mutations",
            self.debug_mutation_count
        );
    }

    #[cfg(not(debug_assertions))]
    fn assert_lines_consistent(&mut self) {}
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default)]
    struct Recorder {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl DocumentListener for Recorder {
        fn document_about_to_be_changed(&mut self, event: &DocumentEvent) {
            self.log.lock().unwrap().push(format!(
                "before {} {} {:?}",
                event.offset, event.length, event.text
            ));
        }

        fn document_changed(&mut self, event: &DocumentEvent) {
            self.log.lock().unwrap().push(format!(
                "after {} {} {:?} #{}",
                event.offset, event.length, event.text, event.modification_stamp
            ));
        }

        fn rewrite_session_changed(&mut self, event: &RewriteSessionEvent) {
            let name = match event {
                RewriteSessionEvent::Started(_) => "started",
                RewriteSessionEvent::Stopped(_) => "stopped",
            };
            self.log.lock().unwrap().push(name.to_string());
        }
    }

    fn lines(doc: &Document) -> Vec<String> {
        (0..doc.number_of_lines().unwrap())
            .map(|line| doc.line_content(line).unwrap())
            .collect()
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_empty() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.number_of_lines().unwrap(), 1);
        assert_eq!(doc.line_length(0).unwrap(), 0);
        assert_eq!(doc.line_delimiter(0).unwrap(), None);
    }

    #[test]
    fn test_from_str() {
        let doc = Document::from_str("a\nb");
        assert_eq!(doc.get(), "a\nb");
        assert_eq!(doc.line_information(0).unwrap(), Region::new(0, 1));
        assert_eq!(doc.line_length(0).unwrap(), 2);
        assert_eq!(doc.line_delimiter(0).unwrap().unwrap().as_str(), "\n");
        assert_eq!(doc.line_information(1).unwrap(), Region::new(2, 1));
        assert_eq!(doc.line_delimiter(1).unwrap(), None);
    }

    #[test]
    fn test_with_config_list_tracker_and_custom_delimiters() {
        let config = BufferConfig {
            tracker: TrackerKind::List,
            line_delimiters: Some(vec![";".to_string()]),
            copy_on_write: false,
            ..BufferConfig::default()
        };
        let mut doc = Document::with_config(&config).unwrap();
        doc.set("a;b\nc;d").unwrap();
        assert_eq!(lines(&doc), vec!["a", "b\nc", "d"]);
        assert_eq!(doc.default_line_delimiter().as_str(), ";");
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = BufferConfig {
            line_delimiters: Some(vec![]),
            ..BufferConfig::default()
        };
        assert!(matches!(
            Document::with_config(&config),
            Err(BufferError::InvalidConfig(_))
        ));
    }

    // ==================== Mutation Tests ====================

    #[test]
    fn test_insert_line_break() {
        let mut doc = Document::from_str("ab");
        let dirty = doc.replace(1, 0, "\nX").unwrap();
        assert_eq!(dirty, DirtyLines::FromLineToEnd(0));
        assert_eq!(doc.get(), "a\nXb");
        assert_eq!(lines(&doc), vec!["a", "Xb"]);
    }

    #[test]
    fn test_typing_dirties_single_line() {
        let mut doc = Document::from_str("one\ntwo\nthree");
        let dirty = doc.replace(5, 0, "w").unwrap();
        assert_eq!(dirty, DirtyLines::Single(1));
        assert_eq!(doc.line_content(1).unwrap(), "twwo");
    }

    #[test]
    fn test_typing_at_end_of_lf_line_dirties_single_line() {
        let mut doc = Document::from_str("ab\ncd\nef");
        assert_eq!(doc.replace(2, 0, "x").unwrap(), DirtyLines::Single(0));
        assert_eq!(doc.replace(6, 0, "y").unwrap(), DirtyLines::Single(1));
        assert_eq!(lines(&doc), vec!["abx", "cdy", "ef"]);
    }

    #[test]
    fn test_typing_at_end_of_cr_line_dirties_single_line() {
        let mut doc = Document::from_str("ab\rcd");
        assert_eq!(doc.replace(2, 0, "x").unwrap(), DirtyLines::Single(0));
        assert_eq!(doc.replace(0, 3, "zz").unwrap(), DirtyLines::Single(0));
        assert_eq!(lines(&doc), vec!["zz", "cd"]);
    }

    #[test]
    fn test_delete_spanning_three_lines_merges() {
        let mut doc = Document::from_str("one\ntwo\nthree\nfour");
        let dirty = doc.replace(2, 9, "").unwrap();
        assert_eq!(dirty, DirtyLines::FromLineToEnd(0));
        assert_eq!(lines(&doc), vec!["onee", "four"]);
    }

    #[test]
    fn test_replacing_delimiter_with_delimiter_dirties_range() {
        let mut doc = Document::from_str("ab\ncd");
        let dirty = doc.replace(2, 1, "\r").unwrap();
        assert_eq!(dirty, DirtyLines::Range { from: 0, to: 2 });
        assert_eq!(doc.line_delimiter(0).unwrap().unwrap().as_str(), "\r");
    }

    #[test]
    fn test_cr_and_lf_fuse_into_crlf() {
        let mut doc = Document::from_str("a\rb");
        doc.replace(2, 1, "\n").unwrap();
        assert_eq!(doc.number_of_lines().unwrap(), 2);
        assert_eq!(doc.line_delimiter(0).unwrap().unwrap().as_str(), "\r\n");

        // Splitting the pair again yields two delimiters.
        doc.replace(2, 0, "x").unwrap();
        assert_eq!(lines(&doc), vec!["a", "x", ""]);
        assert_eq!(doc.line_delimiter(0).unwrap().unwrap().as_str(), "\r");
        assert_eq!(doc.line_delimiter(1).unwrap().unwrap().as_str(), "\n");
    }

    #[test]
    fn test_deleting_half_of_crlf() {
        let mut doc = Document::from_str("a\r\nb");
        doc.replace(1, 1, "").unwrap();
        assert_eq!(doc.line_delimiter(0).unwrap().unwrap().as_str(), "\n");
        assert_eq!(doc.line_length(0).unwrap(), 2);

        let mut doc = Document::from_str("a\r\nb");
        doc.replace(2, 1, "").unwrap();
        assert_eq!(doc.line_delimiter(0).unwrap().unwrap().as_str(), "\r");
        assert_eq!(lines(&doc), vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_range_changes_nothing() {
        let mut doc = Document::from_str("abc");
        let log = Arc::new(Mutex::new(Vec::new()));
        doc.add_listener(Box::new(Recorder { log: log.clone() }));

        let err = doc.replace(2, 2, "x").unwrap_err();
        assert_eq!(
            err,
            BufferError::BadLocation {
                offset: 2,
                length: 2,
                len: 3
            }
        );
        assert_eq!(doc.get(), "abc");
        assert_eq!(doc.modification_stamp(), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_set_resets_lines() {
        let mut doc = Document::from_str("a\nb\nc");
        let dirty = doc.set("").unwrap();
        assert_eq!(dirty, DirtyLines::FromLineToEnd(0));
        assert_eq!(doc.number_of_lines().unwrap(), 1);
        assert_eq!(doc.line_length(0).unwrap(), 0);
    }

    #[test]
    fn test_trailing_delimiter_offset_maps_to_last_line() {
        let doc = Document::from_str("ab\n");
        assert_eq!(doc.line_number_of_offset(3).unwrap(), 1);
        assert_eq!(doc.line_offset(1).unwrap(), 3);
        assert_eq!(doc.position_of_offset(3).unwrap(), Position::new(1, 0));
    }

    // ==================== Query Tests ====================

    #[test]
    fn test_position_round_trip() {
        let doc = Document::from_str("hello\r\nworld");
        for offset in [0, 3, 5, 7, 12] {
            let position = doc.position_of_offset(offset).unwrap();
            assert_eq!(doc.offset_of_position(position).unwrap(), offset);
        }
        assert_eq!(doc.position_of_offset(9).unwrap(), Position::new(1, 2));
        assert!(doc.offset_of_position(Position::new(0, 6)).is_err());
    }

    #[test]
    fn test_get_range_and_char_at() {
        let doc = Document::from_str("hello world");
        assert_eq!(doc.get_range(6, 5).unwrap(), "world");
        assert_eq!(doc.char_at(4).unwrap(), 'o');
        assert!(doc.char_at(11).is_err());
        assert!(doc.get_range(6, 6).is_err());
    }

    #[test]
    fn test_number_of_lines_in() {
        let doc = Document::from_str("ab\ncd\nef");
        assert_eq!(doc.number_of_lines_in(1, 4).unwrap(), 2);
        assert_eq!(doc.number_of_lines_in(3, 0).unwrap(), 1);
        assert!(doc.number_of_lines_in(7, 2).is_err());
    }

    #[test]
    fn test_default_line_delimiter() {
        assert_eq!(Document::new().default_line_delimiter().as_str(), "\n");
        assert_eq!(
            Document::from_str("a\r\nb").default_line_delimiter().as_str(),
            "\r\n"
        );
    }

    #[test]
    fn test_default_line_delimiter_while_edits_are_queued() {
        let mut doc = Document::from_str("x");
        let session = doc
            .start_rewrite_session(RewriteSessionType::Unrestricted)
            .unwrap();
        doc.replace(1, 0, "\r\nb").unwrap();
        assert_eq!(doc.number_of_lines(), Err(BufferError::PendingRewrite));
        assert_eq!(doc.default_line_delimiter().as_str(), "\r\n");
        doc.stop_rewrite_session(&session).unwrap();
        assert_eq!(doc.default_line_delimiter().as_str(), "\r\n");
    }

    #[test]
    fn test_legacy_last_line_region() {
        let mut doc = Document::from_str("ab\ncd");
        assert_eq!(
            doc.line_information(2),
            Err(BufferError::BadLine { line: 2, lines: 2 })
        );
        doc.legacy_last_line_region = true;
        assert_eq!(doc.line_information(2).unwrap(), Region::new(5, 0));
        assert!(doc.line_information(3).is_err());
    }

    // ==================== Listener Tests ====================

    #[test]
    fn test_listeners_see_before_and_after() {
        let mut doc = Document::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let id = doc.add_listener(Box::new(Recorder { log: log.clone() }));

        doc.replace(0, 0, "hi").unwrap();
        doc.set("x").unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "before 0 0 \"hi\"",
                "after 0 0 \"hi\" #1",
                "before 0 2 \"x\"",
                "after 0 2 \"x\" #2",
            ]
        );

        assert!(doc.remove_listener(id).is_some());
        assert!(doc.remove_listener(id).is_none());
        doc.replace(0, 1, "").unwrap();
        assert_eq!(log.lock().unwrap().len(), 4);
        assert_eq!(doc.modification_stamp(), 3);
    }

    #[test]
    fn test_lock_object_is_only_stored() {
        let mut doc = Document::new();
        assert!(doc.lock_object().is_none());
        let lock = Arc::new(Mutex::new(()));
        doc.set_lock_object(Some(lock.clone()));
        assert!(Arc::ptr_eq(&doc.lock_object().unwrap(), &lock));
    }

    // ==================== Rewrite Session Tests ====================

    #[test]
    fn test_session_defers_line_queries() {
        let mut doc = Document::from_str("a\nb");
        let session = doc
            .start_rewrite_session(RewriteSessionType::Unrestricted)
            .unwrap();
        assert_eq!(doc.number_of_lines().unwrap(), 2);

        assert_eq!(doc.replace(1, 0, "\n\n").unwrap(), DirtyLines::None);
        assert_eq!(doc.number_of_lines(), Err(BufferError::PendingRewrite));
        assert_eq!(doc.get(), "a\n\n\nb");

        assert_eq!(
            doc.stop_rewrite_session(&session).unwrap(),
            DirtyLines::FromLineToEnd(0)
        );
        assert_eq!(doc.number_of_lines().unwrap(), 4);
        assert!(doc.active_rewrite_session().is_none());
    }

    #[test]
    fn test_second_session_is_rejected() {
        let mut doc = Document::new();
        let session = doc
            .start_rewrite_session(RewriteSessionType::UnrestrictedSmall)
            .unwrap();
        assert_eq!(
            doc.start_rewrite_session(RewriteSessionType::Sequential),
            Err(BufferError::RewriteSessionActive)
        );
        doc.stop_rewrite_session(&session).unwrap();
        assert!(doc
            .start_rewrite_session(RewriteSessionType::Sequential)
            .is_ok());
    }

    #[test]
    fn test_stale_session_token_is_ignored() {
        let mut doc = Document::new();
        let first = doc
            .start_rewrite_session(RewriteSessionType::Unrestricted)
            .unwrap();
        doc.stop_rewrite_session(&first).unwrap();
        let second = doc
            .start_rewrite_session(RewriteSessionType::Unrestricted)
            .unwrap();

        assert_eq!(doc.stop_rewrite_session(&first).unwrap(), DirtyLines::None);
        assert_eq!(doc.active_rewrite_session(), Some(&second));
    }

    #[test]
    fn test_small_session_tracks_lines_per_edit() {
        let mut doc = Document::from_str("ab");
        let session = doc
            .start_rewrite_session(RewriteSessionType::UnrestrictedSmall)
            .unwrap();
        assert_eq!(
            doc.replace(1, 0, "\n").unwrap(),
            DirtyLines::FromLineToEnd(0)
        );
        assert_eq!(doc.number_of_lines().unwrap(), 2);
        doc.stop_rewrite_session(&session).unwrap();
    }

    #[test]
    fn test_flush_replays_queue() {
        let mut doc = Document::from_str("x\r");
        let session = doc
            .start_rewrite_session(RewriteSessionType::Unrestricted)
            .unwrap();
        doc.replace(2, 0, "\ny").unwrap();
        doc.replace(0, 0, "\n").unwrap();
        doc.flush_rewrite_session().unwrap();
        assert_eq!(lines(&doc), vec!["", "x", "y"]);
        assert_eq!(doc.line_delimiter(1).unwrap().unwrap().as_str(), "\r\n");

        // After a flush edits are tracked immediately.
        assert_eq!(doc.replace(5, 0, "z").unwrap(), DirtyLines::Single(2));
        doc.stop_rewrite_session(&session).unwrap();
        assert_eq!(lines(&doc), vec!["", "x", "yz"]);
    }

    #[test]
    fn test_sequential_session_commits_on_stop() {
        let mut doc = Document::from_str("aa\nbb\ncc");
        let log = Arc::new(Mutex::new(Vec::new()));
        doc.add_listener(Box::new(Recorder { log: log.clone() }));
        let session = doc
            .start_rewrite_session(RewriteSessionType::Sequential)
            .unwrap();
        doc.replace(0, 2, "A").unwrap();
        doc.replace(2, 2, "B").unwrap();
        doc.replace(4, 2, "C").unwrap();
        assert_eq!(doc.get(), "A\nB\nC");
        doc.stop_rewrite_session(&session).unwrap();

        assert_eq!(lines(&doc), vec!["A", "B", "C"]);
        let log = log.lock().unwrap();
        assert_eq!(log.first().map(String::as_str), Some("started"));
        assert_eq!(log.last().map(String::as_str), Some("stopped"));
        assert_eq!(log.len(), 8);
    }

    #[test]
    fn test_strict_session_rejects_out_of_order_edit() {
        let mut doc = Document::from_str("abcdef");
        let session = doc
            .start_rewrite_session(RewriteSessionType::StrictlySequential)
            .unwrap();
        doc.replace(3, 1, "D").unwrap();
        let stamp = doc.modification_stamp();
        assert_eq!(
            doc.replace(2, 2, "x"),
            Err(BufferError::NotSequential { offset: 2 })
        );
        assert_eq!(doc.modification_stamp(), stamp);
        doc.stop_rewrite_session(&session).unwrap();
        assert_eq!(doc.get(), "abcDef");
    }

    #[test]
    fn test_set_during_session_supersedes_queue() {
        let mut doc = Document::from_str("abc");
        let session = doc
            .start_rewrite_session(RewriteSessionType::Unrestricted)
            .unwrap();
        doc.replace(0, 0, "\n").unwrap();
        doc.set("x\ny").unwrap();
        doc.replace(3, 0, "\n").unwrap();
        doc.flush_rewrite_session().unwrap();
        assert_eq!(lines(&doc), vec!["x", "y", ""]);
        doc.stop_rewrite_session(&session).unwrap();
    }
}

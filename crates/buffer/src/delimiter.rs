// Chunk: docs/chunks/line_delimiters - Pluggable line delimiter scanning

//! Line delimiter recognition.
//!
//! Line trackers never look for `\n` themselves; they ask a
//! [`DelimiterScanner`] for the next delimiter occurrence in inserted text.
//! [`DefaultDelimiterScanner`] knows `\r`, `\n` and `\r\n`;
//! [`ConfigurableDelimiterScanner`] accepts any non-empty set.

use std::fmt;
use std::sync::Arc;

use crate::error::{BufferError, Result};
use crate::text_store::TextStore;

/// A legal line delimiter string. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiter {
    text: Arc<str>,
    char_len: usize,
}

impl Delimiter {
    pub fn new(text: &str) -> Self {
        Self {
            text: Arc::from(text),
            char_len: text.chars().count(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the delimiter in chars.
    pub fn char_len(&self) -> usize {
        self.char_len
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One delimiter occurrence found by a scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterMatch {
    /// Char index of the first delimiter char.
    pub index: usize,
    pub delimiter: Delimiter,
}

impl DelimiterMatch {
    /// Char index just past the delimiter.
    pub fn end(&self) -> usize {
        self.index + self.delimiter.char_len()
    }
}

/// Finds line delimiters in text.
pub trait DelimiterScanner: fmt::Debug + Send + Sync {
    /// The delimiters this scanner recognizes.
    fn legal_delimiters(&self) -> &[Delimiter];

    /// Returns the first delimiter starting at or after `from`, preferring
    /// the longest legal delimiter at a given index.
    fn next_delimiter(&self, text: &[char], from: usize) -> Option<DelimiterMatch>;

    /// Returns true if `ch` occurs in any legal delimiter.
    fn is_delimiter_char(&self, ch: char) -> bool {
        self.legal_delimiters()
            .iter()
            .any(|d| d.as_str().contains(ch))
    }

    /// Counts the delimiters in `text`.
    fn count_delimiters(&self, text: &[char]) -> usize {
        let mut count = 0;
        let mut from = 0;
        while let Some(found) = self.next_delimiter(text, from) {
            count += 1;
            from = found.end();
        }
        count
    }

    /// Widens the edit range `[start, end)` of `store` (pre-edit content) so
    /// that no delimiter can straddle either boundary once the edit lands.
    ///
    /// Each boundary is pushed outward over adjacent delimiter chars, so both
    /// ends of the widened range touch a non-delimiter char or the buffer edge.
    fn stitch_bounds(&self, store: &dyn TextStore, start: usize, end: usize) -> (usize, usize) {
        let mut start = start;
        while start > 0 && self.is_delimiter_char(store.char_at(start - 1)) {
            start -= 1;
        }
        let len = store.len();
        let mut end = end;
        while end < len && self.is_delimiter_char(store.char_at(end)) {
            end += 1;
        }
        (start, end)
    }
}

/// Recognizes `\r`, `\n` and `\r\n`.
#[derive(Debug, Clone)]
pub struct DefaultDelimiterScanner {
    delimiters: [Delimiter; 3],
}

impl DefaultDelimiterScanner {
    pub fn new() -> Self {
        Self {
            delimiters: [
                Delimiter::new("\r"),
                Delimiter::new("\n"),
                Delimiter::new("\r\n"),
            ],
        }
    }
}

impl Default for DefaultDelimiterScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DelimiterScanner for DefaultDelimiterScanner {
    fn legal_delimiters(&self) -> &[Delimiter] {
        &self.delimiters
    }

    fn next_delimiter(&self, text: &[char], from: usize) -> Option<DelimiterMatch> {
        let [cr, lf, crlf] = &self.delimiters;
        text.iter()
            .enumerate()
            .skip(from)
            .find_map(|(index, ch)| match ch {
                '\r' if text.get(index + 1) == Some(&'\n') => Some(DelimiterMatch {
                    index,
                    delimiter: crlf.clone(),
                }),
                '\r' => Some(DelimiterMatch {
                    index,
                    delimiter: cr.clone(),
                }),
                '\n' => Some(DelimiterMatch {
                    index,
                    delimiter: lf.clone(),
                }),
                _ => None,
            })
    }

    fn is_delimiter_char(&self, ch: char) -> bool {
        ch == '\r' || ch == '\n'
    }

    // Only a lone `\r` before the edit or a `\n` after it can fuse into `\r\n`.
    fn stitch_bounds(&self, store: &dyn TextStore, start: usize, end: usize) -> (usize, usize) {
        let start = if start > 0 && store.char_at(start - 1) == '\r' {
            start - 1
        } else {
            start
        };
        let end = if end < store.len() && store.char_at(end) == '\n' {
            end + 1
        } else {
            end
        };
        (start, end)
    }
}

/// Recognizes an arbitrary, caller-supplied set of delimiters.
#[derive(Debug, Clone)]
pub struct ConfigurableDelimiterScanner {
    delimiters: Vec<Delimiter>,
    patterns: Vec<Vec<char>>,
}

impl ConfigurableDelimiterScanner {
    /// Creates a scanner for `delimiters`.
    ///
    /// Fails if the set is empty or contains an empty string.
    pub fn new<S: AsRef<str>>(delimiters: &[S]) -> Result<Self> {
        if delimiters.is_empty() {
            return Err(BufferError::InvalidConfig(
                "at least one line delimiter is required".to_string(),
            ));
        }
        if delimiters.iter().any(|d| d.as_ref().is_empty()) {
            return Err(BufferError::InvalidConfig(
                "line delimiters must not be empty".to_string(),
            ));
        }
        Ok(Self {
            delimiters: delimiters.iter().map(|d| Delimiter::new(d.as_ref())).collect(),
            patterns: delimiters
                .iter()
                .map(|d| d.as_ref().chars().collect())
                .collect(),
        })
    }

    fn longest_match_at(&self, text: &[char], index: usize) -> Option<usize> {
        self.patterns
            .iter()
            .enumerate()
            .filter(|(_, pattern)| text[index..].starts_with(pattern))
            .max_by_key(|(_, pattern)| pattern.len())
            .map(|(which, _)| which)
    }
}

impl DelimiterScanner for ConfigurableDelimiterScanner {
    fn legal_delimiters(&self) -> &[Delimiter] {
        &self.delimiters
    }

    fn next_delimiter(&self, text: &[char], from: usize) -> Option<DelimiterMatch> {
        (from..text.len()).find_map(|index| {
            self.longest_match_at(text, index)
                .map(|which| DelimiterMatch {
                    index,
                    delimiter: self.delimiters[which].clone(),
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_store::StringTextStore;
    use test_case::test_case;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test_case("abc", 0, None; "no delimiter")]
    #[test_case("a\nb", 0, Some((1, "\n")); "line feed")]
    #[test_case("a\rb", 0, Some((1, "\r")); "carriage return")]
    #[test_case("a\r\nb", 0, Some((1, "\r\n")); "crlf wins over cr")]
    #[test_case("a\n\nb", 2, Some((2, "\n")); "search starts at from")]
    #[test_case("\n\r", 1, Some((1, "\r")); "trailing cr")]
    fn test_default_next_delimiter(text: &str, from: usize, expected: Option<(usize, &str)>) {
        let scanner = DefaultDelimiterScanner::new();
        let found = scanner.next_delimiter(&chars(text), from);
        assert_eq!(
            found.as_ref().map(|m| (m.index, m.delimiter.as_str())),
            expected
        );
    }

    #[test]
    fn test_default_count_delimiters() {
        let scanner = DefaultDelimiterScanner::new();
        assert_eq!(scanner.count_delimiters(&chars("a\r\nb\rc\nd")), 3);
        assert_eq!(scanner.count_delimiters(&chars("\n\n")), 2);
        assert_eq!(scanner.count_delimiters(&chars("")), 0);
    }

    #[test]
    fn test_default_stitch_bounds() {
        let scanner = DefaultDelimiterScanner::new();
        let store = StringTextStore::new("a\r\nb");
        // Edit between `\r` and `\n` must cover both halves.
        assert_eq!(scanner.stitch_bounds(&store, 2, 2), (1, 3));
        assert_eq!(scanner.stitch_bounds(&store, 0, 1), (0, 1));
        assert_eq!(scanner.stitch_bounds(&store, 4, 4), (4, 4));
    }

    #[test]
    fn test_configurable_prefers_longest() {
        let scanner = ConfigurableDelimiterScanner::new(&["|", "||", "\n"]).unwrap();
        let found = scanner.next_delimiter(&chars("a||b"), 0).unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.delimiter.as_str(), "||");
        assert_eq!(found.end(), 3);
    }

    #[test]
    fn test_configurable_rejects_empty_sets() {
        let empty: [&str; 0] = [];
        assert!(ConfigurableDelimiterScanner::new(&empty).is_err());
        assert!(ConfigurableDelimiterScanner::new(&["\n", ""]).is_err());
    }

    #[test]
    fn test_configurable_stitch_bounds_covers_delimiter_runs() {
        let scanner = ConfigurableDelimiterScanner::new(&["<br>"]).unwrap();
        let store = StringTextStore::new("x<br>y");
        assert_eq!(scanner.stitch_bounds(&store, 3, 3), (1, 5));
        assert_eq!(scanner.stitch_bounds(&store, 0, 0), (0, 0));
    }
}

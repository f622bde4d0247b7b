// Chunk: docs/chunks/text_buffer - Text buffer data structure with gap buffer backing

/// Position in the buffer as (line, column) where both are 0-indexed.
///
/// Ordering is document order: by line, then by column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// A contiguous character range `[offset, offset + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    pub offset: usize,
    pub length: usize,
}

impl Region {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Exclusive end offset of the region.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Returns true if `offset` lies in `[self.offset, self.end())`.
    pub fn contains(&self, offset: usize) -> bool {
        self.offset <= offset && offset < self.end()
    }
}

/// Lines affected by an edit, reported so that views can limit redraws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirtyLines {
    /// Nothing to redraw (or the report is deferred by a rewrite session).
    None,
    /// One line changed in place.
    Single(usize),
    /// Lines `[from, to)` changed; the line count did not.
    Range { from: usize, to: usize },
    /// Lines were added or removed, so everything from `line` on moved.
    FromLineToEnd(usize),
}

impl DirtyLines {
    /// Returns true if no lines were dirtied.
    pub fn is_none(&self) -> bool {
        matches!(self, DirtyLines::None)
    }

    /// Returns the starting line of the dirty region, if any.
    pub fn start_line(&self) -> Option<usize> {
        match self {
            DirtyLines::None => None,
            DirtyLines::Single(line) | DirtyLines::FromLineToEnd(line) => Some(*line),
            DirtyLines::Range { from, .. } => Some(*from),
        }
    }

    /// Returns `(from, to)` with `to == None` meaning "to the end".
    fn span(&self) -> Option<(usize, Option<usize>)> {
        match self {
            DirtyLines::None => None,
            DirtyLines::Single(line) => Some((*line, Some(line + 1))),
            DirtyLines::Range { from, to } => Some((*from, Some(*to))),
            DirtyLines::FromLineToEnd(line) => Some((*line, None)),
        }
    }

    /// Widens `self` to the smallest region covering both `self` and `other`.
    ///
    /// Used to fold the reports of several edits into one redraw.
    pub fn merge(&mut self, other: DirtyLines) {
        let Some((b_from, b_to)) = other.span() else {
            return;
        };
        let Some((a_from, a_to)) = self.span() else {
            *self = other;
            return;
        };
        let from = a_from.min(b_from);
        *self = match (a_to, b_to) {
            (Some(a), Some(b)) => {
                let to = a.max(b);
                if to == from + 1 {
                    DirtyLines::Single(from)
                } else {
                    DirtyLines::Range { from, to }
                }
            }
            _ => DirtyLines::FromLineToEnd(from),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(DirtyLines::None, DirtyLines::Single(5), DirtyLines::Single(5); "none is identity on the left")]
    #[test_case(DirtyLines::Single(5), DirtyLines::None, DirtyLines::Single(5); "none is identity on the right")]
    #[test_case(DirtyLines::Single(3), DirtyLines::Single(3), DirtyLines::Single(3); "same single")]
    #[test_case(DirtyLines::Single(3), DirtyLines::Single(4), DirtyLines::Range { from: 3, to: 5 }; "adjacent singles")]
    #[test_case(DirtyLines::Single(10), DirtyLines::Single(3), DirtyLines::Range { from: 3, to: 11 }; "reversed singles")]
    #[test_case(DirtyLines::Range { from: 2, to: 10 }, DirtyLines::Range { from: 4, to: 7 }, DirtyLines::Range { from: 2, to: 10 }; "nested ranges")]
    #[test_case(DirtyLines::Range { from: 5, to: 10 }, DirtyLines::Single(15), DirtyLines::Range { from: 5, to: 16 }; "single extends range")]
    #[test_case(DirtyLines::Range { from: 3, to: 7 }, DirtyLines::FromLineToEnd(5), DirtyLines::FromLineToEnd(3); "to-end absorbs range")]
    #[test_case(DirtyLines::FromLineToEnd(5), DirtyLines::FromLineToEnd(3), DirtyLines::FromLineToEnd(3); "to-end takes earlier start")]
    fn test_merge(mut a: DirtyLines, b: DirtyLines, expected: DirtyLines) {
        a.merge(b);
        assert_eq!(a, expected);
    }

    #[test]
    fn test_merge_typing_then_enter() {
        let mut d = DirtyLines::None;
        d.merge(DirtyLines::Single(3));
        d.merge(DirtyLines::Single(3));
        d.merge(DirtyLines::FromLineToEnd(3));
        assert_eq!(d, DirtyLines::FromLineToEnd(3));
        assert_eq!(d.start_line(), Some(3));
    }

    #[test]
    fn test_position_order_is_document_order() {
        assert!(Position::new(0, 9) < Position::new(1, 0));
        assert!(Position::new(2, 1) < Position::new(2, 4));
    }

    #[test]
    fn test_region_contains() {
        let region = Region::new(4, 3);
        assert_eq!(region.end(), 7);
        assert!(region.contains(4));
        assert!(region.contains(6));
        assert!(!region.contains(7));
        assert!(!Region::new(2, 0).contains(2));
    }
}

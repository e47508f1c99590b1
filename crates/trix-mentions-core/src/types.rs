//! Core mention types: trigger keys, tracked matches, and caret geometry.
//!
//! All offsets are character offsets (Unicode scalar values), NOT byte offsets.

use std::ops::Range;

use smol_str::SmolStr;

/// A configured trigger key such as `@` or `#`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerKey {
    /// The literal text that opens a query.
    pub key: SmolStr,
    /// Whether queries started by this key may contain spaces.
    pub multi_word: bool,
}

impl TriggerKey {
    /// Create a single-word trigger key.
    pub fn new(key: impl Into<SmolStr>) -> Self {
        Self {
            key: key.into(),
            multi_word: false,
        }
    }

    /// Create a trigger key that allows multi-word queries.
    pub fn multi_word(key: impl Into<SmolStr>) -> Self {
        Self {
            key: key.into(),
            multi_word: true,
        }
    }
}

/// The query currently being completed.
///
/// `position` is the offset immediately after the trigger key, i.e. the start
/// of the query text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    /// Query text between the trigger key and the cursor.
    pub text: String,
    /// The trigger key that produced this match.
    pub key: SmolStr,
    /// Offset of the first query character.
    pub position: usize,
}

impl Match {
    pub fn new(text: impl Into<String>, key: impl Into<SmolStr>, position: usize) -> Self {
        Self {
            text: text.into(),
            key: key.into(),
            position,
        }
    }

    /// Offset of the trigger key itself.
    pub fn start(&self) -> usize {
        self.position.saturating_sub(self.key.chars().count())
    }

    /// Offset just past the query text.
    pub fn end(&self) -> usize {
        self.position + self.text.chars().count()
    }

    /// The full trigger + query range, which a commit replaces.
    pub fn range(&self) -> Range<usize> {
        self.start()..self.end()
    }
}

/// Screen position of a caret, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorRect {
    pub x: f64,
    pub y: f64,
    pub height: f64,
}

impl CursorRect {
    pub fn new(x: f64, y: f64, height: f64) -> Self {
        Self { x, y, height }
    }

    /// Bottom edge, where a popup anchored below the caret starts.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_range() {
        // "Hi @ann": trigger at 3, query starts at 4.
        let m = Match::new("ann", "@", 4);
        assert_eq!(m.start(), 3);
        assert_eq!(m.end(), 7);
        assert_eq!(m.range(), 3..7);
    }

    #[test]
    fn test_match_range_multi_char_key() {
        let m = Match::new("smile", "::", 5);
        assert_eq!(m.range(), 3..10);
    }

    #[test]
    fn test_match_range_counts_chars() {
        let m = Match::new("jö", "@", 1);
        assert_eq!(m.end(), 3);
    }

    #[test]
    fn test_cursor_rect_bottom() {
        let rect = CursorRect::new(24.0, 32.0, 16.0);
        assert_eq!(rect.bottom(), 48.0);
    }
}

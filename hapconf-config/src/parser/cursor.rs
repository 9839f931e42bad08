//! Line-oriented cursor over configuration text
//!
//! The cursor only ever moves forward. Positions are byte offsets into the
//! source, and line terminators are `\n`, `\r\n` or a lone `\r`.

use thiserror::Error;

/// Cursor error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("Position {position} is out of range")]
    OutOfRange { position: usize },
}

pub type CursorResult<T> = Result<T, CursorError>;

/// Forward-only reader over a configuration document
#[derive(Debug, Clone)]
pub struct TextCursor<'a> {
    data: &'a str,
    position: usize,
}

impl<'a> TextCursor<'a> {
    pub fn new(data: &'a str) -> Self {
        Self { data, position: 0 }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.position
    }

    /// The full source text
    pub fn source(&self) -> &'a str {
        self.data
    }

    /// Text from the current position to the end of input
    pub fn remaining(&self) -> &'a str {
        self.data.get(self.position..).unwrap_or("")
    }

    pub fn eof(&self) -> bool {
        self.eof_at(self.position)
    }

    pub fn eof_at(&self, position: usize) -> bool {
        position >= self.data.len()
    }

    pub fn eol(&self) -> bool {
        self.eol_at(self.position)
    }

    /// True if the byte at `position` is `\r` or `\n`
    pub fn eol_at(&self, position: usize) -> bool {
        matches!(self.data.as_bytes().get(position), Some(b'\r' | b'\n'))
    }

    pub fn current_char(&self) -> CursorResult<char> {
        self.char_at(self.position)
    }

    /// Character starting at `position`
    pub fn char_at(&self, position: usize) -> CursorResult<char> {
        self.data
            .get(position..)
            .and_then(|rest| rest.chars().next())
            .ok_or(CursorError::OutOfRange { position })
    }

    /// Move forward `count` bytes, stopping at the end of input
    pub fn advance(&mut self, count: usize) {
        self.position = (self.position + count).min(self.data.len());
    }

    /// Move forward one character
    pub fn bump(&mut self) {
        let width = self.current_char().map_or(1, char::len_utf8);
        self.advance(width);
    }

    pub fn rest_of_line(&self) -> &'a str {
        self.rest_of_line_at(self.position)
    }

    /// Text from `position` up to, not including, the next line terminator
    pub fn rest_of_line_at(&self, position: usize) -> &'a str {
        if self.eof_at(position) {
            return "";
        }
        let end = self.next_eol_at(position);
        self.data.get(position..end).unwrap_or("")
    }

    /// True if the first whitespace-delimited word from the cursor is `word`
    pub fn first_word_matches(&self, word: &str) -> bool {
        self.rest_of_line().split_whitespace().next() == Some(word)
    }

    pub fn current_line(&self) -> &'a str {
        self.current_line_at(self.position)
    }

    /// The whole line containing `position`, without its terminator
    pub fn current_line_at(&self, position: usize) -> &'a str {
        let position = position.min(self.data.len());
        let start = self.previous_eol_at(position).map_or(0, |eol| eol + 1);
        let end = self.next_eol_at(start);
        self.data.get(start..end).unwrap_or("")
    }

    pub fn is_empty_line(&self) -> bool {
        self.is_empty_line_at(self.position)
    }

    pub fn is_empty_line_at(&self, position: usize) -> bool {
        self.current_line_at(position).trim().is_empty()
    }

    pub fn previous_eol(&self) -> Option<usize> {
        self.previous_eol_at(self.position)
    }

    /// Offset of the last line terminator strictly before `position`
    pub fn previous_eol_at(&self, position: usize) -> Option<usize> {
        let end = position.min(self.data.len());
        self.data.as_bytes()[..end]
            .iter()
            .rposition(|b| *b == b'\n' || *b == b'\r')
    }

    pub fn next_eol(&self) -> usize {
        self.next_eol_at(self.position)
    }

    /// Offset of the first line terminator at or after `position`, or the
    /// input length if there is none
    pub fn next_eol_at(&self, position: usize) -> usize {
        let start = position.min(self.data.len());
        self.data.as_bytes()[start..]
            .iter()
            .position(|b| *b == b'\n' || *b == b'\r')
            .map_or(self.data.len(), |offset| start + offset)
    }

    pub fn goto_next_eol(&mut self) {
        self.position = self.next_eol();
    }

    /// Move to the first character of the following line
    pub fn next_line(&mut self) {
        self.goto_next_eol();
        if self.data.as_bytes().get(self.position) == Some(&b'\r') {
            self.advance(1);
        }
        if self.data.as_bytes().get(self.position) == Some(&b'\n') {
            self.advance(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_and_eol() {
        let cursor = TextCursor::new("ab\ncd");
        assert!(!cursor.eof());
        assert!(cursor.eol_at(2));
        assert!(!cursor.eol_at(1));
        assert!(cursor.eof_at(5));
        assert!(!cursor.eol_at(42));
    }

    #[test]
    fn test_char_at() {
        let cursor = TextCursor::new("abc");
        assert_eq!(cursor.char_at(1), Ok('b'));
        assert_eq!(cursor.current_char(), Ok('a'));
        assert_eq!(cursor.char_at(3), Err(CursorError::OutOfRange { position: 3 }));
    }

    #[test]
    fn test_rest_of_line() {
        let mut cursor = TextCursor::new("global\n    daemon\r\nbackend b");
        assert_eq!(cursor.rest_of_line(), "global");
        assert_eq!(cursor.rest_of_line_at(3), "bal");

        cursor.next_line();
        assert_eq!(cursor.rest_of_line(), "    daemon");

        cursor.next_line();
        assert_eq!(cursor.rest_of_line(), "backend b");
        assert!(cursor.first_word_matches("backend"));
        assert!(!cursor.first_word_matches("back"));

        cursor.next_line();
        assert!(cursor.eof());
        assert_eq!(cursor.rest_of_line(), "");
    }

    #[test]
    fn test_current_line() {
        let cursor = TextCursor::new("first\nsecond line\n\nlast");
        assert_eq!(cursor.current_line_at(9), "second line");
        assert_eq!(cursor.current_line_at(0), "first");
        assert_eq!(cursor.current_line_at(24), "last");
        assert!(cursor.is_empty_line_at(18));
        assert!(!cursor.is_empty_line_at(3));
    }

    #[test]
    fn test_eol_offsets() {
        let mut cursor = TextCursor::new("one\ntwo\nthree");
        assert_eq!(cursor.previous_eol(), None);
        assert_eq!(cursor.next_eol(), 3);
        assert_eq!(cursor.previous_eol_at(5), Some(3));
        assert_eq!(cursor.next_eol_at(8), 13);

        cursor.goto_next_eol();
        assert_eq!(cursor.position(), 3);
        assert!(cursor.eol());
    }

    #[test]
    fn test_advance_is_clamped() {
        let mut cursor = TextCursor::new("héllo");
        cursor.bump();
        cursor.bump();
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.remaining(), "llo");

        cursor.advance(100);
        assert!(cursor.eof());
        assert_eq!(cursor.remaining(), "");
    }
}

//! Free-text comments attached above sections

use crate::parser::TextCursor;
use hapconf_core::FormatOptions;
use std::fmt;

/// A block of `#` lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comment {
    text: String,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True if the text spans more than one line, ignoring trailing whitespace
    pub fn is_multiline(&self) -> bool {
        self.text.trim_end().contains('\n')
    }

    /// Render every line of the text prefixed with `# `
    pub fn pretty_print(&self, indent_level: usize, options: &FormatOptions) -> String {
        if self.is_empty() {
            return String::new();
        }

        let indent = options.indent(indent_level);
        let mut out = String::new();
        for line in self.text.trim_end().lines() {
            let line = format!("{indent}# {line}");
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    /// Read a run of contiguous `#` lines starting at the cursor.
    ///
    /// One `#` and one following space are stripped from each line. The
    /// cursor is left on the first line that is not a comment.
    pub(crate) fn from_cursor(cursor: &mut TextCursor<'_>) -> Self {
        let mut lines = Vec::new();

        while !cursor.eof() {
            let Some(body) = cursor.rest_of_line().trim_start().strip_prefix('#') else {
                break;
            };
            let body = body.strip_prefix(' ').unwrap_or(body);
            lines.push(body.trim_end());
            cursor.next_line();
        }

        Comment::new(lines.join("\n"))
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_print(0, &FormatOptions::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_comment_prints_nothing() {
        let comment = Comment::default();
        assert!(comment.is_empty());
        assert_eq!(comment.pretty_print(1, &FormatOptions::default()), "");
    }

    #[test]
    fn test_single_line() {
        let comment = Comment::new("Hello world");
        assert!(!comment.is_multiline());
        assert_eq!(comment.to_string(), "# Hello world\n");
        assert_eq!(
            comment.pretty_print(1, &FormatOptions::default()),
            "    # Hello world\n"
        );
    }

    #[test]
    fn test_multiline() {
        let comment = Comment::new("Hello\n\nworld\n");
        assert!(comment.is_multiline());
        assert!(!Comment::new("trailing newline only\n").is_multiline());
        assert_eq!(comment.to_string(), "# Hello\n#\n# world\n");
    }

    #[test]
    fn test_from_cursor() {
        let mut cursor = TextCursor::new("# first\n#second\n#\n  # indented\nglobal\n");
        let comment = Comment::from_cursor(&mut cursor);

        assert_eq!(comment.text(), "first\nsecond\n\nindented");
        assert_eq!(cursor.rest_of_line(), "global");
    }

    #[test]
    fn test_crlf_lines() {
        let mut cursor = TextCursor::new("# one\r\n# two\r\n");
        let comment = Comment::from_cursor(&mut cursor);
        assert_eq!(comment.text(), "one\ntwo");
        assert!(cursor.eof());
    }
}

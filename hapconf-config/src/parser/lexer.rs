//! Line tokenizer
//!
//! Directive lines are free-form: any run of blanks separates two words.

use logos::Logos;

/// Tokens of a single directive line
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum LineToken {
    #[regex(r"[ \t\f\r\n\x0B]+", logos::skip)]
    Whitespace,

    /// Anything that is not a blank
    #[regex(r"[^ \t\f\r\n\x0B]+", |lex| lex.slice().to_string())]
    Word(String),
}

/// Split one line into its words
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();

    for (result, span) in LineToken::lexer(line).spanned() {
        match result {
            Ok(LineToken::Word(word)) => words.push(word),
            Ok(LineToken::Whitespace) => {}
            // The word pattern accepts every non-blank byte, keep the slice as is.
            Err(()) => words.push(line[span].to_string()),
        }
    }

    words
}

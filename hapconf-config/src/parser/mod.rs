//! Text scanning for configuration documents
//!
//! [`TextCursor`] walks the document line by line, [`tokenize_line`] splits
//! a directive into words, and the block reader drives a section's
//! `handle_line` over its body.

pub(crate) mod block;
pub mod cursor;
pub mod lexer;

pub use cursor::{CursorError, CursorResult, TextCursor};
pub use lexer::{LineToken, tokenize_line};

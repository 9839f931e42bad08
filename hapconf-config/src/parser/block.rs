//! Section body reader shared by every section type

use super::{TextCursor, tokenize_line};
use crate::error::ParseError;
use crate::section::SectionKind;

/// A section that can be filled from directive lines
pub(crate) trait Section {
    fn section_kind(&self) -> SectionKind;

    fn section_name(&self) -> &str;

    fn directive_count(&self) -> usize;

    /// Handle one non-empty directive line
    fn handle_line(&mut self, tokens: Vec<String>, position: usize) -> Result<(), ParseError>;

    /// Record an empty line inside the body
    fn push_blank_line(&mut self) {}

    /// Called once the whole body has been read
    fn finish(&mut self) {}
}

/// Read one section starting at its header line.
///
/// `build` receives the header name (if any) and the header position. The
/// cursor is left on the first line that does not belong to the section, so
/// the caller can dispatch it.
pub(crate) fn parse_block<S, F>(cursor: &mut TextCursor<'_>, build: F) -> Result<S, ParseError>
where
    S: Section,
    F: FnOnce(Option<&str>, usize) -> Result<S, ParseError>,
{
    let header_position = cursor.position();
    let header = tokenize_line(cursor.rest_of_line());
    let name = header.get(1..).map(|rest| rest.join(" ")).filter(|name| !name.is_empty());

    let mut section = build(name.as_deref(), header_position)?;
    cursor.next_line();

    while !cursor.eof() {
        let position = cursor.position();
        let tokens = tokenize_line(cursor.rest_of_line());

        let Some(first) = tokens.first() else {
            section.push_blank_line();
            cursor.next_line();
            continue;
        };

        if SectionKind::is_keyword(first) {
            break;
        }

        if first.starts_with('#') {
            if comment_precedes_section(cursor) {
                break;
            }
            tracing::warn!(
                position,
                section = %section.section_kind(),
                "dropping comment inside a section body"
            );
        } else {
            tracing::trace!(position, directive = %first, "directive");
            section.handle_line(tokens, position)?;
        }

        cursor.next_line();
    }

    section.finish();
    tracing::debug!(
        kind = %section.section_kind(),
        name = section.section_name(),
        directives = section.directive_count(),
        "parsed section"
    );

    Ok(section)
}

/// True if only comment and blank lines separate the cursor from the next
/// section header or the end of input
pub(crate) fn comment_precedes_section(cursor: &TextCursor<'_>) -> bool {
    let mut lookahead = cursor.clone();

    while !lookahead.eof() {
        let line = lookahead.rest_of_line().trim();
        if !line.is_empty() && !line.starts_with('#') {
            return line
                .split_whitespace()
                .next()
                .is_some_and(SectionKind::is_keyword);
        }
        lookahead.next_line();
    }

    true
}

/// Name of a section that must have one
pub(crate) fn require_name(
    section: SectionKind,
    name: Option<&str>,
    position: usize,
) -> Result<String, ParseError> {
    name.map(str::to_string).ok_or(ParseError::MissingName {
        section: section.as_str(),
        position,
    })
}

//! The `global` section

use crate::comment::Comment;
use crate::error::ParseError;
use crate::params::{ArgInput, OrderEntry, ParamKey, ParameterBag, header};
use crate::parser::TextCursor;
use crate::parser::block::{Section, parse_block};
use crate::section::SectionKind;
use hapconf_core::FormatOptions;
use std::fmt;

/// Process-wide settings
///
/// `debug`, `quiet` and `daemon` are kept as flags and always print after
/// the other directives.
#[derive(Debug, Clone, PartialEq)]
pub struct Globals {
    params: ParameterBag,
    debug: bool,
    quiet: bool,
    daemon: bool,
}

impl Default for Globals {
    fn default() -> Self {
        Self::new()
    }
}

impl Globals {
    pub fn new() -> Self {
        Self {
            params: ParameterBag::new(SectionKind::Global),
            debug: false,
            quiet: false,
            daemon: false,
        }
    }

    /// Read a `global` section; the header must not carry a name
    pub fn parse(cursor: &mut TextCursor<'_>) -> Result<Self, ParseError> {
        parse_block(cursor, |name, position| match name {
            Some(found) => Err(ParseError::UnexpectedName {
                section: SectionKind::Global.as_str(),
                found: found.to_string(),
                position,
            }),
            None => Ok(Globals::new()),
        })
    }

    pub fn params(&self) -> &ParameterBag {
        &self.params
    }

    pub fn add_parameter(&mut self, keyword: &str, args: impl Into<ArgInput>) -> &mut Self {
        self.params.add_parameter(keyword, args);
        self
    }

    pub fn add_parameter_with_priority(
        &mut self,
        keyword: &str,
        args: impl Into<ArgInput>,
        priority: i32,
    ) -> &mut Self {
        self.params.add_parameter_with_priority(keyword, args, priority);
        self
    }

    pub fn remove_parameter(&mut self, key: impl Into<ParamKey>) -> &mut Self {
        self.params.remove_parameter(key);
        self
    }

    pub fn parameter(&self, key: impl Into<ParamKey>) -> Option<&[String]> {
        self.params.parameter(key)
    }

    pub fn parameter_exists(&self, key: impl Into<ParamKey>) -> bool {
        self.params.parameter_exists(key)
    }

    pub fn set_parameter_order<I, E>(&mut self, order: I) -> &mut Self
    where
        I: IntoIterator<Item = E>,
        E: Into<OrderEntry>,
    {
        self.params.set_parameter_order(order);
        self
    }

    pub fn add_blank_line(&mut self) -> &mut Self {
        self.params.add_blank_line();
        self
    }

    pub fn comment(&self) -> Option<&Comment> {
        self.params.comment()
    }

    pub fn set_comment(&mut self, comment: Comment) -> &mut Self {
        self.params.set_comment(comment);
        self
    }

    pub fn set_debug(&mut self, debug: bool) -> &mut Self {
        self.debug = debug;
        self
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn set_quiet(&mut self, quiet: bool) -> &mut Self {
        self.quiet = quiet;
        self
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn set_daemon(&mut self, daemon: bool) -> &mut Self {
        self.daemon = daemon;
        self
    }

    pub fn is_daemon(&self) -> bool {
        self.daemon
    }

    fn flags(&self) -> impl Iterator<Item = &'static str> {
        [
            (self.quiet, "quiet"),
            (self.debug, "debug"),
            (self.daemon, "daemon"),
        ]
        .into_iter()
        .filter_map(|(set, word)| set.then_some(word))
    }

    pub fn pretty_print(&self, indent_level: usize, options: &FormatOptions) -> String {
        let mut body = self.params.render_body(indent_level, options, |_, _, _| None);
        while body.ends_with("\n\n") {
            body.pop();
        }

        let indent = options.indent(indent_level);
        for flag in self.flags() {
            body.push_str(&indent);
            body.push_str(flag);
            body.push('\n');
        }

        self.params.frame(&header(SectionKind::Global, ""), &body, indent_level, options)
    }
}

impl Section for Globals {
    fn section_kind(&self) -> SectionKind {
        SectionKind::Global
    }

    fn section_name(&self) -> &str {
        ""
    }

    fn directive_count(&self) -> usize {
        self.params.directive_count() + self.flags().count()
    }

    fn handle_line(&mut self, tokens: Vec<String>, _position: usize) -> Result<(), ParseError> {
        match tokens.as_slice() {
            [flag] if flag == "debug" => self.debug = true,
            [flag] if flag == "quiet" => self.quiet = true,
            [flag] if flag == "daemon" => self.daemon = true,
            [keyword, args @ ..] => {
                self.params.add_parameter(keyword, args.to_vec());
            }
            [] => {}
        }
        Ok(())
    }

    fn push_blank_line(&mut self) {
        self.params.add_blank_line();
    }

    fn finish(&mut self) {
        self.params.trim_trailing_blank_lines();
    }
}

impl fmt::Display for Globals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_print(0, &FormatOptions::default()))
    }
}

//! The parameter bag shared by every section
//!
//! A bag is an insertion-ordered map from [`ParamKey`] to argument lists,
//! plus optional per-key print priorities and an optional print order made
//! of key prefixes.

mod key;

pub use key::{ArgInput, ParamKey};

use crate::comment::Comment;
use crate::section::SectionKind;
use hapconf_core::FormatOptions;
use indexmap::IndexMap;

/// One entry of an explicit print order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    /// Matched against printed keys, see [`ParamKey::matches_prefix`]
    pub prefix: String,
    /// Emit an empty line after this group when another group follows
    pub blank_line_after: bool,
}

impl OrderEntry {
    pub fn new(prefix: impl Into<String>, blank_line_after: bool) -> Self {
        Self {
            prefix: prefix.into(),
            blank_line_after,
        }
    }
}

impl From<&str> for OrderEntry {
    fn from(prefix: &str) -> Self {
        OrderEntry::new(prefix, false)
    }
}

impl From<String> for OrderEntry {
    fn from(prefix: String) -> Self {
        OrderEntry::new(prefix, false)
    }
}

impl From<(&str, bool)> for OrderEntry {
    fn from((prefix, blank_line_after): (&str, bool)) -> Self {
        OrderEntry::new(prefix, blank_line_after)
    }
}

/// Ordered, keyed store of directives
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBag {
    kind: SectionKind,
    parameters: IndexMap<ParamKey, Vec<String>>,
    priorities: IndexMap<ParamKey, i32>,
    order: Vec<OrderEntry>,
    comment: Option<Comment>,
    blank_lines: usize,
}

impl ParameterBag {
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            parameters: IndexMap::new(),
            priorities: IndexMap::new(),
            order: Vec::new(),
            comment: None,
            blank_lines: 0,
        }
    }

    /// Section kind this bag belongs to; selects the duplicate-keyword table
    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    /// Add or overwrite a directive.
    ///
    /// For keywords listed in the section's duplicate table, the leading
    /// arguments move into the key: `timeout connect 5s` is stored as
    /// `timeout connect` → `[5s]`.
    pub fn add_parameter(&mut self, keyword: &str, args: impl Into<ArgInput>) -> &mut Self {
        let (key, args) = self.make_key(keyword, args.into());
        self.insert(key, args, None)
    }

    /// Like [`add_parameter`](Self::add_parameter), printing before every
    /// directive without a priority, lowest priority first
    pub fn add_parameter_with_priority(
        &mut self,
        keyword: &str,
        args: impl Into<ArgInput>,
        priority: i32,
    ) -> &mut Self {
        let (key, args) = self.make_key(keyword, args.into());
        self.insert(key, args, Some(priority))
    }

    /// Add a directive without arguments
    pub fn add_flag(&mut self, keyword: &str) -> &mut Self {
        self.add_parameter(keyword, ArgInput::none())
    }

    fn make_key(&self, keyword: &str, args: ArgInput) -> (ParamKey, Vec<String>) {
        let mut args = args.into_args(keyword);
        let count = self.kind.duplicate_arg_count(keyword).min(args.len());
        if count == 0 {
            return (ParamKey::bare(keyword), args);
        }

        let rest = args.split_off(count);
        (ParamKey::identified(keyword, args.join(" ")), rest)
    }

    pub(crate) fn insert(
        &mut self,
        key: ParamKey,
        args: Vec<String>,
        priority: Option<i32>,
    ) -> &mut Self {
        match priority {
            Some(priority) => {
                self.priorities.insert(key.clone(), priority);
            }
            None => {
                self.priorities.shift_remove(&key);
            }
        }
        self.parameters.insert(key, args);
        self
    }

    pub fn remove_parameter(&mut self, key: impl Into<ParamKey>) -> &mut Self {
        let key = key.into();
        self.parameters.shift_remove(&key);
        self.priorities.shift_remove(&key);
        self
    }

    /// Arguments of a directive, looked up by key or by its printed form
    pub fn parameter(&self, key: impl Into<ParamKey>) -> Option<&[String]> {
        self.parameters.get(&key.into()).map(Vec::as_slice)
    }

    pub fn parameter_exists(&self, key: impl Into<ParamKey>) -> bool {
        self.parameters.contains_key(&key.into())
    }

    pub fn priority(&self, key: impl Into<ParamKey>) -> Option<i32> {
        self.priorities.get(&key.into()).copied()
    }

    /// Directives in insertion order
    pub fn parameters(&self) -> impl Iterator<Item = (&ParamKey, &[String])> {
        self.parameters.iter().map(|(key, args)| (key, args.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Number of real directives, blank-line placeholders excluded
    pub fn directive_count(&self) -> usize {
        self.parameters.keys().filter(|key| !key.is_blank_line()).count()
    }

    /// Replace the print order.
    ///
    /// ```
    /// use hapconf_config::{ParameterBag, SectionKind};
    ///
    /// let mut bag = ParameterBag::new(SectionKind::Backend);
    /// bag.set_parameter_order([("mode", true), ("option", false)]);
    /// bag.set_parameter_order(["mode", "server"]);
    /// ```
    pub fn set_parameter_order<I, E>(&mut self, order: I) -> &mut Self
    where
        I: IntoIterator<Item = E>,
        E: Into<OrderEntry>,
    {
        self.order = order.into_iter().map(Into::into).collect();
        self
    }

    pub fn parameter_order(&self) -> &[OrderEntry] {
        &self.order
    }

    pub fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }

    pub fn set_comment(&mut self, comment: Comment) -> &mut Self {
        self.comment = Some(comment);
        self
    }

    pub fn remove_comment(&mut self) -> &mut Self {
        self.comment = None;
        self
    }

    pub fn has_comment(&self) -> bool {
        self.comment.is_some()
    }

    /// Append an empty-line placeholder
    pub fn add_blank_line(&mut self) -> &mut Self {
        let key = ParamKey::BlankLine(self.blank_lines);
        self.blank_lines += 1;
        self.insert(key, Vec::new(), None)
    }

    /// Drop empty-line placeholders at the end of the insertion order
    pub(crate) fn trim_trailing_blank_lines(&mut self) {
        while self
            .parameters
            .last()
            .is_some_and(|(key, _)| key.is_blank_line())
        {
            if let Some((key, _)) = self.parameters.pop() {
                self.priorities.shift_remove(&key);
            }
        }
    }

    /// Width of the longest directive name, used for column alignment
    pub fn longest_keyword_len(&self) -> usize {
        self.parameters
            .keys()
            .map(|key| key.keyword().len())
            .max()
            .unwrap_or(0)
    }

    /// Directives in print order.
    ///
    /// Prioritized directives come first (ascending, stable). With an
    /// explicit order, directives are then grouped by prefix; a group flagged
    /// with `blank_line_after` is followed by a fresh blank-line placeholder
    /// only when another non-empty group follows it. Parsed blank lines are
    /// positional and dropped once an explicit order regroups the body.
    pub fn ordered_parameters(&self) -> Vec<(ParamKey, Vec<String>)> {
        let mut entries: Vec<(ParamKey, Vec<String>)> = self
            .parameters
            .iter()
            .map(|(key, args)| (key.clone(), args.clone()))
            .collect();

        if !self.priorities.is_empty() {
            entries.sort_by_key(|(key, _)| match self.priorities.get(key) {
                Some(priority) => (0, *priority),
                None => (1, 0),
            });
        }

        if self.order.is_empty() {
            return entries;
        }

        let mut remaining: Vec<_> = entries
            .into_iter()
            .filter(|(key, _)| !key.is_blank_line())
            .collect();
        let mut ordered = Vec::with_capacity(remaining.len());
        let mut next_blank = self.blank_lines;
        let mut pending_blank = false;

        for entry in &self.order {
            let (group, rest): (Vec<_>, Vec<_>) = remaining
                .into_iter()
                .partition(|(key, _)| key.matches_prefix(&entry.prefix));
            remaining = rest;

            if group.is_empty() {
                continue;
            }
            if pending_blank {
                ordered.push((ParamKey::BlankLine(next_blank), Vec::new()));
                next_blank += 1;
            }
            ordered.extend(group);
            pending_blank = entry.blank_line_after;
        }

        if !remaining.is_empty() {
            if pending_blank {
                ordered.push((ParamKey::BlankLine(next_blank), Vec::new()));
            }
            ordered.extend(remaining);
        }

        ordered
    }

    /// Render the body lines of the bag.
    ///
    /// `render` may take over a directive and return the lines to print for
    /// it (without indentation); it receives the alignment width.
    pub(crate) fn render_body<F>(
        &self,
        indent_level: usize,
        options: &FormatOptions,
        render: F,
    ) -> String
    where
        F: FnMut(&ParamKey, &[String], usize) -> Option<Vec<String>>,
    {
        let entries = self.ordered_parameters();
        let width = self.longest_keyword_len();
        render_entries(&entries, width, indent_level, options, render)
    }

    /// Wrap a rendered body with the comment, the header and one trailing
    /// empty line. An empty body renders nothing.
    pub(crate) fn frame(
        &self,
        header: &str,
        body: &str,
        indent_level: usize,
        options: &FormatOptions,
    ) -> String {
        if body.is_empty() {
            return String::new();
        }

        let comment = self
            .comment
            .as_ref()
            .map(|comment| comment.pretty_print(indent_level.saturating_sub(1), options))
            .unwrap_or_default();

        format!("{comment}{header}\n{body}\n")
    }
}

/// Render directives one per line, blank-line placeholders as empty lines
pub(crate) fn render_entries<F>(
    entries: &[(ParamKey, Vec<String>)],
    width: usize,
    indent_level: usize,
    options: &FormatOptions,
    mut render: F,
) -> String
where
    F: FnMut(&ParamKey, &[String], usize) -> Option<Vec<String>>,
{
    let indent = options.indent(indent_level);
    let mut body = String::new();

    for (key, args) in entries {
        if key.is_blank_line() {
            body.push('\n');
            continue;
        }

        let lines = render(key, args, width)
            .unwrap_or_else(|| default_lines(key, args, width, options.max_line_args));
        for line in lines {
            body.push_str(&indent);
            body.push_str(&line);
            body.push('\n');
        }
    }

    body
}

/// Section header line: `<type>[ <name>]`
pub(crate) fn header(kind: SectionKind, name: &str) -> String {
    if name.is_empty() {
        kind.as_str().to_string()
    } else {
        format!("{kind} {name}")
    }
}

/// Format one directive with its name padded to `width`
pub(crate) fn format_directive(key: &ParamKey, args: &[String], width: usize) -> String {
    let mut line = format!("{:<width$}", key.keyword());

    if let Some(id) = key.id() {
        line.push(' ');
        line.push_str(id);
    }

    if !args.is_empty() {
        // `bind *:80`, not `bind * :80`
        if !(key.keyword() == "bind" && key.id().is_some()) {
            line.push(' ');
        }
        line.push_str(&args.join(" "));
    }

    line.trim_end().to_string()
}

fn default_lines(
    key: &ParamKey,
    args: &[String],
    width: usize,
    max_line_args: usize,
) -> Vec<String> {
    if key.keyword() == "acl" && args.len() > max_line_args {
        return wrap_acl(key, args, width, max_line_args);
    }
    vec![format_directive(key, args, width)]
}

/// Number of fixed leading ACL tokens: the fetch, plus `-f`/`-m <method>`
/// or a single flag
pub(crate) fn acl_leading_count(args: &[String]) -> usize {
    let leading = match args.get(1).map(String::as_str) {
        Some("-f" | "-m") => 3,
        Some(flag) if flag.starts_with('-') => 2,
        _ => 1,
    };
    leading.min(args.len())
}

/// Split an oversized ACL over several lines, repeating its fixed leading
/// tokens on each one
fn wrap_acl(key: &ParamKey, args: &[String], width: usize, max_line_args: usize) -> Vec<String> {
    let (head, tail) = args.split_at(acl_leading_count(args));
    let chunk_size = max_line_args.saturating_sub(1).max(1);

    tail.chunks(chunk_size)
        .map(|chunk| {
            let line_args: Vec<String> = head.iter().chain(chunk).cloned().collect();
            format_directive(key, &line_args, width)
        })
        .collect()
}

//! Directive keys and argument normalization

use std::fmt;

const BLANK_LINE_PREFIX: &str = "$emptyLine$";

/// Key of one directive inside a parameter bag
///
/// Repeatable directives carry an identity (`server app1`, `timeout connect`)
/// so that several of them can coexist in one section.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// A plain directive name: `mode`
    Bare(String),
    /// A directive name plus the leading arguments that identify it
    Identified { keyword: String, id: String },
    /// An identified directive that can repeat for the same id; the tag
    /// never shows up in printed output
    Tagged {
        keyword: String,
        id: String,
        tag: String,
    },
    /// Placeholder for an empty line
    BlankLine(usize),
}

impl ParamKey {
    pub fn bare(keyword: impl Into<String>) -> Self {
        ParamKey::Bare(keyword.into())
    }

    pub fn identified(keyword: impl Into<String>, id: impl Into<String>) -> Self {
        ParamKey::Identified {
            keyword: keyword.into(),
            id: id.into(),
        }
    }

    /// Identified key, tagged when `tag` is given
    pub fn tagged(keyword: impl Into<String>, id: impl Into<String>, tag: Option<&str>) -> Self {
        match tag {
            Some(tag) => ParamKey::Tagged {
                keyword: keyword.into(),
                id: id.into(),
                tag: tag.to_string(),
            },
            None => ParamKey::identified(keyword, id),
        }
    }

    /// Parse the rendered form produced by `Display`
    pub fn parse(text: &str) -> Self {
        if let Some(counter) = text
            .strip_prefix(BLANK_LINE_PREFIX)
            .and_then(|n| n.parse().ok())
        {
            return ParamKey::BlankLine(counter);
        }

        match text.split_once(' ') {
            None => ParamKey::Bare(text.to_string()),
            Some((keyword, rest)) => match rest.rsplit_once('|') {
                Some((id, tag)) if keyword == "use_backend" => ParamKey::Tagged {
                    keyword: keyword.to_string(),
                    id: id.to_string(),
                    tag: tag.to_string(),
                },
                _ => ParamKey::identified(keyword, rest),
            },
        }
    }

    /// Directive name; empty for blank lines
    pub fn keyword(&self) -> &str {
        match self {
            ParamKey::Bare(keyword)
            | ParamKey::Identified { keyword, .. }
            | ParamKey::Tagged { keyword, .. } => keyword,
            ParamKey::BlankLine(_) => "",
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            ParamKey::Identified { id, .. } | ParamKey::Tagged { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            ParamKey::Tagged { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn is_blank_line(&self) -> bool {
        matches!(self, ParamKey::BlankLine(_))
    }

    /// True if the printed key equals `prefix` or continues it with a space.
    ///
    /// `acl is_https` matches the prefixes `acl` and `acl is_https`, but not
    /// `ac`.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        let keyword = self.keyword();
        if self.is_blank_line() || !prefix.starts_with(keyword) {
            return false;
        }

        match (&prefix[keyword.len()..], self.id()) {
            ("", _) => true,
            (rest, Some(id)) => rest
                .strip_prefix(' ')
                .is_some_and(|rest| id == rest || id.starts_with(&format!("{rest} "))),
            (_, None) => false,
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Bare(keyword) => f.write_str(keyword),
            ParamKey::Identified { keyword, id } => write!(f, "{keyword} {id}"),
            ParamKey::Tagged { keyword, id, tag } => write!(f, "{keyword} {id}|{tag}"),
            ParamKey::BlankLine(counter) => write!(f, "{BLANK_LINE_PREFIX}{counter}"),
        }
    }
}

impl From<&str> for ParamKey {
    fn from(text: &str) -> Self {
        ParamKey::parse(text)
    }
}

impl From<String> for ParamKey {
    fn from(text: String) -> Self {
        ParamKey::parse(&text)
    }
}

impl From<&ParamKey> for ParamKey {
    fn from(key: &ParamKey) -> Self {
        key.clone()
    }
}

/// Arguments handed to `add_parameter`
///
/// A single string is split on whitespace, except for the `req*`/`rsp*`
/// family where it is kept whole since it usually holds a regex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgInput {
    Text(String),
    List(Vec<String>),
}

impl ArgInput {
    /// No arguments
    pub fn none() -> Self {
        ArgInput::List(Vec::new())
    }

    pub(crate) fn into_args(self, keyword: &str) -> Vec<String> {
        match self {
            ArgInput::Text(text) if keeps_whole_argument(keyword) => {
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![text]
                }
            }
            ArgInput::Text(text) => text.split_whitespace().map(str::to_string).collect(),
            ArgInput::List(args) => args,
        }
    }
}

fn keeps_whole_argument(keyword: &str) -> bool {
    keyword.starts_with("req") || keyword.starts_with("rsp")
}

impl Default for ArgInput {
    fn default() -> Self {
        ArgInput::none()
    }
}

impl From<&str> for ArgInput {
    fn from(text: &str) -> Self {
        ArgInput::Text(text.to_string())
    }
}

impl From<String> for ArgInput {
    fn from(text: String) -> Self {
        ArgInput::Text(text)
    }
}

impl From<&String> for ArgInput {
    fn from(text: &String) -> Self {
        ArgInput::Text(text.clone())
    }
}

impl From<Vec<String>> for ArgInput {
    fn from(args: Vec<String>) -> Self {
        ArgInput::List(args)
    }
}

impl From<Vec<&str>> for ArgInput {
    fn from(args: Vec<&str>) -> Self {
        ArgInput::List(args.into_iter().map(str::to_string).collect())
    }
}

impl From<&[String]> for ArgInput {
    fn from(args: &[String]) -> Self {
        ArgInput::List(args.to_vec())
    }
}

impl From<&[&str]> for ArgInput {
    fn from(args: &[&str]) -> Self {
        ArgInput::List(args.iter().map(|arg| arg.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ArgInput {
    fn from(args: [&str; N]) -> Self {
        ArgInput::List(args.into_iter().map(str::to_string).collect())
    }
}

//! The `resolvers` section: DNS nameservers used for runtime resolution

use crate::comment::Comment;
use crate::error::{InvalidParameterError, ParseError};
use crate::params::{ArgInput, ParamKey, ParameterBag, header, render_entries};
use crate::parser::TextCursor;
use crate::parser::block::{Section, parse_block, require_name};
use crate::section::SectionKind;
use hapconf_core::FormatOptions;
use indexmap::IndexMap;
use std::fmt;

/// Port used when a nameserver address does not carry one
pub const DEFAULT_DNS_PORT: u16 = 53;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nameserver {
    pub ip: String,
    pub port: u16,
}

impl fmt::Display for Nameserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolvers {
    name: String,
    params: ParameterBag,
    nameservers: IndexMap<String, Nameserver>,
}

impl Resolvers {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: ParameterBag::new(SectionKind::Resolvers),
            nameservers: IndexMap::new(),
        }
    }

    pub fn parse(cursor: &mut TextCursor<'_>) -> Result<Self, ParseError> {
        parse_block(cursor, |name, position| {
            require_name(SectionKind::Resolvers, name, position).map(Resolvers::new)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &ParameterBag {
        &self.params
    }

    /// Add a directive; nameservers must go through
    /// [`add_nameserver`](Self::add_nameserver)
    pub fn add_parameter(
        &mut self,
        keyword: &str,
        args: impl Into<ArgInput>,
    ) -> Result<&mut Self, InvalidParameterError> {
        if keyword == "nameserver" {
            return Err(InvalidParameterError::Rejected {
                message: "Please use the add_nameserver() method to add nameservers!".to_string(),
            });
        }
        self.params.add_parameter(keyword, args);
        Ok(self)
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

    pub fn comment(&self) -> Option<&Comment> {
        self.params.comment()
    }

    pub fn set_comment(&mut self, comment: Comment) -> &mut Self {
        self.params.set_comment(comment);
        self
    }

    pub fn add_nameserver(&mut self, name: &str, ip: &str, port: u16) -> &mut Self {
        let nameserver = Nameserver {
            ip: ip.to_string(),
            port,
        };
        self.nameservers.insert(name.to_string(), nameserver);
        self
    }

    pub fn nameserver(&self, name: &str) -> Option<&Nameserver> {
        self.nameservers.get(name)
    }

    pub fn nameserver_exists(&self, name: &str) -> bool {
        self.nameservers.contains_key(name)
    }

    pub fn remove_nameserver(&mut self, name: &str) -> &mut Self {
        self.nameservers.shift_remove(name);
        self
    }

    pub fn nameservers(&self) -> impl Iterator<Item = (&str, &Nameserver)> {
        self.nameservers
            .iter()
            .map(|(name, nameserver)| (name.as_str(), nameserver))
    }

    /// Nameservers first, then the other directives, all aligned on the
    /// same column
    pub fn pretty_print(&self, indent_level: usize, options: &FormatOptions) -> String {
        let mut width = self.params.longest_keyword_len();
        if !self.nameservers.is_empty() {
            width = width.max("nameserver".len());
        }

        let indent = options.indent(indent_level);
        let mut body = String::new();
        for (name, nameserver) in &self.nameservers {
            body.push_str(&format!("{indent}{:<width$} {name} {nameserver}\n", "nameserver"));
        }

        let entries = self.params.ordered_parameters();
        body.push_str(&render_entries(&entries, width, indent_level, options, |_, _, _| None));

        let header = header(SectionKind::Resolvers, &self.name);
        self.params.frame(&header, &body, indent_level, options)
    }

    fn parse_nameserver(&mut self, args: &[String], position: usize) -> Result<(), ParseError> {
        let rejected = |message: String| ParseError::Parameter {
            source: InvalidParameterError::Rejected { message },
            position,
        };

        let [name, address] = args else {
            return Err(rejected(format!(
                "nameserver takes a name and an address in resolvers \"{}\", found '{}'",
                self.name,
                args.join(" ")
            )));
        };

        // `[2001:db8::1]` carries no port
        let (ip, port) = match address.rsplit_once(':').filter(|_| !address.ends_with(']')) {
            Some((ip, port)) => match port.parse() {
                Ok(port) => (ip, port),
                Err(_) => {
                    return Err(rejected(format!(
                        "invalid port '{port}' for nameserver {name} in resolvers \"{}\"",
                        self.name
                    )));
                }
            },
            None => (address.as_str(), DEFAULT_DNS_PORT),
        };

        self.add_nameserver(name, ip, port);
        Ok(())
    }
}

impl Section for Resolvers {
    fn section_kind(&self) -> SectionKind {
        SectionKind::Resolvers
    }

    fn section_name(&self) -> &str {
        &self.name
    }

    fn directive_count(&self) -> usize {
        self.params.directive_count() + self.nameservers.len()
    }

    fn handle_line(&mut self, tokens: Vec<String>, position: usize) -> Result<(), ParseError> {
        match tokens.split_first() {
            Some((keyword, args)) if keyword == "nameserver" => self.parse_nameserver(args, position),
            Some((keyword, args)) => {
                self.params.add_parameter(keyword, args.to_vec());
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn push_blank_line(&mut self) {
        self.params.add_blank_line();
    }

    fn finish(&mut self) {
        self.params.trim_trailing_blank_lines();
    }
}

impl fmt::Display for Resolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_print(0, &FormatOptions::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nameserver_through_add_parameter_is_rejected() {
        let mut resolvers = Resolvers::new("dns");
        let err = resolvers.add_parameter("nameserver", "google 8.8.8.8:53").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please use the add_nameserver() method to add nameservers!"
        );
    }

    #[test]
    fn test_parameters() {
        let mut resolvers = Resolvers::new("dns");
        resolvers
            .add_parameter("timeout", "retry 1s")
            .unwrap()
            .add_parameter("hold", "valid 60s")
            .unwrap();

        assert_eq!(resolvers.parameter("timeout retry"), Some(&["1s".to_string()][..]));
        assert_eq!(
            resolvers.parameter("hold"),
            Some(&["valid".to_string(), "60s".to_string()][..])
        );
    }

    #[test]
    fn test_nameservers() {
        let mut resolvers = Resolvers::new("dns");
        resolvers
            .add_nameserver("google", "8.8.8.8", DEFAULT_DNS_PORT)
            .add_nameserver("local", "127.0.0.1", 5353);

        assert!(resolvers.nameserver_exists("local"));
        assert_eq!(resolvers.nameserver("local").map(|ns| ns.port), Some(5353));

        resolvers.remove_nameserver("local");
        assert!(!resolvers.nameserver_exists("local"));
        assert_eq!(resolvers.nameservers().count(), 1);
    }

    #[test]
    fn test_print() {
        let mut resolvers = Resolvers::new("dns");
        resolvers
            .add_parameter("resolve_retries", "3")
            .unwrap()
            .add_parameter("timeout", "retry 1s")
            .unwrap();
        resolvers.add_nameserver("google", "8.8.8.8", 53);

        assert_eq!(
            resolvers.pretty_print(1, &FormatOptions::default()),
            "resolvers dns\n\
             \x20   nameserver      google 8.8.8.8:53\n\
             \x20   resolve_retries 3\n\
             \x20   timeout         retry 1s\n\
             \n"
        );
    }

    #[test]
    fn test_parse() {
        let text = "resolvers dns\n\
                    \x20   nameserver google 8.8.8.8:53\n\
                    \x20   nameserver local 127.0.0.1\n\
                    \x20   nameserver v6 [2001:db8::1]:5353\n\
                    \x20   hold valid 10s\n";
        let resolvers = Resolvers::parse(&mut TextCursor::new(text)).unwrap();

        assert_eq!(resolvers.nameserver("google").map(ToString::to_string), Some("8.8.8.8:53".into()));
        assert_eq!(resolvers.nameserver("local").map(|ns| ns.port), Some(DEFAULT_DNS_PORT));
        assert_eq!(
            resolvers.nameserver("v6"),
            Some(&Nameserver {
                ip: "[2001:db8::1]".to_string(),
                port: 5353
            })
        );
        assert_eq!(resolvers.parameter("hold"), Some(&["valid".to_string(), "10s".to_string()][..]));
    }

    #[test]
    fn test_parse_bracketed_address_without_port() {
        let text = "resolvers dns\n    nameserver v6 [2001:db8::1]\n";
        let resolvers = Resolvers::parse(&mut TextCursor::new(text)).unwrap();
        assert_eq!(resolvers.nameserver("v6").map(ToString::to_string), Some("[2001:db8::1]:53".into()));
    }

    #[test]
    fn test_parse_invalid_nameserver() {
        let lines = [
            "nameserver google 8.8.8.8:53 extra",
            "nameserver google 8.8.8.8:dns",
            "nameserver google",
        ];
        for line in lines {
            let text = format!("resolvers dns\n    {line}\n");
            let err = Resolvers::parse(&mut TextCursor::new(&text)).unwrap_err();
            assert!(
                matches!(
                    err,
                    ParseError::Parameter {
                        source: InvalidParameterError::Rejected { .. },
                        position: 14,
                    }
                ),
                "{line}: {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_requires_name() {
        let err = Resolvers::parse(&mut TextCursor::new("resolvers\n")).unwrap_err();
        assert!(matches!(err, ParseError::MissingName { section: "resolvers", .. }));
    }
}

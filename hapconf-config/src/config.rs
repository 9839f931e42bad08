//! Whole-document model
//!
//! [`Config`] owns one of each singleton section, the named sections, and
//! the comments and blank lines found above the first section.

use crate::comment::Comment;
use crate::error::{Error, InvalidParameterError, ParseError};
use crate::globals::Globals;
use crate::parser::TextCursor;
use crate::proxy::{Proxy, ProxyKind};
use crate::resolvers::Resolvers;
use crate::section::SectionKind;
use crate::userlist::Userlist;
use hapconf_core::FormatOptions;
use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Items printed before the first section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leading {
    Comment(Comment),
    BlankLine,
}

/// A parsed or hand-built configuration document
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    global: Globals,
    defaults: Proxy,
    userlists: IndexMap<String, Userlist>,
    resolvers: IndexMap<String, Resolvers>,
    proxies: IndexMap<(ProxyKind, String), Proxy>,
    leading: Vec<Leading>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            global: Globals::new(),
            defaults: Proxy::defaults(),
            userlists: IndexMap::new(),
            resolvers: IndexMap::new(),
            proxies: IndexMap::new(),
            leading: Vec::new(),
        }
    }

    /// Parse a whole document
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut config = Config::new();
        let mut cursor = TextCursor::new(text);
        let mut seen = Vec::new();

        while !cursor.eof() {
            let position = cursor.position();
            let line = cursor.rest_of_line().trim();

            if line.is_empty() {
                config.leading.push(Leading::BlankLine);
                cursor.next_line();
                continue;
            }

            if line.starts_with('#') {
                let comment = Comment::from_cursor(&mut cursor);
                match section_at(&cursor) {
                    Some(kind) => config.parse_section(kind, &mut cursor, Some(comment), &mut seen)?,
                    None => config.leading.push(Leading::Comment(comment)),
                }
                continue;
            }

            match section_at(&cursor) {
                Some(kind) => config.parse_section(kind, &mut cursor, None, &mut seen)?,
                None => {
                    tracing::warn!(position, line, "skipping line outside of any section");
                    cursor.next_line();
                }
            }
        }

        tracing::debug!(
            proxies = config.proxies.len(),
            userlists = config.userlists.len(),
            resolvers = config.resolvers.len(),
            "parsed configuration"
        );
        Ok(config)
    }

    fn parse_section(
        &mut self,
        kind: SectionKind,
        cursor: &mut TextCursor<'_>,
        comment: Option<Comment>,
        seen: &mut Vec<(SectionKind, String)>,
    ) -> Result<(), ParseError> {
        let position = cursor.position();

        let name = match kind {
            SectionKind::Global => {
                let mut global = Globals::parse(cursor)?;
                if let Some(comment) = comment {
                    global.set_comment(comment);
                }
                self.global = global;
                String::new()
            }
            SectionKind::Defaults => {
                let mut defaults = Proxy::parse(ProxyKind::Defaults, cursor)?;
                if let Some(comment) = comment {
                    defaults.set_comment(comment);
                }
                self.defaults = defaults;
                String::new()
            }
            SectionKind::Userlist => {
                let mut userlist = Userlist::parse(cursor)?;
                if let Some(comment) = comment {
                    userlist.set_comment(comment);
                }
                let name = userlist.name().to_string();
                self.userlists.insert(name.clone(), userlist);
                name
            }
            SectionKind::Resolvers => {
                let mut resolvers = Resolvers::parse(cursor)?;
                if let Some(comment) = comment {
                    resolvers.set_comment(comment);
                }
                let name = resolvers.name().to_string();
                self.resolvers.insert(name.clone(), resolvers);
                name
            }
            SectionKind::Frontend | SectionKind::Backend | SectionKind::Listen => {
                let proxy_kind = match kind {
                    SectionKind::Frontend => ProxyKind::Frontend,
                    SectionKind::Backend => ProxyKind::Backend,
                    _ => ProxyKind::Listen,
                };
                let mut proxy = Proxy::parse(proxy_kind, cursor)?;
                if let Some(comment) = comment {
                    proxy.set_comment(comment);
                }
                let name = proxy.name().to_string();
                self.proxies.insert((proxy_kind, name.clone()), proxy);
                name
            }
        };

        let id = (kind, name);
        if seen.contains(&id) {
            tracing::warn!(
                position,
                section = %id.0,
                name = %id.1,
                "section appears more than once, keeping the last one"
            );
        } else {
            seen.push(id);
        }
        Ok(())
    }

    /// Read and parse a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let text = hapconf_core::load_config(path)?;
        Ok(Self::parse(&text)?)
    }

    /// Print the document and write it to `path`. Nothing is written if
    /// printing fails.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, options: &FormatOptions) -> Result<(), Error> {
        let text = self.pretty_print(options);
        hapconf_core::save_config(path, &text)?;
        Ok(())
    }

    // ========================================
    // global / defaults
    // ========================================

    pub fn global(&self) -> &Globals {
        &self.global
    }

    pub fn global_mut(&mut self) -> &mut Globals {
        &mut self.global
    }

    /// Replace the global section
    pub fn add_global(&mut self, global: Globals) -> &mut Self {
        self.global = global;
        self
    }

    pub fn set_debug(&mut self, debug: bool) -> &mut Self {
        self.global.set_debug(debug);
        self
    }

    pub fn set_quiet(&mut self, quiet: bool) -> &mut Self {
        self.global.set_quiet(quiet);
        self
    }

    pub fn set_daemon(&mut self, daemon: bool) -> &mut Self {
        self.global.set_daemon(daemon);
        self
    }

    pub fn defaults(&self) -> &Proxy {
        &self.defaults
    }

    pub fn defaults_mut(&mut self) -> &mut Proxy {
        &mut self.defaults
    }

    /// Replace the defaults section; `defaults` must be a defaults proxy
    pub fn add_defaults(&mut self, defaults: Proxy) -> Result<&mut Self, InvalidParameterError> {
        if defaults.kind() != ProxyKind::Defaults {
            return Err(InvalidParameterError::Rejected {
                message: format!("Cannot use {} \"{}\" as defaults!", defaults.kind(), defaults.name()),
            });
        }
        self.defaults = defaults;
        Ok(self)
    }

    // ========================================
    // userlists / resolvers
    // ========================================

    pub fn add_userlist(&mut self, userlist: Userlist) -> &mut Self {
        self.userlists.insert(userlist.name().to_string(), userlist);
        self
    }

    pub fn userlist(&self, name: &str) -> Option<&Userlist> {
        self.userlists.get(name)
    }

    pub fn userlist_mut(&mut self, name: &str) -> Option<&mut Userlist> {
        self.userlists.get_mut(name)
    }

    pub fn userlist_exists(&self, name: &str) -> bool {
        self.userlists.contains_key(name)
    }

    pub fn remove_userlist(&mut self, name: &str) -> &mut Self {
        self.userlists.shift_remove(name);
        self
    }

    pub fn userlists(&self) -> impl Iterator<Item = &Userlist> {
        self.userlists.values()
    }

    pub fn add_resolvers(&mut self, resolvers: Resolvers) -> &mut Self {
        self.resolvers.insert(resolvers.name().to_string(), resolvers);
        self
    }

    pub fn resolvers(&self, name: &str) -> Option<&Resolvers> {
        self.resolvers.get(name)
    }

    pub fn resolvers_mut(&mut self, name: &str) -> Option<&mut Resolvers> {
        self.resolvers.get_mut(name)
    }

    pub fn resolvers_exists(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    pub fn remove_resolvers(&mut self, name: &str) -> &mut Self {
        self.resolvers.shift_remove(name);
        self
    }

    /// Every resolvers section in insertion order
    pub fn all_resolvers(&self) -> impl Iterator<Item = &Resolvers> {
        self.resolvers.values()
    }

    // ========================================
    // frontend / backend / listen
    // ========================================

    /// Add a frontend, backend or listen proxy, replacing one of the same
    /// kind and name
    pub fn add_proxy(&mut self, proxy: Proxy) -> Result<&mut Self, InvalidParameterError> {
        if proxy.kind() == ProxyKind::Defaults {
            return Err(InvalidParameterError::Rejected {
                message: "Use add_defaults() to set the defaults section!".to_string(),
            });
        }
        self.proxies
            .insert((proxy.kind(), proxy.name().to_string()), proxy);
        Ok(self)
    }

    fn add_proxy_of(&mut self, kind: ProxyKind, proxy: Proxy) -> Result<&mut Self, InvalidParameterError> {
        if proxy.kind() != kind {
            return Err(InvalidParameterError::Rejected {
                message: format!("Expected a {kind} proxy, got {} \"{}\"!", proxy.kind(), proxy.name()),
            });
        }
        self.add_proxy(proxy)
    }

    pub fn add_frontend(&mut self, frontend: Proxy) -> Result<&mut Self, InvalidParameterError> {
        self.add_proxy_of(ProxyKind::Frontend, frontend)
    }

    pub fn add_backend(&mut self, backend: Proxy) -> Result<&mut Self, InvalidParameterError> {
        self.add_proxy_of(ProxyKind::Backend, backend)
    }

    pub fn add_listen(&mut self, listen: Proxy) -> Result<&mut Self, InvalidParameterError> {
        self.add_proxy_of(ProxyKind::Listen, listen)
    }

    pub fn proxy(&self, kind: ProxyKind, name: &str) -> Option<&Proxy> {
        self.proxies.get(&(kind, name.to_string()))
    }

    pub fn proxy_mut(&mut self, kind: ProxyKind, name: &str) -> Option<&mut Proxy> {
        self.proxies.get_mut(&(kind, name.to_string()))
    }

    pub fn proxy_exists(&self, kind: ProxyKind, name: &str) -> bool {
        self.proxy(kind, name).is_some()
    }

    pub fn remove_proxy(&mut self, kind: ProxyKind, name: &str) -> &mut Self {
        self.proxies.shift_remove(&(kind, name.to_string()));
        self
    }

    pub fn frontend(&self, name: &str) -> Option<&Proxy> {
        self.proxy(ProxyKind::Frontend, name)
    }

    pub fn frontend_mut(&mut self, name: &str) -> Option<&mut Proxy> {
        self.proxy_mut(ProxyKind::Frontend, name)
    }

    pub fn frontend_exists(&self, name: &str) -> bool {
        self.proxy_exists(ProxyKind::Frontend, name)
    }

    pub fn remove_frontend(&mut self, name: &str) -> &mut Self {
        self.remove_proxy(ProxyKind::Frontend, name)
    }

    pub fn backend(&self, name: &str) -> Option<&Proxy> {
        self.proxy(ProxyKind::Backend, name)
    }

    pub fn backend_mut(&mut self, name: &str) -> Option<&mut Proxy> {
        self.proxy_mut(ProxyKind::Backend, name)
    }

    pub fn backend_exists(&self, name: &str) -> bool {
        self.proxy_exists(ProxyKind::Backend, name)
    }

    pub fn remove_backend(&mut self, name: &str) -> &mut Self {
        self.remove_proxy(ProxyKind::Backend, name)
    }

    pub fn listen(&self, name: &str) -> Option<&Proxy> {
        self.proxy(ProxyKind::Listen, name)
    }

    pub fn listen_mut(&mut self, name: &str) -> Option<&mut Proxy> {
        self.proxy_mut(ProxyKind::Listen, name)
    }

    pub fn listen_exists(&self, name: &str) -> bool {
        self.proxy_exists(ProxyKind::Listen, name)
    }

    pub fn remove_listen(&mut self, name: &str) -> &mut Self {
        self.remove_proxy(ProxyKind::Listen, name)
    }

    /// Proxies in insertion order
    pub fn proxies(&self) -> impl Iterator<Item = &Proxy> {
        self.proxies.values()
    }

    /// Proxies sorted by ascending print priority; ties keep insertion order
    pub fn proxies_by_priority(&self) -> Vec<&Proxy> {
        let mut proxies: Vec<&Proxy> = self.proxies.values().collect();
        proxies.sort_by_key(|proxy| proxy.print_priority());
        proxies
    }

    // ========================================
    // Leading items
    // ========================================

    pub fn add_comment(&mut self, comment: Comment) -> &mut Self {
        self.leading.push(Leading::Comment(comment));
        self
    }

    pub fn add_blank_line(&mut self) -> &mut Self {
        self.leading.push(Leading::BlankLine);
        self
    }

    pub fn leading(&self) -> &[Leading] {
        &self.leading
    }

    /// Render the document. The output ends with exactly one newline.
    pub fn pretty_print(&self, options: &FormatOptions) -> String {
        let mut text = String::new();

        for item in &self.leading {
            match item {
                Leading::Comment(comment) => text.push_str(&comment.pretty_print(0, options)),
                Leading::BlankLine => text.push('\n'),
            }
        }

        text.push_str(&self.global.pretty_print(1, options));
        text.push_str(&self.defaults.pretty_print(1, options));
        for userlist in self.userlists.values() {
            text.push_str(&userlist.pretty_print(1, options));
        }
        for resolvers in self.resolvers.values() {
            text.push_str(&resolvers.pretty_print(1, options));
        }
        for proxy in self.proxies_by_priority() {
            text.push_str(&proxy.pretty_print(1, options));
        }

        let mut text = text.trim_end().to_string();
        text.push('\n');
        text
    }
}

/// Section keyword starting the line under the cursor, if any
fn section_at(cursor: &TextCursor<'_>) -> Option<SectionKind> {
    if cursor.eof() {
        return None;
    }
    cursor
        .rest_of_line()
        .split_whitespace()
        .next()
        .and_then(SectionKind::from_keyword)
}

impl FromStr for Config {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Config::parse(text)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_print(&FormatOptions::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ArgInput;

    fn sample() -> Config {
        let mut config = Config::new();
        config.set_daemon(true);
        config.defaults_mut().add_parameter("mode", "http").unwrap();

        let mut frontend = Proxy::frontend("www");
        frontend
            .bind("*", 80, ArgInput::none())
            .unwrap()
            .add_parameter("default_backend", "app")
            .unwrap();
        config.add_frontend(frontend).unwrap();

        let mut backend = Proxy::backend("app");
        backend
            .add_server("web1", "127.0.0.1", Some(8080), ArgInput::none())
            .unwrap();
        config.add_backend(backend).unwrap();

        config
    }

    #[test]
    fn test_print() {
        assert_eq!(
            sample().to_string(),
            "global\n\
             \x20   daemon\n\
             \n\
             defaults\n\
             \x20   mode http\n\
             \n\
             frontend www\n\
             \x20   bind            *:80\n\
             \x20   default_backend app\n\
             \n\
             backend app\n\
             \x20   server web1 127.0.0.1:8080\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let config = sample();
        let reparsed = Config::parse(&config.to_string()).unwrap();

        assert!(reparsed.global().is_daemon());
        assert_eq!(reparsed.defaults().parameter("mode"), Some(&["http".to_string()][..]));

        let names: Vec<_> = reparsed.proxies().map(|p| (p.kind(), p.name().to_string())).collect();
        assert_eq!(
            names,
            vec![
                (ProxyKind::Frontend, "www".to_string()),
                (ProxyKind::Backend, "app".to_string()),
            ]
        );
        for proxy in config.proxies() {
            let other = reparsed.proxy(proxy.kind(), proxy.name()).unwrap();
            let ours: Vec<_> = proxy.params().parameters().collect();
            let theirs: Vec<_> = other.params().parameters().collect();
            assert_eq!(ours, theirs);
        }
        assert_eq!(reparsed.to_string(), config.to_string());
    }

    #[test]
    fn test_proxies_by_priority_is_stable() {
        let mut config = Config::new();
        config.add_backend(Proxy::backend("a")).unwrap();
        let mut frontend = Proxy::frontend("f");
        frontend.set_print_priority(999).unwrap();
        config.add_frontend(frontend).unwrap();
        config.add_backend(Proxy::backend("b")).unwrap();
        config.add_listen(Proxy::listen("l")).unwrap();

        let order: Vec<&str> = config.proxies_by_priority().iter().map(|p| p.name()).collect();
        assert_eq!(order, vec!["f", "a", "b", "l"]);
    }

    #[test]
    fn test_same_name_across_kinds() {
        let mut config = Config::new();
        config.add_frontend(Proxy::frontend("app")).unwrap();
        config.add_backend(Proxy::backend("app")).unwrap();

        assert!(config.frontend_exists("app"));
        assert!(config.backend_exists("app"));
        assert!(!config.listen_exists("app"));

        config.remove_frontend("app");
        assert!(!config.frontend_exists("app"));
        assert!(config.backend_exists("app"));
    }

    #[test]
    fn test_add_proxy_checks_kind() {
        let mut config = Config::new();
        assert!(config.add_frontend(Proxy::backend("app")).is_err());
        assert!(config.add_proxy(Proxy::defaults()).is_err());
        assert!(config.add_defaults(Proxy::listen("l")).is_err());
        assert!(config.add_defaults(Proxy::defaults()).is_ok());
    }

    #[test]
    fn test_comments() {
        let text = "# Managed by hapconf\n\
                    \n\
                    # Global settings\n\
                    # second line\n\
                    global\n\
                    \x20   maxconn 100\n\
                    \n\
                    # web entry point\n\
                    frontend www\n\
                    \x20   bind *:80\n";
        let config = Config::parse(text).unwrap();

        assert_eq!(
            config.leading(),
            &[Leading::Comment(Comment::new("Managed by hapconf")), Leading::BlankLine]
        );
        assert_eq!(
            config.global().comment().map(Comment::text),
            Some("Global settings\nsecond line")
        );
        assert_eq!(
            config.frontend("www").and_then(Proxy::comment).map(Comment::text),
            Some("web entry point")
        );
        assert_eq!(config.to_string(), text);
    }

    #[test]
    fn test_comment_not_above_section_stays_leading() {
        let text = "global\n    daemon\n\n# dangling\n\nbackend app\n    mode http\n";
        let config = Config::parse(text).unwrap();

        assert!(config.backend("app").and_then(Proxy::comment).is_none());
        assert_eq!(
            config.leading(),
            &[Leading::Comment(Comment::new("dangling")), Leading::BlankLine]
        );
    }

    #[test]
    fn test_comment_inside_section_is_dropped() {
        let text = "backend app\n    # note\n    mode http\n";
        let config = Config::parse(text).unwrap();

        assert_eq!(config.backend("app").unwrap().parameter("mode"), Some(&["http".to_string()][..]));
        assert!(config.leading().is_empty());
    }

    #[test]
    fn test_everything_is_parsed() {
        let text = "global\n\
                    \x20   log 127.0.0.1 local0 notice\n\
                    \x20   quiet\n\
                    defaults\n\
                    \x20   timeout connect 5s\n\
                    \x20   timeout client 50s\n\
                    userlist admins\n\
                    \x20   user alice password $6$hash\n\
                    resolvers dns\n\
                    \x20   nameserver google 8.8.8.8:53\n\
                    frontend www\n\
                    \x20   bind *:80\n\
                    backend app\n\
                    \x20   server web1 10.0.0.1:80\n\
                    listen stats\n\
                    \x20   bind *:9000\n";
        let config: Config = text.parse().unwrap();

        assert!(config.global().is_quiet());
        assert!(config.global().parameter_exists("log 127.0.0.1 local0"));
        assert!(config.defaults().parameter_exists("timeout connect"));
        assert!(config.defaults().parameter_exists("timeout client"));
        assert!(config.userlist("admins").unwrap().user_exists("alice"));
        assert!(config.resolvers("dns").unwrap().nameserver_exists("google"));
        assert!(config.frontend_exists("www"));
        assert!(config.backend_exists("app"));
        assert!(config.listen_exists("stats"));
    }

    #[test]
    fn test_repeated_defaults_keeps_last() {
        let text = "defaults\n    mode tcp\ndefaults\n    mode http\n";
        let config = Config::parse(text).unwrap();
        assert_eq!(config.defaults().parameter("mode"), Some(&["http".to_string()][..]));
    }

    #[test]
    fn test_stray_lines_are_skipped() {
        let text = "maxconn 10\nFoo\n  frontend www\n    mode http\n";
        let config = Config::parse(text).unwrap();

        assert!(config.frontend_exists("www"));
        assert!(config.leading().is_empty());
    }

    #[test]
    fn test_crlf_input() {
        let text = "global\r\n    daemon\r\n\r\nbackend app\r\n    mode http\r\n";
        let config = Config::parse(text).unwrap();

        assert!(config.global().is_daemon());
        assert_eq!(
            config.to_string(),
            "global\n    daemon\n\nbackend app\n    mode http\n"
        );
    }

    #[test]
    fn test_parse_error_propagates() {
        let err = Config::parse("global\n    daemon\nfrontend www\n    bind nowhere\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidBind { position: 31, .. }));
    }

    #[test]
    fn test_userlists_and_resolvers_api() {
        let mut config = Config::new();
        config
            .add_userlist(Userlist::new("admins"))
            .add_resolvers(Resolvers::new("dns"));
        config
            .userlist_mut("admins")
            .unwrap()
            .add_user("alice", Some("pw"), &["ops"]);
        config
            .resolvers_mut("dns")
            .unwrap()
            .add_nameserver("local", "127.0.0.1", 53);

        assert_eq!(config.userlists().count(), 1);
        assert_eq!(config.all_resolvers().count(), 1);
        assert!(config.resolvers_exists("dns"));
        assert_eq!(
            config.to_string(),
            "userlist admins\n    user alice password pw groups ops\n\n\
             resolvers dns\n    nameserver local 127.0.0.1:53\n"
        );

        config.remove_userlist("admins").remove_resolvers("dns");
        assert!(!config.userlist_exists("admins"));
        assert_eq!(config.to_string(), "\n");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("haproxy.cfg");

        let config = sample();
        config.save_to_file(&path, &FormatOptions::default()).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.to_string(), config.to_string());

        let missing = dir.path().join("missing.cfg");
        assert!(matches!(Config::from_file(&missing), Err(Error::Io(_))));
    }
}

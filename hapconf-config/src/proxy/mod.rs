//! Proxy sections: `frontend`, `backend`, `listen` and `defaults`
//!
//! All four share one [`Proxy`] type. What each kind may hold is decided by
//! a capability table; directive helpers check it before touching state, so
//! `bind` on a backend fails with the same error no matter how it is reached.

mod use_backend;

pub use use_backend::{ConditionTest, UseBackendKey, UseBackendRule};

use crate::comment::Comment;
use crate::error::{InvalidParameterError, ParseError};
use crate::params::{ArgInput, OrderEntry, ParamKey, ParameterBag, acl_leading_count, header};
use crate::parser::TextCursor;
use crate::parser::block::{Section, parse_block, require_name};
use crate::section::SectionKind;
use hapconf_core::FormatOptions;
use indexmap::IndexMap;
use std::fmt;
use use_backend::condition_groups;

/// Print priority of a proxy nobody reordered
pub const DEFAULT_PRINT_PRIORITY: i32 = 1000;

type ParamResult<T> = Result<T, InvalidParameterError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyKind {
    Frontend,
    Backend,
    Listen,
    Defaults,
}

/// Directive families gated per proxy kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capability {
    Bind,
    Server,
    Acl,
    PrintPriority,
    UseBackend,
}

impl ProxyKind {
    pub fn as_str(self) -> &'static str {
        self.section_kind().as_str()
    }

    pub fn section_kind(self) -> SectionKind {
        match self {
            ProxyKind::Frontend => SectionKind::Frontend,
            ProxyKind::Backend => SectionKind::Backend,
            ProxyKind::Listen => SectionKind::Listen,
            ProxyKind::Defaults => SectionKind::Defaults,
        }
    }

    fn allows(self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            ProxyKind::Frontend => matches!(capability, Bind | Acl | PrintPriority | UseBackend),
            ProxyKind::Backend => matches!(capability, Server | Acl | PrintPriority),
            ProxyKind::Listen => matches!(capability, Bind | Server | Acl | PrintPriority),
            ProxyKind::Defaults => false,
        }
    }
}

impl fmt::Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proxy section
#[derive(Debug, Clone, PartialEq)]
pub struct Proxy {
    kind: ProxyKind,
    name: String,
    print_priority: i32,
    params: ParameterBag,
    use_backends: IndexMap<UseBackendKey, UseBackendRule>,
}

impl Proxy {
    /// Create a proxy; `name` may only be empty for defaults
    pub fn new(kind: ProxyKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            print_priority: DEFAULT_PRINT_PRIORITY,
            params: ParameterBag::new(kind.section_kind()),
            use_backends: IndexMap::new(),
        }
    }

    pub fn frontend(name: impl Into<String>) -> Self {
        Self::new(ProxyKind::Frontend, name)
    }

    pub fn backend(name: impl Into<String>) -> Self {
        Self::new(ProxyKind::Backend, name)
    }

    pub fn listen(name: impl Into<String>) -> Self {
        Self::new(ProxyKind::Listen, name)
    }

    /// An unnamed defaults section
    pub fn defaults() -> Self {
        Self::new(ProxyKind::Defaults, "")
    }

    /// Read a proxy section of the given kind starting at its header
    pub fn parse(kind: ProxyKind, cursor: &mut TextCursor<'_>) -> Result<Self, ParseError> {
        parse_block(cursor, |name, position| match kind {
            ProxyKind::Defaults => Ok(Proxy::new(kind, name.unwrap_or_default())),
            _ => Ok(Proxy::new(
                kind,
                require_name(kind.section_kind(), name, position)?,
            )),
        })
    }

    pub fn kind(&self) -> ProxyKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &ParameterBag {
        &self.params
    }

    /// Fail with `operation` named in the error unless this kind allows
    /// `capability`
    fn check(&self, capability: Capability, operation: &'static str) -> ParamResult<()> {
        if self.kind.allows(capability) {
            Ok(())
        } else {
            Err(InvalidParameterError::NotAllowed {
                operation,
                section: self.kind.as_str(),
            })
        }
    }

    // ========================================
    // Generic directives
    // ========================================

    /// Add or overwrite a directive, see [`ParameterBag::add_parameter`]
    pub fn add_parameter(
        &mut self,
        keyword: &str,
        args: impl Into<ArgInput>,
    ) -> ParamResult<&mut Self> {
        let args = self.checked_args(keyword, args.into())?;
        self.params.add_parameter(keyword, args);
        Ok(self)
    }

    pub fn add_parameter_with_priority(
        &mut self,
        keyword: &str,
        args: impl Into<ArgInput>,
        priority: i32,
    ) -> ParamResult<&mut Self> {
        let args = self.checked_args(keyword, args.into())?;
        self.params.add_parameter_with_priority(keyword, args, priority);
        Ok(self)
    }

    fn checked_args(&self, keyword: &str, args: ArgInput) -> ParamResult<Vec<String>> {
        let args = args.into_args(keyword);
        if keyword == "use_backend" && args.is_empty() {
            return Err(InvalidParameterError::MissingBackendName);
        }
        Ok(args)
    }

    pub fn remove_parameter(&mut self, key: impl Into<ParamKey>) -> &mut Self {
        let key = key.into();
        if let (Some(id), "use_backend") = (key.id(), key.keyword()) {
            self.use_backends.shift_remove(&UseBackendKey::new(id, key.tag()));
        }
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

    pub fn remove_comment(&mut self) -> &mut Self {
        self.params.remove_comment();
        self
    }

    // ========================================
    // bind
    // ========================================

    /// Listen on `host:port`; stored as `bind <host>` → `[:<port>, options..]`
    pub fn bind(
        &mut self,
        host: &str,
        port: impl fmt::Display,
        options: impl Into<ArgInput>,
    ) -> ParamResult<&mut Self> {
        self.check(Capability::Bind, "bind")?;
        let mut args = vec![format!(":{port}")];
        args.extend(options.into().into_args("bind"));
        self.params
            .insert(ParamKey::identified("bind", host), args, None);
        Ok(self)
    }

    pub fn has_bind(&self, host: &str) -> ParamResult<bool> {
        self.check(Capability::Bind, "hasBind")?;
        Ok(self.params.parameter_exists(ParamKey::identified("bind", host)))
    }

    pub fn bind_details(&self, host: &str) -> ParamResult<Option<&[String]>> {
        self.check(Capability::Bind, "getBindDetails")?;
        Ok(self.params.parameter(ParamKey::identified("bind", host)))
    }

    pub fn remove_bind(&mut self, host: &str) -> ParamResult<&mut Self> {
        self.check(Capability::Bind, "removeBind")?;
        self.params.remove_parameter(ParamKey::identified("bind", host));
        Ok(self)
    }

    // ========================================
    // server
    // ========================================

    /// Add a server; with a port, the address becomes `host:port`
    pub fn add_server(
        &mut self,
        name: &str,
        host: &str,
        port: Option<u16>,
        options: impl Into<ArgInput>,
    ) -> ParamResult<&mut Self> {
        self.check(Capability::Server, "server")?;
        let address = match port {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let mut args = vec![address];
        args.extend(options.into().into_args("server"));
        self.params
            .insert(ParamKey::identified("server", name), args, None);
        Ok(self)
    }

    pub fn server_exists(&self, name: &str) -> ParamResult<bool> {
        self.check(Capability::Server, "server")?;
        Ok(self.params.parameter_exists(ParamKey::identified("server", name)))
    }

    pub fn server_details(&self, name: &str) -> ParamResult<Option<&[String]>> {
        self.check(Capability::Server, "server")?;
        Ok(self.params.parameter(ParamKey::identified("server", name)))
    }

    pub fn remove_server(&mut self, name: &str) -> ParamResult<&mut Self> {
        self.check(Capability::Server, "server")?;
        self.params.remove_parameter(ParamKey::identified("server", name));
        Ok(self)
    }

    pub fn count_servers(&self) -> ParamResult<usize> {
        self.check(Capability::Server, "server")?;
        Ok(self
            .params
            .parameters()
            .filter(|(key, _)| key.keyword() == "server" && key.id().is_some())
            .count())
    }

    // ========================================
    // acl
    // ========================================

    pub fn add_acl(&mut self, name: &str, options: impl Into<ArgInput>) -> ParamResult<&mut Self> {
        self.check(Capability::Acl, "acl")?;
        let args = options.into().into_args("acl");
        self.params.insert(ParamKey::identified("acl", name), args, None);
        Ok(self)
    }

    pub fn acl_exists(&self, name: &str) -> ParamResult<bool> {
        self.check(Capability::Acl, "acl")?;
        Ok(self.params.parameter_exists(ParamKey::identified("acl", name)))
    }

    pub fn acl_details(&self, name: &str) -> ParamResult<Option<&[String]>> {
        self.check(Capability::Acl, "acl")?;
        Ok(self.params.parameter(ParamKey::identified("acl", name)))
    }

    pub fn remove_acl(&mut self, name: &str) -> ParamResult<&mut Self> {
        self.check(Capability::Acl, "acl")?;
        self.params.remove_parameter(ParamKey::identified("acl", name));
        Ok(self)
    }

    // ========================================
    // print priority
    // ========================================

    /// Lower priorities print first; ties keep insertion order
    pub fn set_print_priority(&mut self, priority: i32) -> ParamResult<&mut Self> {
        self.check(Capability::PrintPriority, "setPrintPriority")?;
        self.print_priority = priority;
        Ok(self)
    }

    pub fn print_priority(&self) -> i32 {
        self.print_priority
    }

    // ========================================
    // use_backend
    // ========================================

    /// Route to `name` unconditionally
    pub fn add_use_backend(
        &mut self,
        name: &str,
        tag: Option<&str>,
        priority: Option<i32>,
    ) -> ParamResult<&mut Self> {
        self.check(Capability::UseBackend, "use_backend")?;
        if name.is_empty() {
            return Err(InvalidParameterError::MissingBackendName);
        }
        self.params
            .insert(ParamKey::tagged("use_backend", name, tag), Vec::new(), priority);
        Ok(self)
    }

    /// Route to `name` when the conditions hold.
    ///
    /// `conditions` is a token list where `||` separates alternatives. Calling
    /// this again for the same `(name, tag)` adds new groups and replaces the
    /// test.
    ///
    /// ```
    /// use hapconf_config::{ConditionTest, Proxy};
    ///
    /// let mut frontend = Proxy::frontend("www");
    /// frontend
    ///     .add_use_backend_with_conditions("api", "is_api || is_host is_v2", ConditionTest::If, None, None)
    ///     .unwrap();
    /// assert_eq!(
    ///     frontend.to_string(),
    ///     "frontend www\nuse_backend api if is_api || is_host is_v2\n\n"
    /// );
    /// ```
    pub fn add_use_backend_with_conditions(
        &mut self,
        name: &str,
        conditions: impl Into<ArgInput>,
        test: ConditionTest,
        tag: Option<&str>,
        priority: Option<i32>,
    ) -> ParamResult<&mut Self> {
        self.check(Capability::UseBackend, "use_backend")?;
        if name.is_empty() {
            return Err(InvalidParameterError::MissingBackendName);
        }

        let rule_key = UseBackendKey::new(name, tag);
        let param_key = rule_key.param_key();
        if priority.is_some() || !self.params.parameter_exists(&param_key) {
            self.params.insert(param_key, Vec::new(), priority);
        }

        let groups = condition_groups(conditions.into().into_args("use_backend"));
        self.use_backends
            .entry(rule_key)
            .or_insert_with(|| UseBackendRule::new(test))
            .merge(test, groups);
        Ok(self)
    }

    pub fn use_backend_exists(&self, name: &str, tag: Option<&str>) -> ParamResult<bool> {
        self.check(Capability::UseBackend, "use_backend")?;
        Ok(self
            .params
            .parameter_exists(ParamKey::tagged("use_backend", name, tag)))
    }

    /// Conditions recorded for a rule, if it has any
    pub fn use_backend_details(
        &self,
        name: &str,
        tag: Option<&str>,
    ) -> ParamResult<Option<&UseBackendRule>> {
        self.check(Capability::UseBackend, "use_backend")?;
        Ok(self.use_backends.get(&UseBackendKey::new(name, tag)))
    }

    pub fn remove_use_backend(&mut self, name: &str, tag: Option<&str>) -> ParamResult<&mut Self> {
        self.check(Capability::UseBackend, "use_backend")?;
        self.use_backends.shift_remove(&UseBackendKey::new(name, tag));
        self.params
            .remove_parameter(ParamKey::tagged("use_backend", name, tag));
        Ok(self)
    }

    pub fn use_backend_rules(&self) -> impl Iterator<Item = (&UseBackendKey, &UseBackendRule)> {
        self.use_backends.iter()
    }

    // ========================================
    // Printing
    // ========================================

    pub fn pretty_print(&self, indent_level: usize, options: &FormatOptions) -> String {
        let body = self.params.render_body(indent_level, options, |key, _, width| {
            if key.keyword() != "use_backend" {
                return None;
            }
            let id = key.id()?;
            let rule = self.use_backends.get(&UseBackendKey::new(id, key.tag()))?;
            if rule.conditions().is_empty() {
                return None;
            }
            Some(rule.render_lines(id, width, options.max_line_args))
        });

        let header = header(self.kind.section_kind(), &self.name);
        self.params.frame(&header, &body, indent_level, options)
    }

    // ========================================
    // Parsing
    // ========================================

    fn parse_bind(&mut self, args: &[String], position: usize) -> Result<(), ParseError> {
        let value = args.first().map(String::as_str).unwrap_or_default();
        let parts: Vec<&str> = value.split(':').collect();
        let Some((port, host)) = parts.split_last().filter(|_| parts.len() >= 2) else {
            return Err(ParseError::InvalidBind {
                section: self.kind.as_str(),
                name: self.name.clone(),
                value: value.to_string(),
                position,
            });
        };

        self.bind(&host.join(":"), port, &args[1..])
            .map_err(|source| ParseError::Parameter { source, position })?;
        Ok(())
    }

    fn parse_server(&mut self, args: &[String], position: usize) -> Result<(), ParseError> {
        let [name, address, options @ ..] = args else {
            return Err(self.invalid_server(args, position));
        };
        if address.matches(':').count() != 1 {
            return Err(self.invalid_server(args, position));
        }

        self.add_server(name, address, None, options)
            .map_err(|source| ParseError::Parameter { source, position })?;
        Ok(())
    }

    fn invalid_server(&self, args: &[String], position: usize) -> ParseError {
        ParseError::InvalidServer {
            section: self.kind.as_str(),
            name: self.name.clone(),
            value: args.join(" "),
            position,
        }
    }

    fn parse_acl(&mut self, args: &[String], position: usize) -> Result<(), ParseError> {
        let Some((name, options)) = args.split_first() else {
            return Err(ParseError::InvalidAcl {
                section: self.kind.as_str(),
                name: self.name.clone(),
                position,
            });
        };

        let options = self.merged_acl_options(name, options);
        self.add_acl(name, options)
            .map_err(|source| ParseError::Parameter { source, position })?;
        Ok(())
    }

    /// A repeated `acl <name>` line with the same leading tokens continues
    /// the earlier one, which is how long ACLs are printed
    fn merged_acl_options(&self, name: &str, options: &[String]) -> Vec<String> {
        let Some(existing) = self.params.parameter(ParamKey::identified("acl", name)) else {
            return options.to_vec();
        };

        let leading = acl_leading_count(existing);
        if leading == acl_leading_count(options) && existing[..leading] == options[..leading] {
            let mut merged = existing.to_vec();
            merged.extend_from_slice(&options[leading..]);
            return merged;
        }

        tracing::warn!(
            section = self.kind.as_str(),
            name = %self.name,
            acl = name,
            "acl redefined with different leading tokens, keeping the last one"
        );
        options.to_vec()
    }

    /// Repeated lines for one backend keep their own entries: the first is
    /// untagged, later ones are tagged with their ordinal
    fn parse_use_backend(&mut self, args: &[String], position: usize) -> Result<(), ParseError> {
        let at = |source| ParseError::Parameter { source, position };
        let Some((name, rest)) = args.split_first() else {
            return Err(at(InvalidParameterError::MissingBackendName));
        };

        let tag = self.next_use_backend_tag(name);
        let tag = tag.as_deref();

        match rest.split_first() {
            Some((word, conditions)) => match ConditionTest::parse(word) {
                Some(test) if !condition_groups(conditions.to_vec()).is_empty() => {
                    self.add_use_backend_with_conditions(name, conditions, test, tag, None)
                        .map_err(at)?;
                }
                _ => {
                    self.params
                        .insert(ParamKey::tagged("use_backend", name, tag), rest.to_vec(), None);
                }
            },
            None => {
                self.add_use_backend(name, tag, None).map_err(at)?;
            }
        }
        Ok(())
    }

    fn next_use_backend_tag(&self, name: &str) -> Option<String> {
        if !self.params.parameter_exists(ParamKey::tagged("use_backend", name, None)) {
            return None;
        }
        (2..)
            .map(|ordinal: usize| ordinal.to_string())
            .find(|tag| {
                !self
                    .params
                    .parameter_exists(ParamKey::tagged("use_backend", name, Some(tag.as_str())))
            })
    }
}

impl Section for Proxy {
    fn section_kind(&self) -> SectionKind {
        self.kind.section_kind()
    }

    fn section_name(&self) -> &str {
        &self.name
    }

    fn directive_count(&self) -> usize {
        self.params.directive_count()
    }

    fn handle_line(&mut self, tokens: Vec<String>, position: usize) -> Result<(), ParseError> {
        let Some((keyword, args)) = tokens.split_first() else {
            return Ok(());
        };

        match keyword.as_str() {
            "bind" => self.parse_bind(args, position),
            "server" => self.parse_server(args, position),
            "acl" => self.parse_acl(args, position),
            "use_backend" if self.kind.allows(Capability::UseBackend) => {
                self.parse_use_backend(args, position)
            }
            _ => {
                self.params.add_parameter(keyword, args.to_vec());
                Ok(())
            }
        }
    }

    fn push_blank_line(&mut self) {
        self.params.add_blank_line();
    }

    fn finish(&mut self) {
        self.params.trim_trailing_blank_lines();
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_print(0, &FormatOptions::default()))
    }
}

//! Section kinds and their keyword tables

use std::fmt;

/// Every top-level block the configuration format knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Global,
    Defaults,
    Frontend,
    Backend,
    Listen,
    Userlist,
    Resolvers,
}

impl SectionKind {
    pub const ALL: [SectionKind; 7] = [
        SectionKind::Global,
        SectionKind::Defaults,
        SectionKind::Userlist,
        SectionKind::Resolvers,
        SectionKind::Frontend,
        SectionKind::Backend,
        SectionKind::Listen,
    ];

    /// Header keyword of the section
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Global => "global",
            SectionKind::Defaults => "defaults",
            SectionKind::Frontend => "frontend",
            SectionKind::Backend => "backend",
            SectionKind::Listen => "listen",
            SectionKind::Userlist => "userlist",
            SectionKind::Resolvers => "resolvers",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == word)
    }

    pub fn is_keyword(word: &str) -> bool {
        Self::from_keyword(word).is_some()
    }

    /// Number of leading arguments of `keyword` that become part of the
    /// directive key, so that repeated directives stay distinct.
    ///
    /// `timeout connect 5s` and `timeout client 50s` are two keys
    /// (`timeout connect`, `timeout client`) rather than one overwritten key.
    pub fn duplicate_arg_count(self, keyword: &str) -> usize {
        match self {
            SectionKind::Global => match keyword {
                "log" | "stats" => 2,
                "setenv" | "presetenv" | "lua-load" => 1,
                _ => 0,
            },
            SectionKind::Defaults => match keyword {
                "option" | "timeout" | "log" | "errorfile" | "http-check" => 1,
                "no" | "stats" => 2,
                _ => 0,
            },
            SectionKind::Frontend | SectionKind::Backend | SectionKind::Listen => match keyword {
                "option" | "timeout" | "errorfile" | "http-check" | "use_backend" => 1,
                "reqadd" | "reqdel" | "reqidel" | "reqrep" | "reqirep" => 1,
                "rspadd" | "rspdel" | "rspidel" | "rsprep" | "rspirep" => 1,
                "no" | "stats" | "tcp-request" | "tcp-response" => 2,
                "http-request" | "http-response" => 3,
                _ => 0,
            },
            SectionKind::Resolvers => match keyword {
                "timeout" => 1,
                _ => 0,
            },
            SectionKind::Userlist => 0,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        for kind in SectionKind::ALL {
            assert_eq!(SectionKind::from_keyword(kind.as_str()), Some(kind));
        }
        assert!(SectionKind::is_keyword("resolvers"));
        assert!(!SectionKind::is_keyword("server"));
        assert!(!SectionKind::is_keyword("Global"));
    }

    #[test]
    fn test_duplicate_tables() {
        assert_eq!(SectionKind::Global.duplicate_arg_count("log"), 2);
        assert_eq!(SectionKind::Defaults.duplicate_arg_count("log"), 1);
        assert_eq!(SectionKind::Frontend.duplicate_arg_count("log"), 0);
        assert_eq!(SectionKind::Backend.duplicate_arg_count("http-request"), 3);
        assert_eq!(SectionKind::Listen.duplicate_arg_count("reqirep"), 1);
        assert_eq!(SectionKind::Resolvers.duplicate_arg_count("timeout"), 1);
        assert_eq!(SectionKind::Resolvers.duplicate_arg_count("hold"), 0);
        assert_eq!(SectionKind::Userlist.duplicate_arg_count("user"), 0);
    }
}

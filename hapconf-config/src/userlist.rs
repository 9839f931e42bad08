//! The `userlist` section: groups and users for HTTP authentication

use crate::comment::Comment;
use crate::error::{InvalidParameterError, ParseError};
use crate::parser::TextCursor;
use crate::parser::block::{Section, parse_block, require_name};
use crate::section::SectionKind;
use hapconf_core::FormatOptions;
use indexmap::IndexMap;
use std::fmt;

/// One `user` line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub password: Option<String>,
    /// Password is stored in clear text (`insecure-password`)
    pub insecure: bool,
    pub groups: Vec<String>,
}

/// A named list of users and groups
///
/// Unlike the other sections a userlist holds no free-form directives.
#[derive(Debug, Clone, PartialEq)]
pub struct Userlist {
    name: String,
    comment: Option<Comment>,
    groups: IndexMap<String, Vec<String>>,
    users: IndexMap<String, User>,
}

impl Userlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            groups: IndexMap::new(),
            users: IndexMap::new(),
        }
    }

    pub fn parse(cursor: &mut TextCursor<'_>) -> Result<Self, ParseError> {
        parse_block(cursor, |name, position| {
            require_name(SectionKind::Userlist, name, position).map(Userlist::new)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Always fails: users and groups have dedicated methods
    pub fn add_parameter(&mut self, _keyword: &str) -> Result<&mut Self, InvalidParameterError> {
        Err(InvalidParameterError::Rejected {
            message: "Adding separate parameters on a user list is not allowed!".to_string(),
        })
    }

    pub fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }

    pub fn set_comment(&mut self, comment: Comment) -> &mut Self {
        self.comment = Some(comment);
        self
    }

    // Groups

    pub fn add_group<S: AsRef<str>>(&mut self, name: &str, users: &[S]) -> &mut Self {
        let users = users.iter().map(|user| user.as_ref().to_string()).collect();
        self.groups.insert(name.to_string(), users);
        self
    }

    pub fn group_exists(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn group_users(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn remove_group(&mut self, name: &str) -> &mut Self {
        self.groups.shift_remove(name);
        self
    }

    /// Add `user` to an existing group; unknown groups are left alone
    pub fn add_user_to_group(&mut self, user: &str, group: &str) -> &mut Self {
        if let Some(users) = self.groups.get_mut(group) {
            if !users.iter().any(|existing| existing == user) {
                users.push(user.to_string());
            }
        }
        self
    }

    pub fn remove_user_from_group(&mut self, user: &str, group: &str) -> &mut Self {
        if let Some(users) = self.groups.get_mut(group) {
            users.retain(|existing| existing != user);
        }
        self
    }

    // Users

    pub fn add_user<S: AsRef<str>>(
        &mut self,
        name: &str,
        password: Option<&str>,
        groups: &[S],
    ) -> &mut Self {
        self.insert_user(name, password, false, groups)
    }

    /// Add a user whose password is stored in clear text
    pub fn add_insecure_user<S: AsRef<str>>(
        &mut self,
        name: &str,
        password: &str,
        groups: &[S],
    ) -> &mut Self {
        self.insert_user(name, Some(password), true, groups)
    }

    fn insert_user<S: AsRef<str>>(
        &mut self,
        name: &str,
        password: Option<&str>,
        insecure: bool,
        groups: &[S],
    ) -> &mut Self {
        let user = User {
            password: password.map(str::to_string),
            insecure,
            groups: groups.iter().map(|group| group.as_ref().to_string()).collect(),
        };
        self.users.insert(name.to_string(), user);
        self
    }

    pub fn user_exists(&self, name: &str) -> bool {
        self.users.contains_key(name)
    }

    pub fn user(&self, name: &str) -> Option<&User> {
        self.users.get(name)
    }

    pub fn user_password(&self, name: &str) -> Option<&str> {
        self.users.get(name)?.password.as_deref()
    }

    pub fn user_groups(&self, name: &str) -> Option<&[String]> {
        self.users.get(name).map(|user| user.groups.as_slice())
    }

    pub fn remove_user(&mut self, name: &str) -> &mut Self {
        self.users.shift_remove(name);
        self
    }

    pub fn add_group_to_user(&mut self, group: &str, user: &str) -> &mut Self {
        if let Some(user) = self.users.get_mut(user) {
            if !user.groups.iter().any(|existing| existing == group) {
                user.groups.push(group.to_string());
            }
        }
        self
    }

    pub fn remove_group_from_user(&mut self, group: &str, user: &str) -> &mut Self {
        if let Some(user) = self.users.get_mut(user) {
            user.groups.retain(|existing| existing != group);
        }
        self
    }

    pub fn pretty_print(&self, indent_level: usize, options: &FormatOptions) -> String {
        let indent = options.indent(indent_level);
        let mut body = String::new();

        for (name, users) in &self.groups {
            body.push_str(&format!("{indent}group {name}"));
            if !users.is_empty() {
                body.push_str(&format!(" users {}", users.join(",")));
            }
            body.push('\n');
        }
        if !body.is_empty() {
            body.push('\n');
        }

        for (name, user) in &self.users {
            body.push_str(&format!("{indent}user {name}"));
            if let Some(password) = &user.password {
                let keyword = if user.insecure { "insecure-password" } else { "password" };
                body.push_str(&format!(" {keyword} {password}"));
            }
            if !user.groups.is_empty() {
                body.push_str(&format!(" groups {}", user.groups.join(",")));
            }
            body.push('\n');
        }

        if body.is_empty() {
            return body;
        }

        let comment = self
            .comment
            .as_ref()
            .map(|comment| comment.pretty_print(indent_level.saturating_sub(1), options))
            .unwrap_or_default();
        format!("{comment}userlist {}\n{body}\n", self.name)
    }

    fn invalid_entry(&self, position: usize) -> ParseError {
        ParseError::InvalidUserlistEntry {
            name: self.name.clone(),
            position,
        }
    }

    /// `user <name> [password|insecure-password <pw>] [groups a,b]`
    fn parse_user(&mut self, args: &[String], position: usize) -> Result<(), ParseError> {
        let Some((name, mut rest)) = args.split_first() else {
            return Err(self.invalid_entry(position));
        };

        let mut user = User::default();
        while let [option, value, tail @ ..] = rest {
            match option.as_str() {
                "password" => user.password = Some(value.clone()),
                "insecure-password" => {
                    user.password = Some(value.clone());
                    user.insecure = true;
                }
                "groups" => user.groups = split_list(value),
                _ => return Err(self.invalid_entry(position)),
            }
            rest = tail;
        }
        if !rest.is_empty() {
            return Err(self.invalid_entry(position));
        }

        self.users.insert(name.clone(), user);
        Ok(())
    }

    /// `group <name> [users a,b]`
    fn parse_group(&mut self, args: &[String], position: usize) -> Result<(), ParseError> {
        let users = match args {
            [_] => Vec::new(),
            [_, keyword, users] if keyword == "users" => split_list(users),
            _ => return Err(self.invalid_entry(position)),
        };

        self.groups.insert(args[0].clone(), users);
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl Section for Userlist {
    fn section_kind(&self) -> SectionKind {
        SectionKind::Userlist
    }

    fn section_name(&self) -> &str {
        &self.name
    }

    fn directive_count(&self) -> usize {
        self.groups.len() + self.users.len()
    }

    fn handle_line(&mut self, tokens: Vec<String>, position: usize) -> Result<(), ParseError> {
        match tokens.split_first() {
            Some((keyword, args)) if keyword == "user" => self.parse_user(args, position),
            Some((keyword, args)) if keyword == "group" => self.parse_group(args, position),
            _ => Err(self.invalid_entry(position)),
        }
    }
}

impl fmt::Display for Userlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_print(0, &FormatOptions::default()))
    }
}

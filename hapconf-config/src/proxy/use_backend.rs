//! Conditional `use_backend` routing rules

use crate::params::ParamKey;
use std::fmt;

/// How the condition groups guard the rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConditionTest {
    #[default]
    If,
    Unless,
}

impl ConditionTest {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionTest::If => "if",
            ConditionTest::Unless => "unless",
        }
    }

    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "if" => Some(ConditionTest::If),
            "unless" => Some(ConditionTest::Unless),
            _ => None,
        }
    }
}

impl fmt::Display for ConditionTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one `use_backend` rule: the backend name plus an optional tag
/// that lets several rules target the same backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UseBackendKey {
    pub name: String,
    pub tag: Option<String>,
}

impl UseBackendKey {
    pub fn new(name: &str, tag: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            tag: tag.map(str::to_string),
        }
    }

    pub(crate) fn param_key(&self) -> ParamKey {
        ParamKey::tagged("use_backend", &self.name, self.tag.as_deref())
    }
}

/// Condition groups of a rule. Tokens inside a group are AND-ed, groups are
/// OR-ed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseBackendRule {
    test: ConditionTest,
    conditions: Vec<Vec<String>>,
}

impl UseBackendRule {
    pub(crate) fn new(test: ConditionTest) -> Self {
        Self {
            test,
            conditions: Vec::new(),
        }
    }

    pub fn test(&self) -> ConditionTest {
        self.test
    }

    pub fn conditions(&self) -> &[Vec<String>] {
        &self.conditions
    }

    /// Overwrite the test and append the groups not already present.
    /// Groups compare as exact token sequences.
    pub(crate) fn merge(&mut self, test: ConditionTest, groups: Vec<Vec<String>>) {
        self.test = test;
        for group in groups {
            if !self.conditions.contains(&group) {
                self.conditions.push(group);
            }
        }
    }

    /// Print the rule, packing groups into as few lines as the argument
    /// budget allows. Every line repeats `use_backend <name> <test>`.
    pub(crate) fn render_lines(&self, name: &str, width: usize, max_line_args: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut count = 0;

        for group in &self.conditions {
            let extra = group.len() + usize::from(!current.is_empty());
            if count + extra > max_line_args && !current.is_empty() {
                lines.push(self.line(name, width, &current));
                current.clear();
                count = group.len();
            } else {
                count += extra;
            }
            current.push(group.join(" "));
        }

        if !current.is_empty() {
            lines.push(self.line(name, width, &current));
        }

        lines
    }

    fn line(&self, name: &str, width: usize, groups: &[String]) -> String {
        format!(
            "{:<width$} {name} {} {}",
            "use_backend",
            self.test,
            groups.join(" || ")
        )
    }
}

/// Split condition tokens on `||` into groups. Tokens holding several
/// words are split first; empty groups are dropped.
pub(crate) fn condition_groups(tokens: Vec<String>) -> Vec<Vec<String>> {
    let mut groups = Vec::new();
    let mut group = Vec::new();

    for word in tokens.iter().flat_map(|token| token.split_whitespace()) {
        if word == "||" {
            if !group.is_empty() {
                groups.push(std::mem::take(&mut group));
            }
        } else {
            group.push(word.to_string());
        }
    }

    if !group.is_empty() {
        groups.push(group);
    }

    groups
}

//! Tag syntax in the search text
//!
//! A search term of the form `prefix:value` with a leading prefix of `user`,
//! `group`, `file` or `tag` replaces the plain text match with a targeted
//! predicate. The prefix is matched case-insensitively.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::error::Result;

use super::query::{Predicate, QueryParam};
use super::repository_trait::{GroupLookup, UserLookup};

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(user|group|file|tag):(.*)$").expect("Invalid regex")
});

/// Start of a further `prefix:` expression inside the value
static NEXT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s(user|group|file|tag):").expect("Invalid regex")
});

/// Recognized tag prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    User,
    Group,
    File,
    Tag,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::File => "file",
            Self::Tag => "tag",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "group" => Some(Self::Group),
            "file" => Some(Self::File),
            "tag" => Some(Self::Tag),
            _ => None,
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recognized `prefix:value` expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagExpression {
    pub kind: TagKind,
    pub value: String,
}

impl TagExpression {
    /// Recognize a tag expression at the start of the text
    ///
    /// The value is the trimmed remainder, cut before any second tag
    /// expression. It may be empty.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = TAG_PATTERN.captures(text)?;
        let kind = TagKind::from_prefix(caps.get(1)?.as_str())?;
        let rest = caps.get(2)?.as_str();

        let rest = match NEXT_TAG.find(rest) {
            Some(m) => &rest[..m.start()],
            None => rest,
        };

        Some(Self {
            kind,
            value: rest.trim().to_string(),
        })
    }
}

/// Turns tag expressions into search predicates
pub struct TagParser<'a> {
    users: &'a dyn UserLookup,
    groups: &'a dyn GroupLookup,
}

impl<'a> TagParser<'a> {
    pub fn new(users: &'a dyn UserLookup, groups: &'a dyn GroupLookup) -> Self {
        Self { users, groups }
    }

    /// Predicates replacing the text match, empty for plain text
    ///
    /// An empty value, or a `user:` or `group:` value naming nobody, yields a
    /// predicate that matches no rows.
    pub async fn parse(&self, text: &str) -> Result<Vec<Predicate>> {
        let Some(expr) = TagExpression::parse(text) else {
            return Ok(Vec::new());
        };

        tracing::debug!(kind = %expr.kind, value = %expr.value, "Parsed tag expression");

        if expr.value.is_empty() {
            return Ok(vec![Predicate::match_nothing()]);
        }

        let predicate = match expr.kind {
            TagKind::User => match self.users.find_user_by_login(&expr.value).await? {
                Some(user) => Predicate::new(
                    "(account_user_id = ? OR account_id IN \
                     (SELECT account_id FROM account_users WHERE user_id = ?))",
                    vec![QueryParam::Int(user.id), QueryParam::Int(user.id)],
                ),
                None => {
                    tracing::debug!(login = %expr.value, "Tag names an unknown user");
                    Predicate::match_nothing()
                }
            },
            TagKind::Group => match self.groups.find_group_by_name(&expr.value).await? {
                Some(group) => Predicate::new(
                    "(account_user_group_id = ? OR account_id IN \
                     (SELECT account_id FROM account_groups WHERE group_id = ?))",
                    vec![QueryParam::Int(group.id), QueryParam::Int(group.id)],
                ),
                None => {
                    tracing::debug!(group = %expr.value, "Tag names an unknown group");
                    Predicate::match_nothing()
                }
            },
            TagKind::File => Predicate::new(
                "account_id IN (SELECT account_id FROM account_files WHERE name LIKE ?)",
                vec![QueryParam::Text(format!("%{}%", expr.value))],
            ),
            TagKind::Tag => Predicate::new(
                "account_id IN (SELECT atag.account_id FROM account_tags atag \
                 JOIN tags t ON t.id = atag.tag_id WHERE t.name = ?)",
                vec![QueryParam::Text(expr.value)],
            ),
        };

        Ok(vec![predicate])
    }
}

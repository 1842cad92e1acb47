//! Account search entities
//!
//! Defines the principal issuing a search, the raw rows returned by the
//! store and the decorated rows handed back to the presentation layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated actor issuing a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User id
    pub user_id: i64,

    /// Login name
    pub login: String,

    /// Primary group of the user
    pub group_id: i64,

    /// Application administrator
    pub is_admin_app: bool,

    /// Accounts administrator
    pub is_admin_acc: bool,

    /// Groups the user belongs to through secondary memberships
    pub secondary_group_ids: Vec<i64>,
}

impl Principal {
    /// Create a regular (non-admin) principal
    pub fn new(user_id: i64, login: impl Into<String>, group_id: i64) -> Self {
        Self {
            user_id,
            login: login.into(),
            group_id,
            is_admin_app: false,
            is_admin_acc: false,
            secondary_group_ids: Vec::new(),
        }
    }

    /// Set the application-admin flag
    pub fn with_admin_app(mut self, is_admin: bool) -> Self {
        self.is_admin_app = is_admin;
        self
    }

    /// Set the accounts-admin flag
    pub fn with_admin_acc(mut self, is_admin: bool) -> Self {
        self.is_admin_acc = is_admin;
        self
    }

    /// Set the secondary group memberships
    pub fn with_secondary_groups(mut self, group_ids: Vec<i64>) -> Self {
        self.secondary_group_ids = group_ids;
        self
    }

    /// Holds an admin-equivalent role
    pub fn is_admin(&self) -> bool {
        self.is_admin_app || self.is_admin_acc
    }

    /// Member of the group, either as primary group or through a membership
    pub fn belongs_to(&self, group_id: i64) -> bool {
        self.group_id == group_id || self.secondary_group_ids.contains(&group_id)
    }
}

/// Reference to a user resolved by login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub login: String,
    pub group_id: i64,
}

/// Reference to a user group resolved by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: i64,
    pub name: String,
}

/// Raw row of the account search view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccountRow {
    #[sqlx(rename = "account_id")]
    pub id: i64,
    #[sqlx(rename = "account_name")]
    pub name: String,
    #[sqlx(rename = "account_login")]
    pub login: String,
    #[sqlx(rename = "account_url")]
    pub url: String,
    #[sqlx(rename = "account_notes")]
    pub notes: String,
    #[sqlx(rename = "account_category_id")]
    pub category_id: i64,
    #[sqlx(rename = "account_customer_id")]
    pub customer_id: i64,
    /// Primary owning user
    #[sqlx(rename = "account_user_id")]
    pub user_id: i64,
    /// Primary owning group
    #[sqlx(rename = "account_user_group_id")]
    pub user_group_id: i64,
    #[sqlx(rename = "account_count_view")]
    pub count_view: i64,
    pub category_name: String,
    pub customer_name: String,
    pub user_group_name: String,
}

impl AccountRow {
    /// Minimal row, mostly useful for tests and fixtures
    pub fn new(id: i64, name: impl Into<String>, user_id: i64, user_group_id: i64) -> Self {
        Self {
            id,
            name: name.into(),
            login: String::new(),
            url: String::new(),
            notes: String::new(),
            category_id: 0,
            customer_id: 0,
            user_id,
            user_group_id,
            count_view: 0,
            category_name: String::new(),
            customer_name: String::new(),
            user_group_name: String::new(),
        }
    }

    pub fn with_customer(mut self, customer_id: i64, customer_name: impl Into<String>) -> Self {
        self.customer_id = customer_id;
        self.customer_name = customer_name.into();
        self
    }
}

/// Action an ACL decision is made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AclAction {
    /// Listing accounts in search results
    Search,
    View,
    ViewSecret,
    Edit,
    Copy,
    Delete,
}

impl AclAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::View => "view",
            Self::ViewSecret => "view_secret",
            Self::Edit => "edit",
            Self::Copy => "copy",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for AclAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-row access flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessFlags {
    pub can_view: bool,
    pub can_view_secret: bool,
    pub can_edit: bool,
    pub can_copy: bool,
    pub can_delete: bool,
}

impl AccessFlags {
    /// Every flag set
    pub fn all() -> Self {
        Self {
            can_view: true,
            can_view_secret: true,
            can_edit: true,
            can_copy: true,
            can_delete: true,
        }
    }

    /// Nothing allowed
    pub fn none() -> Self {
        Self::default()
    }

    /// Keep only the flag that belongs to a single action
    pub fn restrict_to(self, action: AclAction) -> Self {
        let mut flags = Self::none();
        match action {
            AclAction::Search => return self,
            AclAction::View => flags.can_view = self.can_view,
            AclAction::ViewSecret => flags.can_view_secret = self.can_view_secret,
            AclAction::Edit => flags.can_edit = self.can_edit,
            AclAction::Copy => flags.can_copy = self.can_copy,
            AclAction::Delete => flags.can_delete = self.can_delete,
        }
        flags
    }
}

/// A decorated, display-ready search row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultRow {
    /// Account data with free-text fields already capped for display
    pub account: AccountRow,

    /// Users with a secondary grant on the account
    pub users_id: Vec<i64>,

    /// Groups with a secondary grant on the account
    pub user_groups_id: Vec<i64>,

    /// Tag names attached to the account
    pub tags: Vec<String>,

    /// Display color (`#RRGGBB`)
    pub color: String,

    /// Access flags computed for the search action
    pub access: AccessFlags,

    /// Display cap applied to free-text fields
    pub text_max_length: usize,
}

impl SearchResultRow {
    /// Wrap a raw row before decoration
    pub fn from_row(account: AccountRow) -> Self {
        Self {
            account,
            users_id: Vec::new(),
            user_groups_id: Vec::new(),
            tags: Vec::new(),
            color: String::new(),
            access: AccessFlags::none(),
            text_max_length: 0,
        }
    }

    /// Cap the free-text display fields to `max` characters
    pub fn truncate_text(&mut self, max: usize) {
        self.text_max_length = max;
        truncate_chars(&mut self.account.name, max);
        truncate_chars(&mut self.account.login, max);
        truncate_chars(&mut self.account.url, max);
        truncate_chars(&mut self.account.notes, max);
    }
}

/// Rows of one page plus the total number of matches before pagination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub rows: Vec<SearchResultRow>,
    pub total: u64,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Result of running a search
///
/// A failed query is reported separately so callers can tell it from a
/// search that simply matched nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    Found(SearchResults),
    QueryFailed { reason: String },
}

impl SearchOutcome {
    /// Rows of a successful search, `None` when the query failed
    pub fn results(&self) -> Option<&SearchResults> {
        match self {
            Self::Found(results) => Some(results),
            Self::QueryFailed { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::QueryFailed { .. })
    }
}

/// Hard cut at a character boundary
fn truncate_chars(text: &mut String, max: usize) {
    if let Some((idx, _)) = text.char_indices().nth(max) {
        text.truncate(idx);
    }
}

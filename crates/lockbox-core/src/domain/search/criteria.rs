//! Search criteria
//!
//! The request-scoped parameters of one account search.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SearchConfig;
use crate::error::{Error, Result};

/// Column the results are ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Customer name, then account name
    #[default]
    Default,
    Name,
    Category,
    Login,
    Url,
    Customer,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Name => "name",
            Self::Category => "category",
            Self::Login => "login",
            Self::Url => "url",
            Self::Customer => "customer",
        }
    }

    /// Parse from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "default" | "" => Some(Self::Default),
            "name" => Some(Self::Name),
            "category" => Some(Self::Category),
            "login" => Some(Self::Login),
            "url" => Some(Self::Url),
            "customer" => Some(Self::Customer),
            _ => None,
        }
    }

    /// Columns of the search view this key orders by
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Default => &["customer_name", "account_name"],
            Self::Name => &["account_name"],
            Self::Category => &["category_name"],
            Self::Login => &["account_login"],
            Self::Url => &["account_url"],
            Self::Customer => &["customer_name"],
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Kind of session the search runs in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// A logged-in user of the web interface
    #[default]
    Interactive,
    /// An API client; user preferences do not apply
    Api,
}

/// Per-user display preferences relevant to searching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Results per page, zero when the user has no preference
    pub results_per_page: i64,
    /// Order by view count when no explicit sort key is chosen
    pub sort_by_views: bool,
}

/// Parameters of one account search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Free-text term, possibly a `prefix:value` tag expression
    pub text: String,

    /// Category filter, zero for any
    pub category_id: i64,

    /// Customer filter, zero for any
    pub customer_id: i64,

    pub sort_key: SortKey,

    pub sort_order: SortOrder,

    /// Offset of the first row of the page
    pub limit_start: i64,

    /// Page size, zero for unbounded
    pub limit_count: i64,

    /// Only accounts the principal marked as favorite
    pub favorites_only: bool,

    /// Skip ownership-based visibility restriction
    pub global_search: bool,

    /// Order by view count when no explicit sort key is chosen
    pub sort_by_views: bool,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            text: String::new(),
            category_id: 0,
            customer_id: 0,
            sort_key: SortKey::Default,
            sort_order: SortOrder::Asc,
            limit_start: 0,
            limit_count: crate::config::DEFAULT_ACCOUNT_COUNT,
            favorites_only: false,
            global_search: false,
            sort_by_views: false,
        }
    }
}

impl SearchCriteria {
    /// Criteria seeded from the session preferences and configuration
    ///
    /// The page size is the user's preference when positive, otherwise the
    /// configured account count. API sessions ignore user preferences.
    pub fn for_session(kind: SessionKind, prefs: &UserPreferences, config: &SearchConfig) -> Self {
        let (per_page, sort_by_views) = match kind {
            SessionKind::Interactive => (prefs.results_per_page, prefs.sort_by_views),
            SessionKind::Api => (0, false),
        };

        Self {
            limit_count: if per_page > 0 {
                per_page
            } else {
                config.account_count
            },
            sort_by_views,
            ..Default::default()
        }
    }

    /// Set the search text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = category_id;
        self
    }

    pub fn with_customer(mut self, customer_id: i64) -> Self {
        self.customer_id = customer_id;
        self
    }

    pub fn with_sort(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort_key = key;
        self.sort_order = order;
        self
    }

    /// Set the page window
    pub fn with_page(mut self, start: i64, count: i64) -> Self {
        self.limit_start = start;
        self.limit_count = count;
        self
    }

    pub fn with_favorites_only(mut self, favorites_only: bool) -> Self {
        self.favorites_only = favorites_only;
        self
    }

    pub fn with_global_search(mut self, global_search: bool) -> Self {
        self.global_search = global_search;
        self
    }

    pub fn with_sort_by_views(mut self, sort_by_views: bool) -> Self {
        self.sort_by_views = sort_by_views;
        self
    }

    /// Whether a search term was given
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    /// Reject criteria that must not reach query construction
    pub fn validate(&self) -> Result<()> {
        if self.limit_count < 0 {
            return Err(Error::InvalidInput(format!(
                "page size must be non-negative, got {}",
                self.limit_count
            )));
        }
        if self.limit_start < 0 {
            return Err(Error::InvalidInput(format!(
                "page offset must be non-negative, got {}",
                self.limit_start
            )));
        }
        if self.category_id < 0 {
            return Err(Error::InvalidInput(format!(
                "invalid category id {}",
                self.category_id
            )));
        }
        if self.customer_id < 0 {
            return Err(Error::InvalidInput(format!(
                "invalid customer id {}",
                self.customer_id
            )));
        }
        Ok(())
    }
}

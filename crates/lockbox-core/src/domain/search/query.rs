//! Query construction
//!
//! Predicates are kept as typed (fragment, parameters) pairs so the bound
//! parameter list always follows the placeholder order of the rendered SQL.
//! Parameters are bound positionally by the executor, so the order in which
//! groups are assembled is part of the contract:
//!
//! 1. text match (or tag filter)
//! 2. category/customer selection
//! 3. favorites restriction
//! 4. visibility
//! 5. pagination offset, pagination count

use serde::{Deserialize, Serialize};

use super::criteria::{SearchCriteria, SortKey, SortOrder};

/// Relation every account search reads from
pub const SEARCH_VIEW: &str = "account_search_v";

/// Columns matched by a plain text search, in fragment order
pub const TEXT_MATCH_COLUMNS: [&str; 4] =
    ["account_name", "account_login", "account_url", "account_notes"];

/// Column holding the view counter used by the sort-by-views ordering
const VIEW_COUNT_COLUMN: &str = "account_count_view";

/// Parameter value bound to a placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    Int(i64),
    Text(String),
}

impl From<i64> for QueryParam {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for QueryParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// How predicates inside one group are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn separator(&self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// A SQL fragment and the values for its placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub fragment: String,
    pub params: Vec<QueryParam>,
}

impl Predicate {
    pub fn new(fragment: impl Into<String>, params: Vec<QueryParam>) -> Self {
        Self {
            fragment: fragment.into(),
            params,
        }
    }

    /// A predicate no row satisfies
    pub fn match_nothing() -> Self {
        Self::new("1 = 0", Vec::new())
    }

    /// Number of `?` placeholders in the fragment
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.fragment)
    }
}

/// Ordered predicates joined by one combinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateGroup {
    combinator: Combinator,
    predicates: Vec<Predicate>,
}

impl PredicateGroup {
    pub fn new(combinator: Combinator) -> Self {
        Self {
            combinator,
            predicates: Vec::new(),
        }
    }

    /// Group whose predicates are OR-ed
    pub fn any() -> Self {
        Self::new(Combinator::Or)
    }

    /// Group whose predicates are AND-ed
    pub fn all() -> Self {
        Self::new(Combinator::And)
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.push(predicate);
        self
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Parenthesized expression, `None` for an empty group
    pub fn render(&self) -> Option<String> {
        if self.predicates.is_empty() {
            return None;
        }

        let joined = self
            .predicates
            .iter()
            .map(|p| p.fragment.as_str())
            .collect::<Vec<_>>()
            .join(self.combinator.separator());

        Some(format!("({})", joined))
    }

    /// Parameters of every predicate, in order
    pub fn params(&self) -> impl Iterator<Item = &QueryParam> {
        self.predicates.iter().flat_map(|p| p.params.iter())
    }
}

/// Join clause added after the target relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinClause {
    pub clause: String,
    pub params: Vec<QueryParam>,
}

impl JoinClause {
    pub fn new(clause: impl Into<String>, params: Vec<QueryParam>) -> Self {
        Self {
            clause: clause.into(),
            params,
        }
    }
}

/// Page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: i64,
    pub count: i64,
}

/// A fully assembled query, read-only once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    relation: String,
    joins: Vec<JoinClause>,
    where_clause: Option<String>,
    where_params: Vec<QueryParam>,
    order_by: String,
    pagination: Option<Pagination>,
}

impl QueryDescriptor {
    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    pub fn order_by(&self) -> &str {
        &self.order_by
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    /// Parameters of the row-count query (no pagination)
    pub fn count_params(&self) -> Vec<QueryParam> {
        self.joins
            .iter()
            .flat_map(|j| j.params.iter().cloned())
            .chain(self.where_params.iter().cloned())
            .collect()
    }

    /// Parameters of the page query, in placeholder order
    pub fn params(&self) -> Vec<QueryParam> {
        let mut params = self.count_params();
        if let Some(page) = self.pagination {
            params.push(QueryParam::Int(page.offset));
            params.push(QueryParam::Int(page.count));
        }
        params
    }

    fn from_clause(&self) -> String {
        let mut from = self.relation.clone();
        for join in &self.joins {
            from.push(' ');
            from.push_str(&join.clause);
        }
        if let Some(ref where_clause) = self.where_clause {
            from.push_str(" WHERE ");
            from.push_str(where_clause);
        }
        from
    }

    /// SQL of the page query
    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT * FROM {}", self.from_clause());
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by);
        }
        if self.pagination.is_some() {
            sql.push_str(" LIMIT ?, ?");
        }
        sql
    }

    /// SQL counting every matching row regardless of pagination
    pub fn to_count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.from_clause())
    }

    /// Placeholders and parameters line up
    pub fn is_consistent(&self) -> bool {
        count_placeholders(&self.to_sql()) == self.params().len()
            && count_placeholders(&self.to_count_sql()) == self.count_params().len()
    }
}

/// Builds query descriptors for account searches
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    relation: String,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(SEARCH_VIEW)
    }
}

impl QueryBuilder {
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
        }
    }

    /// Text-match group
    ///
    /// Tag filters, when present, replace the default four-column match.
    pub fn text_group(criteria: &SearchCriteria, tag_filters: Vec<Predicate>) -> PredicateGroup {
        let mut group = PredicateGroup::any();

        if !criteria.has_text() {
            return group;
        }

        if !tag_filters.is_empty() {
            for filter in tag_filters {
                group.push(filter);
            }
            return group;
        }

        let pattern = format!("%{}%", criteria.text);
        for column in TEXT_MATCH_COLUMNS {
            group.push(Predicate::new(
                format!("{} LIKE ?", column),
                vec![QueryParam::Text(pattern.clone())],
            ));
        }
        group
    }

    /// Category and customer selection group
    pub fn select_group(criteria: &SearchCriteria) -> PredicateGroup {
        let mut group = PredicateGroup::all();

        if criteria.category_id != 0 {
            group.push(Predicate::new(
                "account_category_id = ?",
                vec![QueryParam::Int(criteria.category_id)],
            ));
        }

        if criteria.customer_id != 0 {
            group.push(Predicate::new(
                "account_customer_id = ?",
                vec![QueryParam::Int(criteria.customer_id)],
            ));
        }

        group
    }

    /// Groups of an account search in binding order
    pub fn search_groups(
        criteria: &SearchCriteria,
        tag_filters: Vec<Predicate>,
        favorites: PredicateGroup,
        visibility: PredicateGroup,
    ) -> Vec<PredicateGroup> {
        vec![
            Self::text_group(criteria, tag_filters),
            Self::select_group(criteria),
            favorites,
            visibility,
        ]
    }

    /// ORDER BY clause for the criteria
    pub fn order_clause(criteria: &SearchCriteria) -> String {
        let mut columns: Vec<String> = criteria
            .sort_key
            .columns()
            .iter()
            .map(|c| c.to_string())
            .collect();

        if views_override_applies(criteria) {
            columns.insert(0, format!("{} DESC", VIEW_COUNT_COLUMN));
        }

        format!(
            "{} {}",
            columns.join(", "),
            effective_sort_order(criteria).as_sql()
        )
    }

    /// Assemble the descriptor
    ///
    /// Empty groups are skipped; the others are parenthesized and AND-ed in
    /// the order given.
    pub fn build(
        &self,
        criteria: &SearchCriteria,
        groups: Vec<PredicateGroup>,
        joins: Vec<JoinClause>,
    ) -> QueryDescriptor {
        let mut clauses = Vec::new();
        let mut where_params = Vec::new();

        for group in groups.iter().filter(|g| !g.is_empty()) {
            if let Some(rendered) = group.render() {
                clauses.push(rendered);
                where_params.extend(group.params().cloned());
            }
        }

        let where_clause = if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" AND "))
        };

        let pagination = (criteria.limit_count > 0).then(|| Pagination {
            offset: criteria.limit_start.max(0),
            count: criteria.limit_count,
        });

        QueryDescriptor {
            relation: self.relation.clone(),
            joins,
            where_clause,
            where_params,
            order_by: Self::order_clause(criteria),
            pagination,
        }
    }
}

/// The view-count ordering takes over when no explicit sort key is chosen
pub fn views_override_applies(criteria: &SearchCriteria) -> bool {
    criteria.sort_by_views && criteria.sort_key == SortKey::Default
}

/// Direction actually used, forced to descending by the view-count ordering
pub fn effective_sort_order(criteria: &SearchCriteria) -> SortOrder {
    if views_override_applies(criteria) {
        SortOrder::Desc
    } else {
        criteria.sort_order
    }
}

fn count_placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

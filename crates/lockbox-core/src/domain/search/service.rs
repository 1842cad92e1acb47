//! Account search service
//!
//! Orchestrates one search: visibility and tag predicates, query assembly,
//! execution, and decoration of every returned row.

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::SearchConfig;
use crate::error::{Error, Result};

use super::acl::{AccountAccess, AclEvaluator, OwnershipAcl};
use super::color::ColorAssigner;
use super::criteria::SearchCriteria;
use super::entity::{AclAction, Principal, SearchOutcome, SearchResultRow, SearchResults};
use super::query::{QueryBuilder, effective_sort_order};
use super::repository::SearchRepository;
use super::repository_trait::{
    GroupLookup, OwnershipResolver, SearchExecutor, TagResolver, UserLookup,
};
use super::session::SessionStore;
use super::tags::TagParser;
use super::visibility::VisibilityFilter;

/// Service running account searches for a principal
#[derive(Clone)]
pub struct AccountSearchService {
    executor: Arc<dyn SearchExecutor>,
    users: Arc<dyn UserLookup>,
    groups: Arc<dyn GroupLookup>,
    ownership: Arc<dyn OwnershipResolver>,
    tags: Arc<dyn TagResolver>,
    acl: Arc<dyn AclEvaluator>,
    builder: QueryBuilder,
    colors: ColorAssigner,
    config: SearchConfig,
}

impl AccountSearchService {
    /// Create a service backed by the SQLite store
    pub fn new(pool: SqlitePool, config: SearchConfig) -> Self {
        Self::from_repository(SearchRepository::new(pool), config)
    }

    /// Create a service whose store collaborators are all one repository
    pub fn from_repository<R>(repository: R, config: SearchConfig) -> Self
    where
        R: SearchExecutor + UserLookup + GroupLookup + OwnershipResolver + TagResolver + 'static,
    {
        let repository = Arc::new(repository);
        Self {
            executor: repository.clone(),
            users: repository.clone(),
            groups: repository.clone(),
            ownership: repository.clone(),
            tags: repository,
            acl: Arc::new(OwnershipAcl),
            builder: QueryBuilder::default(),
            colors: ColorAssigner,
            config,
        }
    }

    /// Replace the query executor
    pub fn with_executor(mut self, executor: Arc<dyn SearchExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Replace the ACL evaluator
    pub fn with_acl(mut self, acl: Arc<dyn AclEvaluator>) -> Self {
        self.acl = acl;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Criteria seeded for the session
    pub fn default_criteria(&self, session: &dyn SessionStore) -> SearchCriteria {
        SearchCriteria::for_session(session.session_kind(), &session.preferences(), &self.config)
    }

    /// Run a search
    ///
    /// Invalid criteria are an error. A failing store is reported as
    /// [`SearchOutcome::QueryFailed`]. On success the effective criteria are
    /// stored on the session.
    pub async fn execute(
        &self,
        criteria: SearchCriteria,
        principal: &Principal,
        session: &mut dyn SessionStore,
    ) -> Result<SearchOutcome> {
        criteria.validate()?;

        let results = match self.run(&criteria, principal, session).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(
                    user_id = principal.user_id,
                    code = e.code(),
                    error = %e,
                    "Account search failed"
                );
                return Ok(SearchOutcome::QueryFailed {
                    reason: e.to_string(),
                });
            }
        };

        let mut effective = criteria;
        effective.sort_order = effective_sort_order(&effective);
        session.persist_last_criteria(&effective);

        tracing::info!(
            user_id = principal.user_id,
            rows = results.rows.len(),
            total = results.total,
            "Account search completed"
        );

        Ok(SearchOutcome::Found(results))
    }

    /// Run the session's last search again
    pub async fn repeat_last(
        &self,
        principal: &Principal,
        session: &mut dyn SessionStore,
    ) -> Result<SearchOutcome> {
        let criteria = session.last_criteria().cloned().ok_or(Error::NoLastSearch)?;
        self.execute(criteria, principal, session).await
    }

    async fn run(
        &self,
        criteria: &SearchCriteria,
        principal: &Principal,
        session: &mut dyn SessionStore,
    ) -> Result<SearchResults> {
        let visibility = VisibilityFilter::build(principal, criteria.global_search);
        let favorites = VisibilityFilter::favorites(principal, criteria.favorites_only);

        let tag_filters = if criteria.has_text() {
            TagParser::new(self.users.as_ref(), self.groups.as_ref())
                .parse(&criteria.text)
                .await?
        } else {
            Vec::new()
        };

        let groups = QueryBuilder::search_groups(criteria, tag_filters, favorites, visibility);
        let query = self.builder.build(criteria, groups, Vec::new());

        tracing::debug!(
            sql = %query.to_sql(),
            params = query.params().len(),
            "Executing account search"
        );

        let page = self.executor.execute(&query).await?;

        let max_len = self.config.text_max_length();
        let mut rows = Vec::with_capacity(page.rows.len());

        for account in page.rows {
            let users_id = self.ownership.users_for(account.id).await?;
            let user_groups_id = self.ownership.groups_for(account.id).await?;
            let tags = self.tags.tags_for(account.id).await?;

            let access = self.acl.evaluate(
                AclAction::Search,
                &AccountAccess {
                    account: &account,
                    users_id: &users_id,
                    user_groups_id: &user_groups_id,
                },
                principal,
            );
            let color = self
                .colors
                .color_for(session.color_map_mut(), account.customer_id);

            let mut row = SearchResultRow::from_row(account);
            row.users_id = users_id;
            row.user_groups_id = user_groups_id;
            row.tags = tags;
            row.access = access;
            row.color = color;
            row.truncate_text(max_len);
            rows.push(row);
        }

        Ok(SearchResults {
            rows,
            total: page.total,
        })
    }
}

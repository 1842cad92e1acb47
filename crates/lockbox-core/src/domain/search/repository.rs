//! Search repository for database operations
//!
//! Runs assembled search queries and the lookups the search depends on
//! against the SQLite store.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::{Error, Result};

use super::entity::{AccountRow, GroupRef, UserRef};
use super::query::{QueryDescriptor, QueryParam};
use super::repository_trait::{
    GroupLookup, OwnershipResolver, QueryPage, SearchExecutor, TagResolver, UserLookup,
};

/// Repository for account search database operations
#[derive(Debug, Clone)]
pub struct SearchRepository {
    pool: SqlitePool,
}

impl SearchRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_rows(&self, query: &QueryDescriptor) -> Result<Vec<AccountRow>> {
        let sql = query.to_sql();
        let params = query.params();

        let mut q = sqlx::query_as::<_, AccountRow>(&sql);
        for param in &params {
            q = match param {
                QueryParam::Int(value) => q.bind(*value),
                QueryParam::Text(value) => q.bind(value.as_str()),
            };
        }

        q.fetch_all(&self.pool).await.map_err(Error::DatabaseError)
    }

    async fn count_rows(&self, query: &QueryDescriptor) -> Result<u64> {
        let sql = query.to_count_sql();
        let params = query.count_params();

        let mut q = sqlx::query_scalar::<_, i64>(&sql);
        for param in &params {
            q = match param {
                QueryParam::Int(value) => q.bind(*value),
                QueryParam::Text(value) => q.bind(value.as_str()),
            };
        }

        let total = q.fetch_one(&self.pool).await.map_err(Error::DatabaseError)?;
        Ok(total.max(0) as u64)
    }
}

#[async_trait]
impl SearchExecutor for SearchRepository {
    async fn execute(&self, query: &QueryDescriptor) -> Result<QueryPage> {
        let rows = self.fetch_rows(query).await?;

        // Without pagination the page is the whole result set
        let total = if query.pagination().is_some() {
            self.count_rows(query).await?
        } else {
            rows.len() as u64
        };

        tracing::debug!(rows = rows.len(), total, "Executed account search");

        Ok(QueryPage { rows, total })
    }
}

#[async_trait]
impl UserLookup for SearchRepository {
    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserRef>> {
        let row: Option<(i64, String, i64)> =
            sqlx::query_as("SELECT id, login, group_id FROM users WHERE login = ?")
                .bind(login)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::DatabaseError)?;

        Ok(row.map(|(id, login, group_id)| UserRef {
            id,
            login,
            group_id,
        }))
    }
}

#[async_trait]
impl GroupLookup for SearchRepository {
    async fn find_group_by_name(&self, name: &str) -> Result<Option<GroupRef>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM user_groups WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::DatabaseError)?;

        Ok(row.map(|(id, name)| GroupRef { id, name }))
    }
}

#[async_trait]
impl OwnershipResolver for SearchRepository {
    async fn users_for(&self, account_id: i64) -> Result<Vec<i64>> {
        sqlx::query_scalar(
            "SELECT user_id FROM account_users WHERE account_id = ? ORDER BY user_id",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)
    }

    async fn groups_for(&self, account_id: i64) -> Result<Vec<i64>> {
        sqlx::query_scalar(
            "SELECT group_id FROM account_groups WHERE account_id = ? ORDER BY group_id",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)
    }
}

#[async_trait]
impl TagResolver for SearchRepository {
    async fn tags_for(&self, account_id: i64) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT t.name
            FROM account_tags atag
            JOIN tags t ON t.id = atag.tag_id
            WHERE atag.account_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::criteria::SearchCriteria;
    use crate::domain::search::entity::Principal;
    use crate::domain::search::query::{PredicateGroup, QueryBuilder};
    use crate::domain::search::visibility::VisibilityFilter;
    use crate::storage::Database;

    const FIXTURE: &str = r#"
        INSERT INTO user_groups (id, name) VALUES (1, 'admins'), (2, 'ops'), (3, 'dev');
        INSERT INTO users (id, login, group_id) VALUES (1, 'admin', 1), (2, 'alice', 2), (3, 'bob', 3);
        INSERT INTO customers (id, name) VALUES (1, 'Acme'), (2, 'Globex');
        INSERT INTO categories (id, name) VALUES (1, 'Web'), (2, 'Database');
        INSERT INTO accounts (id, name, login, url, notes, category_id, customer_id, user_id, user_group_id, count_view)
        VALUES
            (1, 'Mail server', 'postmaster', 'https://mail.acme.test', '', 1, 1, 2, 2, 10),
            (2, 'Billing DB', 'billing', '', 'primary replica', 2, 2, 3, 3, 3),
            (3, 'Intranet', 'www', 'https://intra.acme.test', '', 1, 1, 1, 1, 0);
        INSERT INTO account_users (account_id, user_id) VALUES (2, 2);
        INSERT INTO account_groups (account_id, group_id) VALUES (2, 1);
        INSERT INTO tags (id, name) VALUES (1, 'production'), (2, 'legacy');
        INSERT INTO account_tags (account_id, tag_id) VALUES (1, 1), (1, 2);
    "#;

    async fn setup() -> (Database, SearchRepository) {
        let db = Database::in_memory().await.unwrap();
        sqlx::raw_sql(FIXTURE).execute(db.pool()).await.unwrap();
        let repo = SearchRepository::new(db.pool().clone());
        (db, repo)
    }

    fn descriptor(criteria: &SearchCriteria, principal: &Principal) -> QueryDescriptor {
        let groups = QueryBuilder::search_groups(
            criteria,
            Vec::new(),
            VisibilityFilter::favorites(principal, criteria.favorites_only),
            VisibilityFilter::build(principal, criteria.global_search),
        );
        QueryBuilder::default().build(criteria, groups, Vec::new())
    }

    #[tokio::test]
    async fn test_visibility_restricts_rows() {
        let (_db, repo) = setup().await;
        let alice = Principal::new(2, "alice", 2);

        let page = repo
            .execute(&descriptor(&SearchCriteria::default(), &alice))
            .await
            .unwrap();

        let ids: Vec<i64> = page.rows.iter().map(|r| r.id).collect();
        assert_eq!(page.total, 2);
        assert!(ids.contains(&1));
        assert!(ids.contains(&2));
        assert!(!ids.contains(&3));
    }

    #[tokio::test]
    async fn test_total_ignores_pagination() {
        let (_db, repo) = setup().await;
        let admin = Principal::new(1, "admin", 1).with_admin_app(true);
        let criteria = SearchCriteria::default().with_page(1, 1);

        let page = repo.execute(&descriptor(&criteria, &admin)).await.unwrap();

        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_text_match_is_case_insensitive() {
        let (_db, repo) = setup().await;
        let admin = Principal::new(1, "admin", 1).with_admin_app(true);
        let criteria = SearchCriteria::default().with_text("REPLICA");

        let page = repo.execute(&descriptor(&criteria, &admin)).await.unwrap();

        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].name, "Billing DB");
        assert_eq!(page.rows[0].customer_name, "Globex");
    }

    #[tokio::test]
    async fn test_invalid_query_is_an_error() {
        let (_db, repo) = setup().await;
        let criteria = SearchCriteria::default();
        let broken = PredicateGroup::all().with(crate::domain::search::query::Predicate::new(
            "no_such_column = ?",
            vec![QueryParam::Int(1)],
        ));
        let query = QueryBuilder::default().build(&criteria, vec![broken], Vec::new());

        let err = repo.execute(&query).await.unwrap_err();
        assert_eq!(err.code(), "E400");
    }

    #[tokio::test]
    async fn test_lookups() {
        let (_db, repo) = setup().await;

        let alice = repo.find_user_by_login("alice").await.unwrap().unwrap();
        assert_eq!(alice.id, 2);
        assert_eq!(alice.group_id, 2);
        assert!(repo.find_user_by_login("mallory").await.unwrap().is_none());

        let ops = repo.find_group_by_name("ops").await.unwrap().unwrap();
        assert_eq!(ops.id, 2);
        assert!(repo.find_group_by_name("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ownership_and_tags() {
        let (_db, repo) = setup().await;

        assert_eq!(repo.users_for(2).await.unwrap(), vec![2]);
        assert_eq!(repo.groups_for(2).await.unwrap(), vec![1]);
        assert!(repo.users_for(3).await.unwrap().is_empty());
        assert_eq!(
            repo.tags_for(1).await.unwrap(),
            vec!["legacy".to_string(), "production".to_string()]
        );
    }
}

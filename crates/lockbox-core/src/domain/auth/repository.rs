//! Auth repository for database operations

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::{Error, Result};

use super::entity::{StoredCredentials, UserAccount};
use super::repository_trait::AuthRepositoryTrait;

/// Repository for users, auth tokens and recovery requests
#[derive(Debug, Clone)]
pub struct AuthRepository {
    pool: SqlitePool,
}

impl AuthRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl AuthRepositoryTrait for AuthRepository {
    async fn find_user(&self, login: &str) -> Result<Option<UserAccount>> {
        sqlx::query_as(
            r#"
            SELECT id, login, name, email, group_id,
                   is_admin_app, is_admin_acc, is_disabled, is_ldap, is_migrate
            FROM users
            WHERE login = ?
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::DatabaseError)
    }

    async fn secondary_groups(&self, user_id: i64) -> Result<Vec<i64>> {
        sqlx::query_scalar("SELECT group_id FROM user_to_groups WHERE user_id = ? ORDER BY group_id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::DatabaseError)
    }

    async fn credentials(&self, login: &str) -> Result<Option<StoredCredentials>> {
        sqlx::query_as(
            "SELECT pass_hash, hash_salt FROM users WHERE login = ? AND is_migrate = 0 LIMIT 1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::DatabaseError)
    }

    async fn count_tokens(&self, action_id: i64, token: &str) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM auth_tokens WHERE action_id = ? AND token = ?")
            .bind(action_id)
            .bind(token)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::DatabaseError)
    }

    async fn count_recoveries_since(&self, user_id: i64, since: i64) -> Result<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM password_recoveries WHERE user_id = ? AND requested_at >= ?",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::DatabaseError)
    }

    async fn add_recovery(&self, user_id: i64, hash: &str, requested_at: i64) -> Result<()> {
        sqlx::query(
            "INSERT INTO password_recoveries (user_id, hash, requested_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(hash)
        .bind(requested_at)
        .execute(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(())
    }
}

//! Repository traits for account search
//!
//! These traits abstract the store the search reads from. The SQLite
//! implementation lives in `repository`; tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;

use super::entity::{AccountRow, GroupRef, UserRef};
use super::query::QueryDescriptor;

/// One page of raw rows plus the total match count
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    pub rows: Vec<AccountRow>,
    pub total: u64,
}

/// Runs assembled search queries
#[async_trait]
pub trait SearchExecutor: Send + Sync {
    /// Execute the descriptor, binding its parameters positionally
    async fn execute(&self, query: &QueryDescriptor) -> Result<QueryPage>;
}

/// Resolves users by login
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserRef>>;
}

/// Resolves user groups by name
#[async_trait]
pub trait GroupLookup: Send + Sync {
    async fn find_group_by_name(&self, name: &str) -> Result<Option<GroupRef>>;
}

/// Secondary grants on an account
#[async_trait]
pub trait OwnershipResolver: Send + Sync {
    /// Users with a secondary grant
    async fn users_for(&self, account_id: i64) -> Result<Vec<i64>>;

    /// Groups with a secondary grant
    async fn groups_for(&self, account_id: i64) -> Result<Vec<i64>>;
}

/// Tags attached to accounts
#[async_trait]
pub trait TagResolver: Send + Sync {
    async fn tags_for(&self, account_id: i64) -> Result<Vec<String>>;
}

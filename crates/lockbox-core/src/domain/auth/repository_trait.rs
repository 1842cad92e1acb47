//! Repository trait for authentication data

use async_trait::async_trait;

use crate::error::Result;

use super::entity::{MailMessage, StoredCredentials, UserAccount};

/// Storage of users, tokens and recovery requests
#[async_trait]
pub trait AuthRepositoryTrait: Send + Sync {
    async fn find_user(&self, login: &str) -> Result<Option<UserAccount>>;

    /// Groups the user joined through memberships
    async fn secondary_groups(&self, user_id: i64) -> Result<Vec<i64>>;

    /// Password digest of a user whose hash is not pending migration
    async fn credentials(&self, login: &str) -> Result<Option<StoredCredentials>>;

    /// Number of tokens matching the action and value
    async fn count_tokens(&self, action_id: i64, token: &str) -> Result<i64>;

    /// Recovery requests of the user made at or after `since` (unix seconds)
    async fn count_recoveries_since(&self, user_id: i64, since: i64) -> Result<i64>;

    async fn add_recovery(&self, user_id: i64, hash: &str, requested_at: i64) -> Result<()>;
}

/// Outgoing mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<()>;
}

//! Directory service contract
//!
//! The directory protocol itself lives behind [`DirectoryClient`]; this
//! module only decides what its answers mean.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::Result;

use super::entity::DirectoryAttributes;

static GROUP_CN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^cn=([\w\s-]+),.*").expect("Invalid regex"));

/// Directory rejected a user bind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindRejected {
    pub code: i32,
}

/// Connection to a directory service
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Connect and bind with the configured proxy account
    async fn bind_proxy(&self) -> Result<()>;

    /// Distinguished name of the user, `None` when not found
    async fn find_user_dn(&self, login: &str) -> Result<Option<String>>;

    /// Bind as the user
    async fn bind_user(&self, dn: &str, password: &str) -> std::result::Result<(), BindRejected>;

    /// Attributes of the bound user
    async fn user_attributes(&self, dn: &str) -> Result<DirectoryAttributes>;

    /// Group-side membership search
    async fn group_has_member(&self, group: &str, user_dn: &str, login: &str) -> Result<bool>;
}

/// Whether a group attribute value names the configured group
///
/// Matches on the `cn=` component of a DN or on the whole value, ignoring
/// case. Purely numeric values never match.
pub fn group_matches(value: &str, configured: &str) -> bool {
    if value.trim().parse::<i64>().is_ok() {
        return false;
    }

    let configured = configured.to_lowercase();

    if let Some(cn) = GROUP_CN.captures(value).and_then(|c| c.get(1)) {
        if cn.as_str().to_lowercase() == configured {
            return true;
        }
    }

    value.to_lowercase() == configured
}

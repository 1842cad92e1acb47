//! Authentication entities

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::search::Principal;

/// Directory code for an expired or locked account
pub const DIRECTORY_EXPIRED: i32 = 701;

/// Directory code for a user outside the configured group
pub const DIRECTORY_NOT_IN_GROUP: i32 = 702;

/// Stored user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserAccount {
    pub id: i64,
    pub login: String,
    pub name: String,
    pub email: String,
    pub group_id: i64,
    pub is_admin_app: bool,
    pub is_admin_acc: bool,
    pub is_disabled: bool,
    /// Authenticates against the directory service
    pub is_ldap: bool,
    /// Password hash still in a legacy format
    pub is_migrate: bool,
}

impl UserAccount {
    /// Principal for searches issued by this user
    pub fn to_principal(&self, secondary_group_ids: Vec<i64>) -> Principal {
        Principal::new(self.id, self.login.clone(), self.group_id)
            .with_admin_app(self.is_admin_app)
            .with_admin_acc(self.is_admin_acc)
            .with_secondary_groups(secondary_group_ids)
    }
}

/// Salted password digest of a user
#[derive(Clone, Zeroize, ZeroizeOnDrop, sqlx::FromRow)]
pub struct StoredCredentials {
    pub pass_hash: String,
    pub hash_salt: String,
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("pass_hash", &"<redacted>")
            .field("hash_salt", &"<redacted>")
            .finish()
    }
}

/// Attributes read from the directory after a successful user bind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryAttributes {
    /// Display name
    pub name: Option<String>,
    pub mail: Option<String>,
    /// Positive when the account is expired or locked
    pub expire: i64,
    /// Group membership values, `None` when the entry has no group attribute
    pub groups: Option<Vec<String>>,
}

/// Identity returned by a successful directory login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryIdentity {
    pub name: String,
    pub email: String,
}

/// Result of a directory login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DirectoryOutcome {
    Granted(DirectoryIdentity),
    /// Directory disabled, misconfigured or unreachable
    Unavailable,
    /// The user bind was rejected with this directory error code
    BindFailed { code: i32 },
    Expired,
    NotInGroup,
}

impl DirectoryOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }

    /// Numeric status code, `None` for success and unavailability
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::BindFailed { code } => Some(*code),
            Self::Expired => Some(DIRECTORY_EXPIRED),
            Self::NotInGroup => Some(DIRECTORY_NOT_IN_GROUP),
            Self::Granted(_) | Self::Unavailable => None,
        }
    }
}

/// Outgoing mail message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

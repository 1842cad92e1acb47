//! Authentication service
//!
//! Directory and local-database logins, action tokens, web-server identity
//! checks and password recovery mails.

use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::config::AuthConfig;
use crate::domain::search::Principal;
use crate::error::{Error, Result};

use super::directory::{DirectoryClient, group_matches};
use super::entity::{DirectoryIdentity, DirectoryOutcome, MailMessage, UserAccount};
use super::repository::AuthRepository;
use super::repository_trait::{AuthRepositoryTrait, Mailer};

/// Length of a recovery hash in random bytes
const RECOVERY_HASH_BYTES: usize = 32;

/// Hex SHA-256 of the salt followed by the password
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut input = Zeroizing::new(Vec::with_capacity(salt.len() + password.len()));
    input.extend_from_slice(salt.as_bytes());
    input.extend_from_slice(password.as_bytes());
    hex::encode(Sha256::digest(input.as_slice()))
}

/// Authentication against the directory and the local store
#[derive(Clone)]
pub struct AuthService {
    repository: Arc<dyn AuthRepositoryTrait>,
    directory: Option<Arc<dyn DirectoryClient>>,
    mailer: Option<Arc<dyn Mailer>>,
    config: AuthConfig,
}

impl AuthService {
    /// Create a service backed by the SQLite store
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Self {
        Self::with_repository(Arc::new(AuthRepository::new(pool)), config)
    }

    pub fn with_repository(repository: Arc<dyn AuthRepositoryTrait>, config: AuthConfig) -> Self {
        Self {
            repository,
            directory: None,
            mailer: None,
            config,
        }
    }

    /// Attach a directory client
    pub fn with_directory(mut self, directory: Arc<dyn DirectoryClient>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Attach a mail transport
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Search principal for a stored user
    pub async fn principal_for(&self, login: &str) -> Result<Principal> {
        let user = self
            .repository
            .find_user(login)
            .await?
            .ok_or_else(|| Error::UserNotFound(login.to_string()))?;
        let groups = self.repository.secondary_groups(user.id).await?;
        Ok(user.to_principal(groups))
    }

    /// Log in through the directory service
    pub async fn authenticate_directory(
        &self,
        login: &str,
        password: &str,
    ) -> Result<DirectoryOutcome> {
        let directory = match self.directory {
            Some(ref directory) if self.config.ldap_enabled && self.config.ldap_params_ok() => {
                directory
            }
            _ => return Ok(DirectoryOutcome::Unavailable),
        };

        if let Err(e) = directory.bind_proxy().await {
            tracing::warn!(error = %e, "Directory proxy bind failed");
            return Ok(DirectoryOutcome::Unavailable);
        }

        let user_dn = match directory.find_user_dn(login).await {
            Ok(Some(dn)) => dn,
            Ok(None) => {
                tracing::debug!(login, "User not found in directory");
                return Ok(DirectoryOutcome::Unavailable);
            }
            Err(e) => {
                tracing::warn!(login, error = %e, "Directory user lookup failed");
                return Ok(DirectoryOutcome::Unavailable);
            }
        };

        if let Err(rejected) = directory.bind_user(&user_dn, password).await {
            tracing::info!(login, code = rejected.code, "Directory rejected user bind");
            return Ok(DirectoryOutcome::BindFailed {
                code: rejected.code,
            });
        }

        let attributes = match directory.user_attributes(&user_dn).await {
            Ok(attributes) => attributes,
            Err(e) => {
                tracing::warn!(login, error = %e, "Reading directory attributes failed");
                return Ok(DirectoryOutcome::Unavailable);
            }
        };

        if attributes.expire > 0 {
            return Ok(DirectoryOutcome::Expired);
        }

        let required = self.config.ldap_group.as_str();
        if required != "*" {
            let in_group = match attributes.groups {
                Some(ref groups) => groups.iter().any(|g| group_matches(g, required)),
                None => directory
                    .group_has_member(required, &user_dn, login)
                    .await
                    .unwrap_or(false),
            };

            if !in_group {
                tracing::warn!(user_dn = %user_dn, group = required, "User is not in the directory group");
                return Ok(DirectoryOutcome::NotInGroup);
            }
        }

        Ok(DirectoryOutcome::Granted(DirectoryIdentity {
            name: attributes.name.unwrap_or_else(|| login.to_string()),
            email: attributes.mail.unwrap_or_default(),
        }))
    }

    /// Log in against the stored password digest
    pub async fn authenticate_local(&self, login: &str, password: &str) -> Result<bool> {
        let Some(credentials) = self.repository.credentials(login).await? else {
            tracing::debug!(login, "No local credentials");
            return Ok(false);
        };

        let digest = Zeroizing::new(hash_password(&credentials.hash_salt, password));
        Ok(!credentials.pass_hash.is_empty() && *digest == credentials.pass_hash)
    }

    /// Whether exactly one token matches the action
    pub async fn check_auth_token(&self, action_id: i64, token: &str) -> Result<bool> {
        Ok(self.repository.count_tokens(action_id, token).await? == 1)
    }

    /// A user authenticated by the web server must be the one logging in
    pub fn check_server_auth_user(remote_user: Option<&str>, login: &str) -> bool {
        match remote_user {
            Some(remote) => remote == login,
            None => true,
        }
    }

    /// Send a password recovery mail
    ///
    /// Only enabled, non-directory users below the recovery limit get one.
    /// Returns true when the mail went out and the request was recorded.
    pub async fn mail_password_recovery(&self, user: &UserAccount) -> Result<bool> {
        if user.is_disabled || user.is_ldap {
            return Ok(false);
        }

        let Some(ref mailer) = self.mailer else {
            return Err(Error::MailError("no mail transport configured".to_string()));
        };

        let now = Utc::now().timestamp();
        let since = now - self.config.recovery_window_secs;
        let recent = self.repository.count_recoveries_since(user.id, since).await?;
        if recent >= i64::from(self.config.recovery_limit) {
            tracing::info!(user_id = user.id, recent, "Password recovery limit reached");
            return Ok(false);
        }

        let mut bytes = [0u8; RECOVERY_HASH_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let hash = hex::encode(bytes);

        let message = recovery_message(&self.config.base_url, &user.email, &hash, now);

        if let Err(e) = mailer.send(&message).await {
            tracing::warn!(user_id = user.id, error = %e, "Sending recovery mail failed");
            return Ok(false);
        }

        self.repository.add_recovery(user.id, &hash, now).await?;
        tracing::info!(user_id = user.id, "Password recovery requested");

        Ok(true)
    }
}

/// Reset link for a recovery hash
pub fn recovery_url(base_url: &str, hash: &str, requested_at: i64) -> String {
    format!(
        "{}/index.php?a=passreset&h={}&t={}",
        base_url.trim_end_matches('/'),
        hash,
        requested_at
    )
}

fn recovery_message(base_url: &str, to: &str, hash: &str, requested_at: i64) -> MailMessage {
    let body = format!(
        "A password change was requested for your user.\n\n\
         To complete it, open the following URL:\n\n{}\n\n\
         If you did not request this, ignore this message.\n",
        recovery_url(base_url, hash, requested_at)
    );

    MailMessage {
        to: to.to_string(),
        subject: "Password change".to_string(),
        body,
    }
}

//! Authentication domain module
//!
//! Directory and local logins, action tokens, web-server identity checks and
//! password recovery. The directory protocol and the mail transport are
//! reached through [`DirectoryClient`] and [`Mailer`].

pub mod directory;
pub mod entity;
pub mod repository;
pub mod repository_trait;
pub mod service;

pub use directory::{BindRejected, DirectoryClient, group_matches};
pub use entity::{
    DIRECTORY_EXPIRED, DIRECTORY_NOT_IN_GROUP, DirectoryAttributes, DirectoryIdentity,
    DirectoryOutcome, MailMessage, StoredCredentials, UserAccount,
};
pub use repository::AuthRepository;
pub use repository_trait::{AuthRepositoryTrait, Mailer};
pub use service::{AuthService, hash_password, recovery_url};

//! Lockbox Core Library
//!
//! This crate provides the core of a shared credential manager:
//! - Account search with per-principal visibility rules and tag syntax
//! - Result decoration (access flags, tags, session-stable colors)
//! - Authentication (directory, local store, tokens, password recovery)
//! - Storage (SQLite with versioned migrations)
//! - Configuration (TOML)

pub mod config;
pub mod domain;
pub mod error;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::auth::{AuthService, DirectoryOutcome, UserAccount};
    pub use crate::domain::search::{
        AccountSearchService, Principal, SearchCriteria, SearchOutcome, SearchSession, SortKey,
        SortOrder,
    };
    pub use crate::error::{Error, Result};
    pub use crate::storage::Database;
}

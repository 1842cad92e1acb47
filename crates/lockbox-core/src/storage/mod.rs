//! Storage layer - SQLite
//!
//! Provides database management and migrations for lockbox.
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//!
//! The repositories that run search and auth queries live next to their
//! domain modules (`domain::search::repository`, `domain::auth::repository`).
//!
//! # Usage
//!
//! ```ignore
//! use lockbox_core::storage::Database;
//!
//! // Create an in-memory database for testing
//! let db = Database::in_memory().await?;
//!
//! // Or open the configured database file
//! let db = Database::open(config.database.path.as_deref()).await?;
//! ```

pub mod database;
pub mod migrations;

pub use database::{Database, DatabaseConfig, default_database_path};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};

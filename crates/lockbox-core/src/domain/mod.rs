//! Domain layer
//!
//! Contains the core business logic and domain models.

pub mod auth;
pub mod search;
pub mod specification;

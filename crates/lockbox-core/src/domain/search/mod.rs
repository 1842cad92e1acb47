//! Search domain module
//!
//! Account search with per-principal visibility rules.
//!
//! # Architecture
//!
//! - **Criteria**: `SearchCriteria`, the parameters of one search
//! - **Query**: `QueryBuilder` turning criteria and predicate groups into a
//!   `QueryDescriptor` whose parameters follow placeholder order
//! - **Tags**: `TagParser` for `user:`, `group:`, `file:` and `tag:` terms
//! - **Visibility**: `VisibilityFilter` restricting rows for non-admins
//! - **Color**: `ColorAssigner`, session-stable row colors
//! - **Repository**: `SearchRepository` for database operations
//! - **Service**: `AccountSearchService` orchestrating a search
//!
//! # Example
//!
//! ```ignore
//! use lockbox_core::domain::search::{AccountSearchService, Principal, SearchSession};
//!
//! let service = AccountSearchService::new(pool.clone(), config.search.clone());
//! let mut session = SearchSession::interactive(prefs);
//!
//! let criteria = service.default_criteria(&session).with_text("tag:production");
//! let outcome = service.execute(criteria, &principal, &mut session).await?;
//!
//! // Same search again, from the criteria stored on the session
//! let outcome = service.repeat_last(&principal, &mut session).await?;
//! ```

pub mod acl;
pub mod color;
pub mod criteria;
pub mod entity;
pub mod query;
pub mod repository;
pub mod repository_trait;
pub mod service;
pub mod session;
pub mod tags;
pub mod visibility;

pub use acl::{AccountAccess, AclEvaluator, OwnershipAcl};
pub use color::{AccountColorMap, ColorAssigner, PALETTE};
pub use criteria::{SearchCriteria, SessionKind, SortKey, SortOrder, UserPreferences};
pub use entity::{
    AccessFlags, AccountRow, AclAction, GroupRef, Principal, SearchOutcome, SearchResultRow,
    SearchResults, UserRef,
};
pub use query::{
    Combinator, JoinClause, Pagination, Predicate, PredicateGroup, QueryBuilder, QueryDescriptor,
    QueryParam, SEARCH_VIEW,
};
pub use repository::SearchRepository;
pub use repository_trait::{
    GroupLookup, OwnershipResolver, QueryPage, SearchExecutor, TagResolver, UserLookup,
};
pub use service::AccountSearchService;
pub use session::{SearchSession, SessionStore};
pub use tags::{TagExpression, TagKind, TagParser};
pub use visibility::{VisibilityFacts, VisibilityFilter};

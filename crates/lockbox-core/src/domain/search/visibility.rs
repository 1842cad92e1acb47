//! Row visibility
//!
//! A non-admin principal sees an account when any of these hold:
//!
//! - the principal owns it
//! - the principal's primary group owns it
//! - the principal holds a secondary grant on it
//! - its owning group is one the principal joined through a membership
//!
//! The rules exist as a SQL predicate group for the store and as
//! specifications for checking individual accounts in memory.

use crate::domain::specification::{AnyOf, Specification, TrueSpec};

use super::entity::Principal;
use super::query::{Predicate, PredicateGroup, QueryParam};

/// Ownership facts of one account, as seen by the visibility rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityFacts {
    pub owner_user_id: i64,
    pub owner_group_id: i64,
    pub granted_user_ids: Vec<i64>,
}

/// Account owned by the user
pub struct OwnedByUser(pub i64);

impl Specification<VisibilityFacts> for OwnedByUser {
    fn is_satisfied_by(&self, facts: &VisibilityFacts) -> bool {
        facts.owner_user_id == self.0
    }
}

/// Account owned by the group
pub struct OwnedByGroup(pub i64);

impl Specification<VisibilityFacts> for OwnedByGroup {
    fn is_satisfied_by(&self, facts: &VisibilityFacts) -> bool {
        facts.owner_group_id == self.0
    }
}

/// Account granted to the user
pub struct GrantedToUser(pub i64);

impl Specification<VisibilityFacts> for GrantedToUser {
    fn is_satisfied_by(&self, facts: &VisibilityFacts) -> bool {
        facts.granted_user_ids.contains(&self.0)
    }
}

/// Account owned by one of the groups
pub struct OwnedByAnyGroup(pub Vec<i64>);

impl Specification<VisibilityFacts> for OwnedByAnyGroup {
    fn is_satisfied_by(&self, facts: &VisibilityFacts) -> bool {
        self.0.contains(&facts.owner_group_id)
    }
}

/// Builds visibility restrictions for a principal
pub struct VisibilityFilter;

impl VisibilityFilter {
    /// Whether visibility restriction is skipped entirely
    pub fn is_unrestricted(principal: &Principal, global_search: bool) -> bool {
        principal.is_admin() || global_search
    }

    /// OR-ed visibility group, empty when unrestricted
    pub fn build(principal: &Principal, global_search: bool) -> PredicateGroup {
        if Self::is_unrestricted(principal, global_search) {
            return PredicateGroup::any();
        }

        let user = QueryParam::Int(principal.user_id);
        let group = QueryParam::Int(principal.group_id);

        PredicateGroup::any()
            .with(Predicate::new("account_user_id = ?", vec![user.clone()]))
            .with(Predicate::new("account_user_group_id = ?", vec![group]))
            .with(Predicate::new(
                "account_id IN (SELECT account_id FROM account_users WHERE user_id = ?)",
                vec![user.clone()],
            ))
            .with(Predicate::new(
                "account_user_group_id IN (SELECT group_id FROM user_to_groups WHERE user_id = ?)",
                vec![user],
            ))
    }

    /// Favorites restriction, applied regardless of admin status
    pub fn favorites(principal: &Principal, favorites_only: bool) -> PredicateGroup {
        if !favorites_only {
            return PredicateGroup::all();
        }

        PredicateGroup::all().with(Predicate::new(
            "account_id IN (SELECT account_id FROM account_favorites WHERE user_id = ?)",
            vec![QueryParam::Int(principal.user_id)],
        ))
    }

    /// The same rules as a specification over ownership facts
    pub fn specification(
        principal: &Principal,
        global_search: bool,
    ) -> Box<dyn Specification<VisibilityFacts>> {
        if Self::is_unrestricted(principal, global_search) {
            return Box::new(TrueSpec::new());
        }

        Box::new(
            AnyOf::new()
                .with(OwnedByUser(principal.user_id))
                .with(OwnedByGroup(principal.group_id))
                .with(GrantedToUser(principal.user_id))
                .with(OwnedByAnyGroup(principal.secondary_group_ids.clone())),
        )
    }
}

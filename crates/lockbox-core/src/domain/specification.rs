//! Specification pattern for composable access rules
//!
//! Row-visibility rules are expressed twice: as SQL fragments for the store,
//! and as specifications evaluated in memory. The in-memory side lets the
//! rules be checked row by row without a database.

use std::sync::Arc;

/// Predicate object over an entity
pub trait Specification<T>: Send + Sync {
    /// Check if the entity satisfies this specification
    fn is_satisfied_by(&self, entity: &T) -> bool;

    /// Combine with another specification using AND
    fn and<S: Specification<T> + 'static>(self, other: S) -> AndSpecification<T>
    where
        Self: Sized + 'static,
    {
        AndSpecification {
            left: Arc::new(self),
            right: Arc::new(other),
        }
    }

    /// Combine with another specification using OR
    fn or<S: Specification<T> + 'static>(self, other: S) -> OrSpecification<T>
    where
        Self: Sized + 'static,
    {
        OrSpecification {
            left: Arc::new(self),
            right: Arc::new(other),
        }
    }

    /// Negate this specification
    fn not(self) -> NotSpecification<T>
    where
        Self: Sized + 'static,
    {
        NotSpecification {
            spec: Arc::new(self),
        }
    }
}

/// AND composite specification
pub struct AndSpecification<T> {
    left: Arc<dyn Specification<T>>,
    right: Arc<dyn Specification<T>>,
}

impl<T> Specification<T> for AndSpecification<T>
where
    T: Send + Sync,
{
    fn is_satisfied_by(&self, entity: &T) -> bool {
        self.left.is_satisfied_by(entity) && self.right.is_satisfied_by(entity)
    }
}

/// OR composite specification
pub struct OrSpecification<T> {
    left: Arc<dyn Specification<T>>,
    right: Arc<dyn Specification<T>>,
}

impl<T> Specification<T> for OrSpecification<T>
where
    T: Send + Sync,
{
    fn is_satisfied_by(&self, entity: &T) -> bool {
        self.left.is_satisfied_by(entity) || self.right.is_satisfied_by(entity)
    }
}

/// NOT specification wrapper
pub struct NotSpecification<T> {
    spec: Arc<dyn Specification<T>>,
}

impl<T> Specification<T> for NotSpecification<T>
where
    T: Send + Sync,
{
    fn is_satisfied_by(&self, entity: &T) -> bool {
        !self.spec.is_satisfied_by(entity)
    }
}

/// Satisfied when any of the inner specifications is (false when empty)
pub struct AnyOf<T> {
    specs: Vec<Arc<dyn Specification<T>>>,
}

impl<T> AnyOf<T> {
    pub fn new() -> Self {
        Self { specs: Vec::new() }
    }

    /// Add another alternative
    pub fn with<S: Specification<T> + 'static>(mut self, spec: S) -> Self {
        self.specs.push(Arc::new(spec));
        self
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<T> Default for AnyOf<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> Specification<T> for AnyOf<T> {
    fn is_satisfied_by(&self, entity: &T) -> bool {
        self.specs.iter().any(|s| s.is_satisfied_by(entity))
    }
}

/// Always true specification (no restriction)
pub struct TrueSpec<T>(std::marker::PhantomData<T>);

impl<T> TrueSpec<T> {
    pub fn new() -> Self {
        Self(std::marker::PhantomData)
    }
}

impl<T> Default for TrueSpec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> Specification<T> for TrueSpec<T> {
    fn is_satisfied_by(&self, _entity: &T) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account {
        owner_id: i64,
        group_id: i64,
    }

    struct OwnedBy(i64);

    impl Specification<Account> for OwnedBy {
        fn is_satisfied_by(&self, account: &Account) -> bool {
            account.owner_id == self.0
        }
    }

    struct InGroup(i64);

    impl Specification<Account> for InGroup {
        fn is_satisfied_by(&self, account: &Account) -> bool {
            account.group_id == self.0
        }
    }

    #[test]
    fn test_and_or_not() {
        let account = Account {
            owner_id: 1,
            group_id: 2,
        };

        assert!(OwnedBy(1).and(InGroup(2)).is_satisfied_by(&account));
        assert!(!OwnedBy(1).and(InGroup(3)).is_satisfied_by(&account));
        assert!(OwnedBy(9).or(InGroup(2)).is_satisfied_by(&account));
        assert!(!OwnedBy(9).or(InGroup(9)).is_satisfied_by(&account));
        assert!(OwnedBy(9).not().is_satisfied_by(&account));
    }

    #[test]
    fn test_any_of() {
        let account = Account {
            owner_id: 1,
            group_id: 2,
        };

        let empty = AnyOf::<Account>::new();
        assert!(empty.is_empty());
        assert!(!empty.is_satisfied_by(&account));

        let any = AnyOf::new().with(OwnedBy(5)).with(InGroup(2));
        assert_eq!(any.len(), 2);
        assert!(any.is_satisfied_by(&account));
    }

    #[test]
    fn test_true_spec() {
        let account = Account {
            owner_id: 1,
            group_id: 2,
        };
        assert!(TrueSpec::<Account>::new().is_satisfied_by(&account));
    }
}

//! Access flags for search rows

use super::entity::{AccessFlags, AccountRow, AclAction, Principal};

/// Ownership of one account as the ACL sees it
#[derive(Debug, Clone, Copy)]
pub struct AccountAccess<'a> {
    pub account: &'a AccountRow,
    pub users_id: &'a [i64],
    pub user_groups_id: &'a [i64],
}

/// Computes access flags for an account
pub trait AclEvaluator: Send + Sync {
    fn evaluate(&self, action: AclAction, access: &AccountAccess<'_>, principal: &Principal)
    -> AccessFlags;
}

/// Flags from ownership and secondary grants
///
/// Admins and owners (by user or group) get every flag. A secondary user
/// or group grant allows viewing, revealing and copying the secret.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipAcl;

impl OwnershipAcl {
    fn flags(access: &AccountAccess<'_>, principal: &Principal) -> AccessFlags {
        let account = access.account;

        if principal.is_admin()
            || account.user_id == principal.user_id
            || principal.belongs_to(account.user_group_id)
        {
            return AccessFlags::all();
        }

        let granted = access.users_id.contains(&principal.user_id)
            || access.user_groups_id.iter().any(|g| principal.belongs_to(*g));

        if granted {
            AccessFlags {
                can_view: true,
                can_view_secret: true,
                can_copy: true,
                ..AccessFlags::none()
            }
        } else {
            AccessFlags::none()
        }
    }
}

impl AclEvaluator for OwnershipAcl {
    fn evaluate(
        &self,
        action: AclAction,
        access: &AccountAccess<'_>,
        principal: &Principal,
    ) -> AccessFlags {
        Self::flags(access, principal).restrict_to(action)
    }
}

//! Permission registry
//!
//! Answers single/any/all permission queries against the role → permission
//! table and implements the `AllAccess` wildcard.

use std::collections::{BTreeMap, BTreeSet};

use super::policy::Policy;
use crate::engine::catalog::{Permission, Role};

#[derive(Debug, Clone, Copy)]
pub struct PermissionRegistry<'a> {
    grants: &'a BTreeMap<Role, BTreeSet<Permission>>,
}

impl<'a> PermissionRegistry<'a> {
    pub fn new(policy: &'a Policy) -> Self {
        Self {
            grants: policy.permission_table(),
        }
    }

    fn granted(&self, role: Role) -> Option<&'a BTreeSet<Permission>> {
        self.grants.get(&role)
    }

    /// True when the role holds the `AllAccess` wildcard.
    pub fn is_superuser(&self, role: Role) -> bool {
        self.granted(role)
            .is_some_and(|set| set.contains(&Permission::AllAccess))
    }

    pub fn has_permission(&self, role: Role, permission: Permission) -> bool {
        self.granted(role).is_some_and(|set| {
            set.contains(&permission) || set.contains(&Permission::AllAccess)
        })
    }

    /// False for an empty list.
    pub fn has_any_permission(&self, role: Role, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(role, *p))
    }

    /// True for an empty list (vacuous truth).
    pub fn has_all_permissions(&self, role: Role, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(role, *p))
    }

    /// The assigned set, without wildcard expansion. For display only.
    pub fn permissions(&self, role: Role) -> BTreeSet<Permission> {
        self.granted(role).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_grants() {
        let policy = Policy::standard();
        let registry = PermissionRegistry::new(&policy);

        assert!(registry.has_permission(Role::Borrower, Permission::UploadDocs));
        assert!(!registry.has_permission(Role::Borrower, Permission::ViewLoans));
        assert!(registry.has_permission(Role::Processor, Permission::SendToUnderwriter));
        assert!(!registry.has_permission(Role::Processor, Permission::SendToProcessor));
        assert!(!registry.has_permission(Role::LoanOfficer, Permission::CreateLoan));
    }

    #[test]
    fn test_wildcard() {
        let policy = Policy::standard();
        let registry = PermissionRegistry::new(&policy);

        assert!(registry.is_superuser(Role::Manager));
        assert!(!registry.is_superuser(Role::Underwriter));
        for permission in Permission::ALL {
            assert!(registry.has_permission(Role::Manager, permission));
        }
    }

    #[test]
    fn test_any_and_all() {
        let policy = Policy::standard();
        let registry = PermissionRegistry::new(&policy);

        assert!(!registry.has_any_permission(Role::Underwriter, &[]));
        assert!(registry.has_all_permissions(Role::Borrower, &[]));

        assert!(registry.has_any_permission(
            Role::LoanOfficer,
            &[Permission::CreateLoan, Permission::ViewReports]
        ));
        assert!(!registry.has_all_permissions(
            Role::LoanOfficer,
            &[Permission::CreateLoan, Permission::ViewReports]
        ));
        assert!(registry.has_all_permissions(
            Role::Underwriter,
            &[Permission::ChangeInterestRate, Permission::AddConditions]
        ));
    }

    #[test]
    fn test_permissions_are_not_expanded() {
        let policy = Policy::standard();
        let registry = PermissionRegistry::new(&policy);

        assert_eq!(
            registry.permissions(Role::Manager),
            BTreeSet::from([Permission::AllAccess])
        );
        assert_eq!(registry.permissions(Role::Borrower).len(), 3);
    }

    #[test]
    fn test_role_missing_from_table_is_empty() {
        let policy = Policy::from_json(r#"{ "version": 1, "name": "empty" }"#).unwrap();
        let registry = PermissionRegistry::new(&policy);

        assert!(registry.permissions(Role::Manager).is_empty());
        assert!(!registry.is_superuser(Role::Manager));
        assert!(!registry.has_permission(Role::Manager, Permission::ViewLoans));
    }
}

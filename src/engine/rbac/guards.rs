//! Workflow guards
//!
//! Status transitions, field edits and team assignment, each scoped per role
//! and each short-circuited by the `AllAccess` wildcard.

use std::collections::{BTreeMap, BTreeSet};

use super::policy::{Policy, TransitionTable};
use super::registry::PermissionRegistry;
use crate::engine::catalog::{LoanStatus, Role};

/// Decides whether a role may move a loan between two statuses
#[derive(Debug, Clone, Copy)]
pub struct TransitionGuard<'a> {
    registry: PermissionRegistry<'a>,
    tables: &'a BTreeMap<Role, TransitionTable>,
}

impl<'a> TransitionGuard<'a> {
    pub fn new(policy: &'a Policy, registry: PermissionRegistry<'a>) -> Self {
        Self {
            registry,
            tables: policy.transition_tables(),
        }
    }

    fn targets(&self, role: Role, from: LoanStatus) -> Option<&'a BTreeSet<LoanStatus>> {
        self.tables.get(&role).and_then(|table| table.get(&from))
    }

    /// A single table lookup. `from == to` needs its own edge like any other.
    pub fn can_transition(&self, role: Role, from: LoanStatus, to: LoanStatus) -> bool {
        if self.registry.is_superuser(role) {
            return true;
        }

        self.targets(role, from)
            .is_some_and(|targets| targets.contains(&to))
    }

    /// Permitted destinations in pipeline order.
    pub fn allowed_targets(&self, role: Role, from: LoanStatus) -> Vec<LoanStatus> {
        if self.registry.is_superuser(role) {
            return LoanStatus::ALL.into_iter().filter(|s| *s != from).collect();
        }

        self.targets(role, from)
            .map(|targets| targets.iter().copied().collect())
            .unwrap_or_default()
    }
}

/// Decides whether a role may mutate loan fields in a status
#[derive(Debug, Clone, Copy)]
pub struct EditGuard<'a> {
    registry: PermissionRegistry<'a>,
    editable: &'a BTreeMap<Role, BTreeSet<LoanStatus>>,
}

impl<'a> EditGuard<'a> {
    pub fn new(policy: &'a Policy, registry: PermissionRegistry<'a>) -> Self {
        Self {
            registry,
            editable: policy.editable_table(),
        }
    }

    pub fn can_edit(&self, role: Role, status: LoanStatus) -> bool {
        if self.registry.is_superuser(role) {
            return true;
        }

        self.editable
            .get(&role)
            .is_some_and(|statuses| statuses.contains(&status))
    }
}

/// Decides which team-member roles an actor may attach to a loan
#[derive(Debug, Clone, Copy)]
pub struct AssignmentGuard<'a> {
    registry: PermissionRegistry<'a>,
    assignable: &'a BTreeMap<Role, BTreeSet<Role>>,
}

impl<'a> AssignmentGuard<'a> {
    pub fn new(policy: &'a Policy, registry: PermissionRegistry<'a>) -> Self {
        Self {
            registry,
            assignable: policy.assignable_table(),
        }
    }

    pub fn can_assign(&self, acting: Role, target: Role) -> bool {
        if self.registry.is_superuser(acting) {
            return true;
        }

        self.assignable
            .get(&acting)
            .is_some_and(|roles| roles.contains(&target))
    }

    pub fn assignable_roles(&self, acting: Role) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|target| self.can_assign(acting, *target))
            .collect()
    }
}

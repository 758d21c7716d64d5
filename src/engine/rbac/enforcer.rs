//! Policy facade
//!
//! The single entry point callers use. Composes the permission registry and
//! the three workflow guards over one borrowed [`Policy`], and resolves raw
//! string tokens with fail-closed semantics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

use super::guards::{AssignmentGuard, EditGuard, TransitionGuard};
use super::policy::Policy;
use super::registry::PermissionRegistry;
use crate::engine::catalog::{LoanStatus, Permission, Role};

/// A typed authorization query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRequest {
    Permission { role: Role, permission: Permission },
    AnyPermission { role: Role, permissions: Vec<Permission> },
    AllPermissions { role: Role, permissions: Vec<Permission> },
    Transition { role: Role, from: LoanStatus, to: LoanStatus },
    Edit { role: Role, status: LoanStatus },
    Assign { role: Role, target: Role },
}

/// The same queries as they arrive from HTTP bodies, CLI arguments or stored
/// records: plain tokens that may not name anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum RawAccessRequest {
    Permission { role: String, permission: String },
    AnyPermission { role: String, permissions: Vec<String> },
    AllPermissions { role: String, permissions: Vec<String> },
    Transition { role: String, from: String, to: String },
    Edit { role: String, status: String },
    Assign { role: String, target: String },
}

impl RawAccessRequest {
    pub fn role(&self) -> &str {
        match self {
            RawAccessRequest::Permission { role, .. }
            | RawAccessRequest::AnyPermission { role, .. }
            | RawAccessRequest::AllPermissions { role, .. }
            | RawAccessRequest::Transition { role, .. }
            | RawAccessRequest::Edit { role, .. }
            | RawAccessRequest::Assign { role, .. } => role,
        }
    }

    /// Typed form of the request for an already-resolved role. `None` when an
    /// argument token is unknown and the request must be denied.
    fn resolve(&self, role: Role) -> Option<AccessRequest> {
        let request = match self {
            RawAccessRequest::Permission { permission, .. } => AccessRequest::Permission {
                role,
                permission: Permission::parse_token(permission)?,
            },
            // Unknown tokens are simply not held. A non-empty list that names
            // nothing at all does not resolve.
            RawAccessRequest::AnyPermission { permissions, .. } => {
                let known: Vec<Permission> = permissions
                    .iter()
                    .filter_map(|p| Permission::parse_token(p))
                    .collect();
                if known.is_empty() && !permissions.is_empty() {
                    return None;
                }
                AccessRequest::AnyPermission {
                    role,
                    permissions: known,
                }
            }
            RawAccessRequest::AllPermissions { permissions, .. } => AccessRequest::AllPermissions {
                role,
                permissions: permissions
                    .iter()
                    .map(|p| Permission::parse_token(p))
                    .collect::<Option<Vec<_>>>()?,
            },
            RawAccessRequest::Transition { from, to, .. } => AccessRequest::Transition {
                role,
                from: LoanStatus::parse_token(from)?,
                to: LoanStatus::parse_token(to)?,
            },
            RawAccessRequest::Edit { status, .. } => AccessRequest::Edit {
                role,
                status: LoanStatus::parse_token(status)?,
            },
            RawAccessRequest::Assign { target, .. } => AccessRequest::Assign {
                role,
                target: Role::parse_token(target)?,
            },
        };
        Some(request)
    }
}

impl From<&AccessRequest> for RawAccessRequest {
    fn from(request: &AccessRequest) -> Self {
        let tokens = |permissions: &[Permission]| {
            permissions.iter().map(|p| p.token().to_string()).collect()
        };
        match request {
            AccessRequest::Permission { role, permission } => RawAccessRequest::Permission {
                role: role.token().to_string(),
                permission: permission.token().to_string(),
            },
            AccessRequest::AnyPermission { role, permissions } => RawAccessRequest::AnyPermission {
                role: role.token().to_string(),
                permissions: tokens(permissions),
            },
            AccessRequest::AllPermissions { role, permissions } => {
                RawAccessRequest::AllPermissions {
                    role: role.token().to_string(),
                    permissions: tokens(permissions),
                }
            }
            AccessRequest::Transition { role, from, to } => RawAccessRequest::Transition {
                role: role.token().to_string(),
                from: from.token().to_string(),
                to: to.token().to_string(),
            },
            AccessRequest::Edit { role, status } => RawAccessRequest::Edit {
                role: role.token().to_string(),
                status: status.token().to_string(),
            },
            AccessRequest::Assign { role, target } => RawAccessRequest::Assign {
                role: role.token().to_string(),
                target: target.token().to_string(),
            },
        }
    }
}

/// What a role can do with a loan sitting in one status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Capabilities {
    pub role: Role,
    pub status: LoanStatus,
    pub superuser: bool,
    pub permissions: Vec<Permission>,
    pub can_edit: bool,
    pub transitions: Vec<LoanStatus>,
    pub assignable_roles: Vec<Role>,
}

/// The enforcement facade
#[derive(Debug, Clone, Copy)]
pub struct Enforcer<'a> {
    registry: PermissionRegistry<'a>,
    transitions: TransitionGuard<'a>,
    edits: EditGuard<'a>,
    assignments: AssignmentGuard<'a>,
}

impl<'a> Enforcer<'a> {
    pub fn new(policy: &'a Policy) -> Self {
        let registry = PermissionRegistry::new(policy);
        Self {
            registry,
            transitions: TransitionGuard::new(policy, registry),
            edits: EditGuard::new(policy, registry),
            assignments: AssignmentGuard::new(policy, registry),
        }
    }

    pub fn has_permission(&self, role: Role, permission: Permission) -> bool {
        self.registry.has_permission(role, permission)
    }

    pub fn has_any_permission(&self, role: Role, permissions: &[Permission]) -> bool {
        self.registry.has_any_permission(role, permissions)
    }

    pub fn has_all_permissions(&self, role: Role, permissions: &[Permission]) -> bool {
        self.registry.has_all_permissions(role, permissions)
    }

    pub fn is_superuser(&self, role: Role) -> bool {
        self.registry.is_superuser(role)
    }

    /// Assigned permissions, for display.
    pub fn user_permissions(&self, role: Role) -> BTreeSet<Permission> {
        self.registry.permissions(role)
    }

    /// Assigned permissions for a raw role token; empty when unrecognized.
    pub fn user_permissions_for(&self, role: &str) -> BTreeSet<Permission> {
        Role::parse_token(role)
            .map(|role| self.user_permissions(role))
            .unwrap_or_default()
    }

    pub fn can_transition(&self, role: Role, from: LoanStatus, to: LoanStatus) -> bool {
        self.transitions.can_transition(role, from, to)
    }

    pub fn allowed_transitions(&self, role: Role, from: LoanStatus) -> Vec<LoanStatus> {
        self.transitions.allowed_targets(role, from)
    }

    pub fn can_edit(&self, role: Role, status: LoanStatus) -> bool {
        self.edits.can_edit(role, status)
    }

    pub fn can_assign(&self, acting: Role, target: Role) -> bool {
        self.assignments.can_assign(acting, target)
    }

    pub fn assignable_roles(&self, acting: Role) -> Vec<Role> {
        self.assignments.assignable_roles(acting)
    }

    /// Rate changes need both the permission and edit rights in the status.
    pub fn can_change_interest_rate(&self, role: Role, status: LoanStatus) -> bool {
        self.has_permission(role, Permission::ChangeInterestRate) && self.can_edit(role, status)
    }

    pub fn evaluate(&self, request: &AccessRequest) -> bool {
        match request {
            AccessRequest::Permission { role, permission } => {
                self.has_permission(*role, *permission)
            }
            AccessRequest::AnyPermission { role, permissions } => {
                self.has_any_permission(*role, permissions)
            }
            AccessRequest::AllPermissions { role, permissions } => {
                self.has_all_permissions(*role, permissions)
            }
            AccessRequest::Transition { role, from, to } => self.can_transition(*role, *from, *to),
            AccessRequest::Edit { role, status } => self.can_edit(*role, *status),
            AccessRequest::Assign { role, target } => self.can_assign(*role, *target),
        }
    }

    /// Unknown role ⇒ deny. A request that resolves is answered exactly as
    /// [`Enforcer::evaluate`] answers it. One whose arguments name nothing is
    /// allowed only for a superuser role.
    pub fn evaluate_raw(&self, request: &RawAccessRequest) -> bool {
        let Some(role) = Role::parse_token(request.role()) else {
            return false;
        };

        match request.resolve(role) {
            Some(typed) => self.evaluate(&typed),
            None => self.is_superuser(role),
        }
    }

    pub fn capabilities(&self, role: Role, status: LoanStatus) -> Capabilities {
        Capabilities {
            role,
            status,
            superuser: self.is_superuser(role),
            permissions: self.user_permissions(role).into_iter().collect(),
            can_edit: self.can_edit(role, status),
            transitions: self.allowed_transitions(role, status),
            assignable_roles: self.assignable_roles(role),
        }
    }
}

//! RBAC Module
//!
//! Role permissions and role-scoped workflow guards over a versioned,
//! immutable policy

pub mod policy;
pub mod registry;
pub mod guards;
pub mod enforcer;

pub use policy::{Policy, PolicyError, PolicyViolation, TransitionTable, POLICY_FILE, POLICY_VERSION};
pub use registry::PermissionRegistry;
pub use guards::{AssignmentGuard, EditGuard, TransitionGuard};
pub use enforcer::{AccessRequest, Capabilities, Enforcer, RawAccessRequest};

//! LoanGuard - Role and workflow policy for the mortgage loan pipeline
//!
//! Decides which permissions a role holds, which status transitions it may
//! trigger, where it may edit a loan and whom it may assign. Decisions are
//! plain booleans; unknown input is denied.
//!
//! ```
//! use loanguard_lib::engine::{Enforcer, LoanStatus, Policy, Role};
//!
//! let policy = Policy::standard();
//! let enforcer = Enforcer::new(&policy);
//! assert!(enforcer.can_transition(Role::Processor, LoanStatus::Creating, LoanStatus::PreUnderwriting));
//! assert!(!enforcer.can_edit(Role::Borrower, LoanStatus::Creating));
//! ```

pub mod engine;

// LoanGuard Engine - Core module structure
pub mod catalog;
pub mod rbac;
pub mod pipeline;
pub mod config;
pub mod api;
pub mod cli;
pub mod observability;

pub use catalog::{LoanStatus, Permission, Role};
pub use config::Config;
pub use rbac::{Enforcer, Policy};

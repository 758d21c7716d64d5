//! LoanGuard CLI Module
//! Command-line interface for querying and serving the loan policy

pub mod formatter;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::rbac::RawAccessRequest;

#[derive(Parser, Debug)]
#[command(name = "loanguard")]
#[command(version)]
#[command(about = "Role and workflow policy for the mortgage loan pipeline", long_about = None)]
pub struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Output format (json for scripting)
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default config and policy file
    Init {
        /// Service name
        #[arg(short, long)]
        name: String,
    },

    /// Ask for a single decision (exit code 2 when denied)
    Check {
        #[command(subcommand)]
        query: CheckQuery,
    },

    /// List the permissions assigned to a role
    Permissions {
        /// Role token, e.g. UNDERWRITER
        role: String,
    },

    /// List the statuses a role may move a loan to
    Transitions {
        role: String,
        /// Current status token, e.g. PRE_UW
        from: String,
    },

    /// Show everything a role may do with a loan in a status
    Capabilities {
        role: String,
        status: String,
    },

    /// Print the per-role edit and transition matrix
    Matrix,

    /// Load the policy and report invariant violations
    Validate,

    /// Start the decision API server
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum CheckQuery {
    /// Does the role hold a permission?
    Permission { role: String, permission: String },

    /// Does the role hold at least one of the permissions?
    Any {
        role: String,
        #[arg(required = false)]
        permissions: Vec<String>,
    },

    /// Does the role hold every one of the permissions?
    All {
        role: String,
        #[arg(required = false)]
        permissions: Vec<String>,
    },

    /// May the role move a loan from one status to another?
    Transition { role: String, from: String, to: String },

    /// May the role edit a loan in a status?
    Edit { role: String, status: String },

    /// May the role assign another role to a loan?
    Assign { role: String, target: String },
}

impl From<CheckQuery> for RawAccessRequest {
    fn from(query: CheckQuery) -> Self {
        match query {
            CheckQuery::Permission { role, permission } => {
                RawAccessRequest::Permission { role, permission }
            }
            CheckQuery::Any { role, permissions } => {
                RawAccessRequest::AnyPermission { role, permissions }
            }
            CheckQuery::All { role, permissions } => {
                RawAccessRequest::AllPermissions { role, permissions }
            }
            CheckQuery::Transition { role, from, to } => {
                RawAccessRequest::Transition { role, from, to }
            }
            CheckQuery::Edit { role, status } => RawAccessRequest::Edit { role, status },
            CheckQuery::Assign { role, target } => RawAccessRequest::Assign { role, target },
        }
    }
}

impl CheckQuery {
    /// One-line description of the question
    pub fn describe(&self) -> String {
        match self {
            CheckQuery::Permission { role, permission } => format!("{} has {}", role, permission),
            CheckQuery::Any { role, permissions } => {
                format!("{} has any of [{}]", role, permissions.join(", "))
            }
            CheckQuery::All { role, permissions } => {
                format!("{} has all of [{}]", role, permissions.join(", "))
            }
            CheckQuery::Transition { role, from, to } => {
                format!("{} moves {} → {}", role, from, to)
            }
            CheckQuery::Edit { role, status } => format!("{} edits in {}", role, status),
            CheckQuery::Assign { role, target } => format!("{} assigns {}", role, target),
        }
    }
}

impl Cli {
    pub fn get_project_dir(&self) -> PathBuf {
        self.project
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_transition() {
        let cli = Cli::try_parse_from([
            "loanguard",
            "check",
            "transition",
            "PROCESSOR",
            "CREATING",
            "PRE_UW",
        ])
        .unwrap();

        match cli.command {
            Commands::Check { query } => {
                assert_eq!(query.describe(), "PROCESSOR moves CREATING → PRE_UW");
                assert_eq!(
                    RawAccessRequest::from(query),
                    RawAccessRequest::Transition {
                        role: "PROCESSOR".to_string(),
                        from: "CREATING".to_string(),
                        to: "PRE_UW".to_string(),
                    }
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "loanguard",
            "--format",
            "json",
            "--project",
            "/tmp/pipeline",
            "permissions",
            "MANAGER",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.get_project_dir(), PathBuf::from("/tmp/pipeline"));
        assert!(matches!(cli.command, Commands::Permissions { .. }));
    }

    #[test]
    fn test_parse_check_all_without_permissions() {
        let cli = Cli::try_parse_from(["loanguard", "check", "all", "BORROWER"]).unwrap();
        match cli.command {
            Commands::Check {
                query: CheckQuery::All { permissions, .. },
            } => assert!(permissions.is_empty()),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_serve_defaults_to_config() {
        let cli = Cli::try_parse_from(["loanguard", "serve"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve {
                port: None,
                host: None
            }
        ));

        let cli = Cli::try_parse_from([
            "loanguard", "-p", "/tmp/pipeline", "serve", "--port", "8088",
        ])
        .unwrap();
        assert_eq!(cli.get_project_dir(), PathBuf::from("/tmp/pipeline"));
        assert!(matches!(cli.command, Commands::Serve { port: Some(8088), .. }));
    }
}

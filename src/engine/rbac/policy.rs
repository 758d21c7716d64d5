//! Loan policy tables
//!
//! The immutable configuration object every guard borrows: role permission
//! sets, role-scoped transition graphs, editable statuses and assignable
//! roles. Built once at startup, either from the standard tables or from a
//! versioned `policy.json`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::engine::catalog::{LoanStatus, Permission, Role};

/// Current policy schema version
pub const POLICY_VERSION: u32 = 1;

/// File name of the policy document inside the policy directory
pub const POLICY_FILE: &str = "policy.json";

/// Allowed destinations per source status, for one role
pub type TransitionTable = BTreeMap<LoanStatus, BTreeSet<LoanStatus>>;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Failed to read policy: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid policy format: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Policy version {found} is newer than supported {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Policy violates workflow invariants: {}", format_violations(.0))]
    Invariant(Vec<PolicyViolation>),
}

fn format_violations(violations: &[PolicyViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A transition edge that breaks the shape of the loan workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    /// Edge leaving the terminal status
    LeavesTerminal { role: Role, to: LoanStatus },
    /// Edge entering the initial status
    EntersInitial { role: Role, from: LoanStatus },
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyViolation::LeavesTerminal { role, to } => {
                write!(f, "{} may not leave {} (edge to {})", role, LoanStatus::Closed, to)
            }
            PolicyViolation::EntersInitial { role, from } => {
                write!(f, "{} may not enter {} (edge from {})", role, LoanStatus::Creating, from)
            }
        }
    }
}

/// The policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Schema version for compatibility
    version: u32,

    /// Policy name
    name: String,

    /// Role → granted permissions
    #[serde(default)]
    permissions: BTreeMap<Role, BTreeSet<Permission>>,

    /// Role → (from → {to})
    #[serde(default)]
    transitions: BTreeMap<Role, TransitionTable>,

    /// Role → statuses in which loan fields may be edited
    #[serde(default)]
    editable: BTreeMap<Role, BTreeSet<LoanStatus>>,

    /// Role → roles it may assign to a loan
    #[serde(default)]
    assignable: BTreeMap<Role, BTreeSet<Role>>,
}

impl Policy {
    /// The standard mortgage pipeline tables.
    pub fn standard() -> Self {
        use LoanStatus::*;
        use Permission::*;

        let permissions = BTreeMap::from([
            (Role::Borrower, BTreeSet::from([ViewOwnLoans, UploadDocs, ViewDocs])),
            (
                Role::Processor,
                BTreeSet::from([
                    ViewLoans,
                    UpdateConditions,
                    CompleteConditions,
                    WaiveConditions,
                    UploadDocs,
                    ViewDocs,
                    SendToUnderwriter,
                    ViewFinancialDetails,
                ]),
            ),
            (
                Role::LoanOfficer,
                BTreeSet::from([ViewLoans, ViewDocs, ViewFinancialDetails, ViewReports]),
            ),
            (
                Role::Underwriter,
                BTreeSet::from([
                    ViewLoans,
                    UpdateStatus,
                    AddConditions,
                    UpdateConditions,
                    CompleteConditions,
                    WaiveConditions,
                    Permission::ClearToClose,
                    SendToProcessor,
                    UploadDocs,
                    ViewDocs,
                    ChangeInterestRate,
                    ViewFinancialDetails,
                    ViewReports,
                ]),
            ),
            (Role::Manager, BTreeSet::from([AllAccess])),
        ]);

        let transitions = BTreeMap::from([
            (
                Role::Processor,
                BTreeMap::from([
                    (Creating, BTreeSet::from([PreUnderwriting])),
                    // Works conditions here but cannot move the loan on.
                    (ApprovedWithConditions, BTreeSet::new()),
                    (LoanStatus::ClearToClose, BTreeSet::from([Closing])),
                ]),
            ),
            (
                Role::Underwriter,
                BTreeMap::from([
                    (PreUnderwriting, BTreeSet::from([PreApproved, ApprovedWithConditions])),
                    (PreApproved, BTreeSet::from([ApprovedWithConditions])),
                    (
                        ApprovedWithConditions,
                        BTreeSet::from([LoanStatus::ClearToClose, PreUnderwriting]),
                    ),
                    (
                        LoanStatus::ClearToClose,
                        BTreeSet::from([Closing, ApprovedWithConditions]),
                    ),
                ]),
            ),
        ]);

        let editable = BTreeMap::from([
            (
                Role::Processor,
                BTreeSet::from([Creating, PreUnderwriting, ApprovedWithConditions]),
            ),
            (
                Role::Underwriter,
                BTreeSet::from([
                    PreUnderwriting,
                    PreApproved,
                    ApprovedWithConditions,
                    LoanStatus::ClearToClose,
                ]),
            ),
            (Role::LoanOfficer, BTreeSet::new()),
            (Role::Borrower, BTreeSet::new()),
        ]);

        let assignable = BTreeMap::from([
            (
                Role::Manager,
                BTreeSet::from([Role::Processor, Role::Underwriter, Role::LoanOfficer]),
            ),
            (Role::Underwriter, BTreeSet::from([Role::Processor])),
        ]);

        Self {
            version: POLICY_VERSION,
            name: "standard".to_string(),
            permissions,
            transitions,
            editable,
            assignable,
        }
    }

    /// Parse and validate a policy document.
    pub fn from_json(content: &str) -> Result<Self, PolicyError> {
        let policy: Policy = serde_json::from_str(content)?;

        if policy.version > POLICY_VERSION {
            return Err(PolicyError::UnsupportedVersion {
                found: policy.version,
                supported: POLICY_VERSION,
            });
        }

        let violations = policy.validate();
        if !violations.is_empty() {
            return Err(PolicyError::Invariant(violations));
        }

        Ok(policy)
    }

    /// Load `policy.json` from a directory, falling back to the standard
    /// tables when the file does not exist.
    pub fn load(dir: &Path) -> Result<Self, PolicyError> {
        let policy_path = dir.join(POLICY_FILE);

        if !policy_path.exists() {
            info!(path = %policy_path.display(), "no policy file, using standard tables");
            return Ok(Self::standard());
        }

        let content = fs::read_to_string(&policy_path)?;
        match Self::from_json(&content) {
            Ok(policy) => {
                info!(
                    path = %policy_path.display(),
                    name = %policy.name,
                    version = policy.version,
                    "loaded loan policy"
                );
                Ok(policy)
            }
            Err(e) => {
                warn!(path = %policy_path.display(), error = %e, "rejected loan policy");
                Err(e)
            }
        }
    }

    /// Save policy to `policy.json` in a directory
    pub fn save(&self, dir: &Path) -> Result<(), PolicyError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(POLICY_FILE), content)?;
        Ok(())
    }

    /// Every edge that leaves `Closed` or enters `Creating`.
    pub fn validate(&self) -> Vec<PolicyViolation> {
        let mut violations = Vec::new();

        for (role, table) in &self.transitions {
            for (from, targets) in table {
                for to in targets {
                    if from.is_terminal() {
                        violations.push(PolicyViolation::LeavesTerminal { role: *role, to: *to });
                    }
                    if *to == LoanStatus::Creating {
                        violations.push(PolicyViolation::EntersInitial { role: *role, from: *from });
                    }
                }
            }
        }

        violations
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn permission_table(&self) -> &BTreeMap<Role, BTreeSet<Permission>> {
        &self.permissions
    }

    pub(crate) fn transition_tables(&self) -> &BTreeMap<Role, TransitionTable> {
        &self.transitions
    }

    pub(crate) fn editable_table(&self) -> &BTreeMap<Role, BTreeSet<LoanStatus>> {
        &self.editable
    }

    pub(crate) fn assignable_table(&self) -> &BTreeMap<Role, BTreeSet<Role>> {
        &self.assignable
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::standard()
    }
}

//! Role, Permission and LoanStatus catalog
//!
//! Closed enumerations with their wire tokens. No logic beyond parsing and
//! display.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// A token that does not name any catalog member
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind} token: {token}")]
pub struct UnknownToken {
    pub kind: &'static str,
    pub token: String,
}

impl UnknownToken {
    fn new(kind: &'static str, token: &str) -> Self {
        Self {
            kind,
            token: token.to_string(),
        }
    }
}

/// Exact match on the wire token or, when `variant_names` is set, on the
/// Rust variant name. No case folding or separator stripping.
fn lookup<T, const N: usize>(
    members: [T; N],
    input: &str,
    wire: impl Fn(&T) -> &'static str,
    variant_names: bool,
) -> Option<T>
where
    T: Copy + fmt::Debug,
{
    members
        .into_iter()
        .find(|m| wire(m) == input || (variant_names && format!("{:?}", m) == input))
}

/// Access-control identity of an authenticated actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Borrower,
    Processor,
    LoanOfficer,
    Underwriter,
    Manager,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Borrower,
        Role::Processor,
        Role::LoanOfficer,
        Role::Underwriter,
        Role::Manager,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Role::Borrower => "BORROWER",
            Role::Processor => "PROCESSOR",
            Role::LoanOfficer => "LOAN_OFFICER",
            Role::Underwriter => "UNDERWRITER",
            Role::Manager => "MANAGER",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Borrower => "Borrower",
            Role::Processor => "Processor",
            Role::LoanOfficer => "Loan Officer",
            Role::Underwriter => "Underwriter",
            Role::Manager => "Manager",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Borrower => "Loan applicant",
            Role::Processor => "Loan processor",
            Role::LoanOfficer => "Loan origination officer",
            Role::Underwriter => "Loan underwriter",
            Role::Manager => "Department manager",
        }
    }

    /// Resolve a caller-supplied token; `None` for anything unrecognized.
    pub fn parse_token(token: &str) -> Option<Self> {
        token.parse().ok()
    }
}

impl FromStr for Role {
    type Err = UnknownToken;

    /// Wire tokens only: a role string grants access, so nothing near a
    /// token is accepted in its place.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        lookup(Role::ALL, input, Role::token, false)
            .ok_or_else(|| UnknownToken::new("role", input))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A named capability checked independently of loan state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // General
    ViewLoans,
    ViewOwnLoans,
    CreateLoan,
    EditLoan,
    DeleteLoan,

    // Status management
    UpdateStatus,
    ClearToClose,
    SendToUnderwriter,
    SendToProcessor,

    // Conditions
    AddConditions,
    UpdateConditions,
    CompleteConditions,
    WaiveConditions,

    // Documents
    UploadDocs,
    ViewDocs,
    DeleteDocs,

    // Financial
    ChangeInterestRate,
    ViewFinancialDetails,

    // Team and users
    AssignLoans,
    AssignTeamMembers,
    UserManagement,

    // Reports
    ViewReports,
    ExportData,

    /// Wildcard: the holder passes every check of every guard.
    AllAccess,
}

impl Permission {
    pub const ALL: [Permission; 24] = [
        Permission::ViewLoans,
        Permission::ViewOwnLoans,
        Permission::CreateLoan,
        Permission::EditLoan,
        Permission::DeleteLoan,
        Permission::UpdateStatus,
        Permission::ClearToClose,
        Permission::SendToUnderwriter,
        Permission::SendToProcessor,
        Permission::AddConditions,
        Permission::UpdateConditions,
        Permission::CompleteConditions,
        Permission::WaiveConditions,
        Permission::UploadDocs,
        Permission::ViewDocs,
        Permission::DeleteDocs,
        Permission::ChangeInterestRate,
        Permission::ViewFinancialDetails,
        Permission::AssignLoans,
        Permission::AssignTeamMembers,
        Permission::UserManagement,
        Permission::ViewReports,
        Permission::ExportData,
        Permission::AllAccess,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Permission::ViewLoans => "view_loans",
            Permission::ViewOwnLoans => "view_own_loans",
            Permission::CreateLoan => "create_loan",
            Permission::EditLoan => "edit_loan",
            Permission::DeleteLoan => "delete_loan",
            Permission::UpdateStatus => "update_status",
            Permission::ClearToClose => "clear_to_close",
            Permission::SendToUnderwriter => "send_to_underwriter",
            Permission::SendToProcessor => "send_to_processor",
            Permission::AddConditions => "add_conditions",
            Permission::UpdateConditions => "update_conditions",
            Permission::CompleteConditions => "complete_conditions",
            Permission::WaiveConditions => "waive_conditions",
            Permission::UploadDocs => "upload_docs",
            Permission::ViewDocs => "view_docs",
            Permission::DeleteDocs => "delete_docs",
            Permission::ChangeInterestRate => "change_interest_rate",
            Permission::ViewFinancialDetails => "view_financial_details",
            Permission::AssignLoans => "assign_loans",
            Permission::AssignTeamMembers => "assign_team_members",
            Permission::UserManagement => "user_management",
            Permission::ViewReports => "view_reports",
            Permission::ExportData => "export_data",
            Permission::AllAccess => "all_access",
        }
    }

    pub fn parse_token(token: &str) -> Option<Self> {
        token.parse().ok()
    }
}

impl FromStr for Permission {
    type Err = UnknownToken;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        lookup(Permission::ALL, input, Permission::token, true)
            .ok_or_else(|| UnknownToken::new("permission", input))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Stage in the loan pipeline. Declaration order is the display order of the
/// canonical forward pipeline; it says nothing about legal transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    #[serde(rename = "CREATING")]
    Creating,
    #[serde(rename = "PRE_UW")]
    PreUnderwriting,
    #[serde(rename = "PRE_APPROVED")]
    PreApproved,
    #[serde(rename = "APPROVED_CONDITIONS")]
    ApprovedWithConditions,
    #[serde(rename = "CLEAR_TO_CLOSE")]
    ClearToClose,
    #[serde(rename = "CLOSING")]
    Closing,
    #[serde(rename = "CLOSED")]
    Closed,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 7] = [
        LoanStatus::Creating,
        LoanStatus::PreUnderwriting,
        LoanStatus::PreApproved,
        LoanStatus::ApprovedWithConditions,
        LoanStatus::ClearToClose,
        LoanStatus::Closing,
        LoanStatus::Closed,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            LoanStatus::Creating => "CREATING",
            LoanStatus::PreUnderwriting => "PRE_UW",
            LoanStatus::PreApproved => "PRE_APPROVED",
            LoanStatus::ApprovedWithConditions => "APPROVED_CONDITIONS",
            LoanStatus::ClearToClose => "CLEAR_TO_CLOSE",
            LoanStatus::Closing => "CLOSING",
            LoanStatus::Closed => "CLOSED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Creating => "Creating Loan",
            LoanStatus::PreUnderwriting => "Pre Underwriting",
            LoanStatus::PreApproved => "Pre Approved",
            LoanStatus::ApprovedWithConditions => "Approved w/ Conditions",
            LoanStatus::ClearToClose => "Clear to Close",
            LoanStatus::Closing => "Closing",
            LoanStatus::Closed => "Closed",
        }
    }

    /// `Closed` is the only terminal stage.
    pub fn is_terminal(&self) -> bool {
        *self == LoanStatus::Closed
    }

    pub fn parse_token(token: &str) -> Option<Self> {
        token.parse().ok()
    }
}

impl FromStr for LoanStatus {
    type Err = UnknownToken;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        lookup(LoanStatus::ALL, input, LoanStatus::token, true)
            .ok_or_else(|| UnknownToken::new("status", input))
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_tokens_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.token().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn test_role_tokens_are_exact() {
        for token in ["manager", " MANAGER", "MANAGER ", "MaNaGeR", "MAN_AGER", "m-a-n-a-g-e-r", "Manager"] {
            assert!(Role::parse_token(token).is_none(), "{:?}", token);
        }
        assert!(Role::parse_token("LoanOfficer").is_none());
        assert!(Role::parse_token("loan-officer").is_none());
    }

    #[test]
    fn test_unknown_tokens() {
        assert!(Role::parse_token("ADMIN").is_none());
        assert!(Role::parse_token("").is_none());
        assert!(Permission::parse_token("launch_rockets").is_none());
        assert!(LoanStatus::parse_token("FUNDED").is_none());

        let err = "ADMIN".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown role token: ADMIN");
    }

    #[test]
    fn test_permission_tokens() {
        assert_eq!(Permission::ALL.len(), 24);
        for permission in Permission::ALL {
            assert_eq!(Permission::parse_token(permission.token()), Some(permission));
        }
        assert_eq!(
            Permission::parse_token("ChangeInterestRate"),
            Some(Permission::ChangeInterestRate)
        );
        assert!(Permission::parse_token("CHANGE_INTEREST_RATE").is_none());
        assert!(Permission::parse_token("change-interest-rate").is_none());
    }

    #[test]
    fn test_status_aliases() {
        assert_eq!(LoanStatus::parse_token("PRE_UW"), Some(LoanStatus::PreUnderwriting));
        assert_eq!(
            LoanStatus::parse_token("PreUnderwriting"),
            Some(LoanStatus::PreUnderwriting)
        );
        assert_eq!(
            LoanStatus::parse_token("ApprovedWithConditions"),
            Some(LoanStatus::ApprovedWithConditions)
        );
        assert!(LoanStatus::parse_token("approved_conditions").is_none());
        assert!(LoanStatus::parse_token(" PRE_UW").is_none());
    }

    #[test]
    fn test_serde_uses_wire_tokens() {
        assert_eq!(serde_json::to_string(&Role::LoanOfficer).unwrap(), "\"LOAN_OFFICER\"");
        assert_eq!(
            serde_json::to_string(&Permission::AllAccess).unwrap(),
            "\"all_access\""
        );
        assert_eq!(
            serde_json::to_string(&LoanStatus::PreUnderwriting).unwrap(),
            "\"PRE_UW\""
        );
        let status: LoanStatus = serde_json::from_str("\"APPROVED_CONDITIONS\"").unwrap();
        assert_eq!(status, LoanStatus::ApprovedWithConditions);
    }

    #[test]
    fn test_only_closed_is_terminal() {
        let terminal: Vec<_> = LoanStatus::ALL.into_iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![LoanStatus::Closed]);
    }
}

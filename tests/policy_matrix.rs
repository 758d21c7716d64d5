//! Exhaustive decision matrix for the standard loan policy.
//!
//! Every (role, from, to), (role, status) and (role, target) combination is
//! compared against the expected grant lists below, so any drift in the
//! tables shows up as a named failure.

use loanguard_lib::engine::catalog::{LoanStatus, Permission, Role};
use loanguard_lib::engine::rbac::{Enforcer, Policy, RawAccessRequest};
use std::collections::BTreeSet;

use LoanStatus::*;

fn expected_transitions(role: Role) -> Vec<(LoanStatus, LoanStatus)> {
    match role {
        Role::Processor => vec![(Creating, PreUnderwriting), (ClearToClose, Closing)],
        Role::Underwriter => vec![
            (PreUnderwriting, PreApproved),
            (PreUnderwriting, ApprovedWithConditions),
            (PreApproved, ApprovedWithConditions),
            (ApprovedWithConditions, ClearToClose),
            (ApprovedWithConditions, PreUnderwriting),
            (ClearToClose, Closing),
            (ClearToClose, ApprovedWithConditions),
        ],
        Role::Borrower | Role::LoanOfficer | Role::Manager => vec![],
    }
}

fn expected_editable(role: Role) -> Vec<LoanStatus> {
    match role {
        Role::Processor => vec![Creating, PreUnderwriting, ApprovedWithConditions],
        Role::Underwriter => vec![PreUnderwriting, PreApproved, ApprovedWithConditions, ClearToClose],
        Role::Borrower | Role::LoanOfficer | Role::Manager => vec![],
    }
}

fn expected_assignable(role: Role) -> Vec<Role> {
    match role {
        Role::Manager => vec![Role::Processor, Role::Underwriter, Role::LoanOfficer],
        Role::Underwriter => vec![Role::Processor],
        Role::Borrower | Role::Processor | Role::LoanOfficer => vec![],
    }
}

#[test]
fn test_transition_matrix() {
    let policy = Policy::standard();
    let enforcer = Enforcer::new(&policy);

    for role in Role::ALL {
        let edges = expected_transitions(role);
        for from in LoanStatus::ALL {
            for to in LoanStatus::ALL {
                let expected = role == Role::Manager || edges.contains(&(from, to));
                assert_eq!(
                    enforcer.can_transition(role, from, to),
                    expected,
                    "{} {} -> {}",
                    role,
                    from,
                    to
                );
            }
        }
    }
}

#[test]
fn test_edit_matrix() {
    let policy = Policy::standard();
    let enforcer = Enforcer::new(&policy);

    for role in Role::ALL {
        let editable = expected_editable(role);
        for status in LoanStatus::ALL {
            let expected = role == Role::Manager || editable.contains(&status);
            assert_eq!(enforcer.can_edit(role, status), expected, "{} in {}", role, status);
        }
    }
}

#[test]
fn test_assignment_matrix() {
    let policy = Policy::standard();
    let enforcer = Enforcer::new(&policy);

    for acting in Role::ALL {
        let assignable = expected_assignable(acting);
        for target in Role::ALL {
            let expected = acting == Role::Manager || assignable.contains(&target);
            assert_eq!(
                enforcer.can_assign(acting, target),
                expected,
                "{} assigns {}",
                acting,
                target
            );
        }
    }
}

#[test]
fn test_permission_sets() {
    let policy = Policy::standard();
    let enforcer = Enforcer::new(&policy);

    assert_eq!(
        enforcer.user_permissions(Role::Borrower),
        BTreeSet::from([Permission::ViewOwnLoans, Permission::UploadDocs, Permission::ViewDocs])
    );
    assert_eq!(
        enforcer.user_permissions(Role::LoanOfficer),
        BTreeSet::from([
            Permission::ViewLoans,
            Permission::ViewDocs,
            Permission::ViewFinancialDetails,
            Permission::ViewReports,
        ])
    );
    assert_eq!(enforcer.user_permissions(Role::Processor).len(), 8);
    assert!(!enforcer.has_permission(Role::Processor, Permission::AddConditions));
    assert!(enforcer.has_permission(Role::Underwriter, Permission::AddConditions));

    // Nobody but the manager creates or deletes loans.
    for role in [Role::Borrower, Role::Processor, Role::LoanOfficer, Role::Underwriter] {
        assert!(!enforcer.has_permission(role, Permission::CreateLoan), "{}", role);
        assert!(!enforcer.has_permission(role, Permission::DeleteLoan), "{}", role);
    }
}

#[test]
fn test_named_properties() {
    let policy = Policy::standard();
    let enforcer = Enforcer::new(&policy);

    assert!(enforcer.can_transition(Role::Processor, Creating, PreUnderwriting));
    assert!(!enforcer.can_transition(Role::Processor, Creating, PreApproved));
    assert!(enforcer.can_transition(Role::Underwriter, ApprovedWithConditions, PreUnderwriting));
    assert!(!enforcer.can_transition(Role::Underwriter, Closed, ClearToClose));
    assert!(enforcer.can_assign(Role::Manager, Role::Processor));
    assert!(!enforcer.can_assign(Role::Processor, Role::Underwriter));
    assert!(enforcer.user_permissions_for("AUDITOR").is_empty());

    // Processor edits in APPROVED_CONDITIONS but cannot advance from it.
    assert!(enforcer.can_edit(Role::Processor, ApprovedWithConditions));
    assert!(enforcer.allowed_transitions(Role::Processor, ApprovedWithConditions).is_empty());
}

#[test]
fn test_interest_rate_change_end_to_end() {
    let policy = Policy::standard();
    let enforcer = Enforcer::new(&policy);

    let request = |role: &str| {
        (
            RawAccessRequest::Permission {
                role: role.to_string(),
                permission: "change_interest_rate".to_string(),
            },
            RawAccessRequest::Edit {
                role: role.to_string(),
                status: "PRE_UW".to_string(),
            },
        )
    };

    let (permission, edit) = request("UNDERWRITER");
    assert!(enforcer.evaluate_raw(&permission));
    assert!(enforcer.evaluate_raw(&edit));

    let (permission, edit) = request("LOAN_OFFICER");
    assert!(!enforcer.evaluate_raw(&permission));
    assert!(!enforcer.evaluate_raw(&edit));
}

#[test]
fn test_policy_file_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    Policy::standard().save(dir.path())?;

    let loaded = Policy::load(dir.path())?;
    assert_eq!(loaded, Policy::standard());

    let enforcer = Enforcer::new(&loaded);
    assert!(enforcer.can_transition(Role::Underwriter, ClearToClose, ApprovedWithConditions));
    Ok(())
}

#[test]
fn test_policy_file_reopening_closed_loans_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("policy.json"),
        r#"{
            "version": 1,
            "name": "reopen",
            "permissions": { "UNDERWRITER": ["update_status"] },
            "transitions": { "UNDERWRITER": { "CLOSED": ["CLOSING"] } }
        }"#,
    )?;

    let err = Policy::load(dir.path()).unwrap_err();
    assert!(err.to_string().contains("UNDERWRITER may not leave CLOSED"));
    Ok(())
}

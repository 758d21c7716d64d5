//! Loan pipeline display helpers
//!
//! The canonical forward order of loan statuses, used for dashboards and
//! progress counts only. Which moves are legal is the transition guard's
//! business, not this module's.

use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::engine::catalog::LoanStatus;

/// The canonical ordering of loan statuses.
pub const STATUS_FLOW: [LoanStatus; 7] = LoanStatus::ALL;

impl LoanStatus {
    /// 0-based position in [`STATUS_FLOW`].
    pub fn stage_index(&self) -> usize {
        STATUS_FLOW
            .iter()
            .position(|s| s == self)
            .unwrap_or(STATUS_FLOW.len())
    }

    /// Next stage in display order, `None` for the terminal stage.
    pub fn next_in_flow(&self) -> Option<LoanStatus> {
        STATUS_FLOW.get(self.stage_index() + 1).copied()
    }
}

/// Dashboard roll-up of loan counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PipelineSummary {
    pub total: u64,
    /// PRE_UW + PRE_APPROVED
    pub in_process: u64,
    /// APPROVED_CONDITIONS
    pub pending_conditions: u64,
    /// CLEAR_TO_CLOSE + CLOSING + CLOSED
    pub ready_or_closing: u64,
}

impl PipelineSummary {
    pub fn from_counts(counts: &BTreeMap<LoanStatus, u64>) -> Self {
        let count = |status: LoanStatus| counts.get(&status).copied().unwrap_or(0);

        Self {
            total: counts.values().sum(),
            in_process: count(LoanStatus::PreUnderwriting) + count(LoanStatus::PreApproved),
            pending_conditions: count(LoanStatus::ApprovedWithConditions),
            ready_or_closing: count(LoanStatus::ClearToClose)
                + count(LoanStatus::Closing)
                + count(LoanStatus::Closed),
        }
    }

    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = LoanStatus>,
    {
        Self::from_counts(&count_by_status(statuses))
    }
}

pub fn count_by_status<I>(statuses: I) -> BTreeMap<LoanStatus, u64>
where
    I: IntoIterator<Item = LoanStatus>,
{
    let mut counts = BTreeMap::new();
    for status in statuses {
        *counts.entry(status).or_insert(0) += 1;
    }
    counts
}

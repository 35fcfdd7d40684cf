use rust_decimal::Decimal;

use crate::domain::{ClaimGroups, ClaimReport, PositionSummary};

/// Report what would be claimed without touching any settlement path.
pub fn dry_run_report(groups: &ClaimGroups, total_value: Decimal) -> ClaimReport {
    let pending: Vec<PositionSummary> = groups
        .values()
        .flat_map(|positions| positions.iter().map(|p| p.summary()))
        .collect();

    ClaimReport {
        success: Vec::new(),
        failed: Vec::new(),
        total_amount: total_value,
        pending: Some(pending),
    }
}

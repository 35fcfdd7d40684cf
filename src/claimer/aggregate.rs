use rust_decimal::Decimal;

use crate::domain::{ClaimReport, PathOutcome, SettlementEntry, SettlementPath};
use crate::error::PathUnavailable;

/// Merge per-path results into one report.
///
/// `onchain` is `None` when the on-chain path was never attempted. A relayed
/// path-level note is only added when the relayer produced no per-group
/// failures of its own.
pub fn aggregate(
    relayed: Result<PathOutcome, PathUnavailable>,
    onchain: Option<Result<PathOutcome, PathUnavailable>>,
    total_value: Decimal,
) -> ClaimReport {
    let mut success = Vec::new();
    let mut failed = Vec::new();

    let relayed_unavailable = match relayed {
        Ok(outcome) => {
            success.extend(outcome.success);
            failed.extend(outcome.failed);
            None
        }
        Err(unavailable) => Some(unavailable),
    };
    let relayed_failures = failed.len();

    match onchain {
        Some(Ok(outcome)) => {
            success.extend(outcome.success);
            failed.extend(outcome.failed);
        }
        Some(Err(unavailable)) => {
            failed.push(SettlementEntry::path_failure(
                SettlementPath::OnChain,
                unavailable.reason,
            ));
        }
        None => {}
    }

    if let Some(unavailable) = relayed_unavailable {
        if relayed_failures == 0 {
            failed.push(SettlementEntry::path_failure(
                SettlementPath::Relayed,
                unavailable.reason,
            ));
        }
    }

    ClaimReport {
        success,
        failed,
        total_amount: total_value,
        pending: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn outcome(success: &[&str], failed: &[&str], mode: SettlementPath) -> PathOutcome {
        PathOutcome {
            success: success
                .iter()
                .map(|c| match mode {
                    SettlementPath::Relayed => SettlementEntry::relayed(c, "ok"),
                    _ => SettlementEntry::confirmed(c, "0xhash"),
                })
                .collect(),
            failed: failed
                .iter()
                .map(|c| SettlementEntry::failed(c, mode, "boom"))
                .collect(),
        }
    }

    #[test]
    fn test_relayed_only() {
        let report = aggregate(
            Ok(outcome(&["M1"], &["M2"], SettlementPath::Relayed)),
            None,
            dec!(5),
        );
        assert_eq!(report.success.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.total_amount, dec!(5));
        assert!(report.pending.is_none());
    }

    #[test]
    fn test_relay_unavailable_then_onchain() {
        let report = aggregate(
            Err(PathUnavailable::new("no builder credentials")),
            Some(Ok(outcome(&["M1"], &["M2"], SettlementPath::OnChain))),
            dec!(7),
        );
        assert_eq!(report.success[0].condition_id.as_deref(), Some("M1"));
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].condition_id.as_deref(), Some("M2"));
        let note = &report.failed[1];
        assert_eq!(note.condition_id, None);
        assert_eq!(note.mode, SettlementPath::Relayed);
        assert_eq!(note.error(), Some("no builder credentials"));
    }

    #[test]
    fn test_both_paths_unavailable() {
        let report = aggregate(
            Err(PathUnavailable::new("relayer disabled")),
            Some(Err(PathUnavailable::new("RPC unreachable: refused"))),
            dec!(1),
        );
        assert!(report.success.is_empty());
        let modes: Vec<_> = report.failed.iter().map(|e| e.mode).collect();
        assert_eq!(modes, vec![SettlementPath::OnChain, SettlementPath::Relayed]);
        assert!(report.failed.iter().all(|e| e.condition_id.is_none()));
    }

    #[test]
    fn test_failures_ordered_relayed_first() {
        let report = aggregate(
            Ok(outcome(&[], &["M1", "M2"], SettlementPath::Relayed)),
            Some(Ok(outcome(&["M1"], &["M2"], SettlementPath::OnChain))),
            dec!(3),
        );
        let failed: Vec<_> = report
            .failed
            .iter()
            .map(|e| (e.condition_id.as_deref(), e.mode))
            .collect();
        assert_eq!(
            failed,
            vec![
                (Some("M1"), SettlementPath::Relayed),
                (Some("M2"), SettlementPath::Relayed),
                (Some("M2"), SettlementPath::OnChain),
            ]
        );
    }
}

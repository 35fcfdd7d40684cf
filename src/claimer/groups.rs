use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::domain::{is_redeemable, ClaimGroups, ClaimablePosition, SettlementEntry};

/// Filter raw records down to claimable positions and group them by condition.
///
/// Records are skipped, never rejected: non-objects, records not flagged
/// redeemable, records without a condition id, zero/negative quantities, and
/// values that would overflow the total.
/// Returns the groups in first-seen order plus the summed `current_value` of
/// every kept position.
pub fn build_claim_groups(records: &[Value]) -> (ClaimGroups, Decimal) {
    let mut groups = ClaimGroups::new();
    let mut total_value = Decimal::ZERO;

    for record in records {
        if !record.is_object() || !is_redeemable(record) {
            continue;
        }

        let position = match ClaimablePosition::from_record(record) {
            Ok(p) => p,
            Err(e) => {
                debug!("Skipping redeemable record: {}", e);
                continue;
            }
        };

        if position.quantity <= Decimal::ZERO {
            debug!(
                "Skipping empty position in {} ({})",
                position.condition_id, position.outcome
            );
            continue;
        }

        let Some(next_total) = total_value.checked_add(position.current_value) else {
            debug!(
                "Skipping position in {} ({}): value {} overflows the running total",
                position.condition_id, position.outcome, position.current_value
            );
            continue;
        };
        total_value = next_total;
        groups
            .entry(position.condition_id.clone())
            .or_default()
            .push(position);
    }

    (groups, total_value)
}

/// Groups not yet settled by any of `successes`.
pub fn residual_groups(groups: &ClaimGroups, successes: &[SettlementEntry]) -> ClaimGroups {
    let settled: HashSet<&str> = successes
        .iter()
        .filter_map(|e| e.condition_id.as_deref())
        .collect();

    groups
        .iter()
        .filter(|(condition_id, _)| !settled.contains(condition_id.as_str()))
        .map(|(condition_id, positions)| (condition_id.clone(), positions.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn record(condition: &str, qty: f64, value: f64, redeemable: bool) -> Value {
        json!({
            "conditionId": condition,
            "size": qty,
            "currentValue": value,
            "redeemable": redeemable,
            "title": format!("Market {}", condition),
            "outcome": "Yes",
            "outcomeIndex": 0
        })
    }

    #[test]
    fn test_zero_quantity_excluded_from_groups_and_total() {
        let records = vec![record("A", 0.0, 5.0, true), record("B", 2.0, 7.0, true)];

        let (groups, total) = build_claim_groups(&records);
        assert_eq!(groups.len(), 1);
        assert!(groups.contains_key("B"));
        assert_eq!(total, dec!(7));
    }

    #[test]
    fn test_skips_unusable_records() {
        let records = vec![
            json!("not a record"),
            json!(null),
            record("A", 1.0, 1.0, false),
            json!({"size": 3, "currentValue": 3, "redeemable": true}),
            json!({"conditionId": "C", "size": -1, "currentValue": 4, "redeemable": true}),
            json!({"conditionId": "D", "size": 1, "currentValue": 2, "redeemable": "true"}),
            json!({"conditionId": "E", "size": 1, "currentValue": 9}),
        ];

        let (groups, total) = build_claim_groups(&records);
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["D"]);
        assert_eq!(total, dec!(2));
    }

    #[test]
    fn test_groups_partition_positions_in_discovery_order() {
        let records = vec![
            record("M2", 1.0, 1.0, true),
            record("M1", 2.0, 2.0, true),
            record("M2", 3.0, 3.0, true),
            record("M3", 4.0, 4.0, true),
            record("M1", 5.0, 5.0, true),
        ];

        let (groups, total) = build_claim_groups(&records);
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["M2", "M1", "M3"]);
        assert_eq!(total, dec!(15));

        let mut seen = 0;
        for (condition_id, positions) in &groups {
            assert!(!positions.is_empty());
            assert!(positions.iter().all(|p| &p.condition_id == condition_id));
            seen += positions.len();
        }
        assert_eq!(seen, 5);

        let m2: Vec<Decimal> = groups["M2"].iter().map(|p| p.quantity).collect();
        assert_eq!(m2, vec![dec!(1), dec!(3)]);
    }

    #[test]
    fn test_overflowing_value_is_skipped_not_panicking() {
        let huge = "79228162514264337593543950335";
        let records = vec![
            json!({"conditionId": "A", "size": 1, "currentValue": huge, "redeemable": true}),
            json!({"conditionId": "B", "size": 1, "currentValue": huge, "redeemable": true}),
            record("C", 1.0, 2.0, false),
        ];

        let (groups, total) = build_claim_groups(&records);
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(total, Decimal::MAX);
    }

    #[test]
    fn test_empty_input_is_nothing_to_claim() {
        let (groups, total) = build_claim_groups(&[]);
        assert!(groups.is_empty());
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn test_build_is_idempotent() {
        let records = vec![
            record("M1", 2.0, 2.5, true),
            record("M2", 1.0, 0.5, true),
            record("M1", 1.0, 1.0, true),
        ];

        let first = build_claim_groups(&records);
        let second = build_claim_groups(&records);
        assert_eq!(first, second);
    }

    #[test]
    fn test_residual_groups() {
        let records = vec![
            record("M1", 1.0, 1.0, true),
            record("M2", 1.0, 1.0, true),
            record("M3", 1.0, 1.0, true),
        ];
        let (groups, _) = build_claim_groups(&records);

        assert_eq!(residual_groups(&groups, &[]), groups);

        let some = vec![SettlementEntry::relayed("M2", "ok")];
        let rest = residual_groups(&groups, &some);
        assert_eq!(rest.keys().collect::<Vec<_>>(), vec!["M1", "M3"]);

        let all: Vec<_> = groups
            .keys()
            .map(|k| SettlementEntry::relayed(k, "ok"))
            .collect();
        assert!(residual_groups(&groups, &all).is_empty());
    }
}

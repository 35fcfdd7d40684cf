use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::coerce;

/// Why a raw Data API record could not become a [`ClaimablePosition`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionParseError {
    #[error("position record is not a JSON object")]
    NotAnObject,

    #[error("position record has no condition id")]
    MissingConditionId,
}

/// Redeemable share holding in one outcome of one market.
///
/// Built once from a Data API record and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimablePosition {
    pub market_question: String,
    pub outcome: String,
    pub quantity: Decimal,
    pub current_value: Decimal,
    pub condition_id: String,
    pub asset: Option<String>,
    pub negative_risk: bool,
    pub outcome_index: Option<u32>,
}

impl ClaimablePosition {
    /// Parse a raw record, accepting both the Data API's camelCase keys and
    /// the normalized snake_case ones.
    pub fn from_record(record: &Value) -> Result<Self, PositionParseError> {
        let map = record.as_object().ok_or(PositionParseError::NotAnObject)?;

        let condition_id = coerce::text(coerce::first_present(map, &["conditionId", "condition_id"]))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(PositionParseError::MissingConditionId)?;

        Ok(Self {
            market_question: coerce::text(coerce::first_present(map, &["title", "market_question"]))
                .unwrap_or_default(),
            outcome: coerce::text(coerce::first_present(map, &["outcome"])).unwrap_or_default(),
            quantity: coerce::decimal_or_zero(coerce::first_present(map, &["size", "quantity"])),
            current_value: coerce::decimal_or_zero(coerce::first_present(
                map,
                &["currentValue", "current_value"],
            )),
            condition_id,
            asset: coerce::text(coerce::first_present(map, &["asset", "asset_id"])),
            negative_risk: coerce::boolish(coerce::first_present(
                map,
                &["negativeRisk", "negative_risk", "negRisk", "neg_risk"],
            ))
            .unwrap_or(false),
            outcome_index: coerce::optional_index(coerce::first_present(
                map,
                &["outcomeIndex", "outcome_index"],
            )),
        })
    }

    pub fn summary(&self) -> PositionSummary {
        PositionSummary {
            market_question: self.market_question.clone(),
            outcome: self.outcome.clone(),
            quantity: self.quantity,
            current_value: self.current_value,
            condition_id: self.condition_id.clone(),
            asset: self.asset.clone(),
            negative_risk: self.negative_risk,
            outcome_index: self.outcome_index,
        }
    }
}

/// Whether a raw record is flagged redeemable. Absent or unreadable flags count as `false`.
pub fn is_redeemable(record: &Value) -> bool {
    record
        .as_object()
        .and_then(|map| coerce::boolish(map.get("redeemable")))
        .unwrap_or(false)
}

/// Compact, serializable view of a position for reports and CLI output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSummary {
    pub market_question: String,
    pub outcome: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_value: Decimal,
    pub condition_id: String,
    pub asset: Option<String>,
    pub negative_risk: bool,
    pub outcome_index: Option<u32>,
}

/// One row of the `positions` listing, redeemable or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionView {
    pub market_question: String,
    pub outcome: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_value: Decimal,
    pub condition_id: Option<String>,
    pub redeemable: bool,
}

impl PositionView {
    /// Lenient projection used for display; never fails.
    pub fn from_record(record: &Value) -> Option<Self> {
        let map = record.as_object()?;
        Some(Self {
            market_question: coerce::text(coerce::first_present(map, &["title", "market_question"]))
                .unwrap_or_default(),
            outcome: coerce::text(coerce::first_present(map, &["outcome"])).unwrap_or_default(),
            quantity: coerce::decimal_or_zero(coerce::first_present(map, &["size", "quantity"])),
            avg_price: coerce::decimal_or_zero(coerce::first_present(map, &["avgPrice", "avg_price"])),
            current_value: coerce::decimal_or_zero(coerce::first_present(
                map,
                &["currentValue", "current_value"],
            )),
            condition_id: coerce::text(coerce::first_present(map, &["conditionId", "condition_id"])),
            redeemable: is_redeemable(record),
        })
    }
}

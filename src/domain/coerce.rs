//! Best-effort conversion of loosely typed Data API values.
//!
//! Every helper here has a fixed fallback so that one malformed field never
//! takes down a whole position listing:
//!
//! | helper            | accepts                                   | fallback |
//! |-------------------|-------------------------------------------|----------|
//! | `decimal_or_zero` | numbers, numeric strings (incl. `1e-3`)   | `0`      |
//! | `optional_index`  | integers / integer strings in `0..=255`   | `None`   |
//! | `boolish`         | bools, `0`/`1`, yes/no/true/false strings | `None`   |
//! | `text`            | strings, numbers                          | `None`   |

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Highest outcome index that still fits a `uint256` index set (`1 << 255`).
pub const MAX_OUTCOME_INDEX: u32 = 255;

/// First non-null value among `keys` (API spelling first, then normalized).
pub fn first_present<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| !v.is_null())
}

pub fn decimal_or_zero(value: Option<&Value>) -> Decimal {
    value.and_then(to_decimal).unwrap_or(Decimal::ZERO)
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(Decimal::from(i));
            }
            parse_decimal_str(&n.to_string()).or_else(|| n.as_f64().and_then(Decimal::from_f64))
        }
        Value::String(s) => parse_decimal_str(s.trim()),
        _ => None,
    }
}

fn parse_decimal_str(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

pub fn optional_index(value: Option<&Value>) -> Option<u32> {
    let raw = match value? {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else {
                let f = n.as_f64()?;
                if f < 0.0 || f.fract() != 0.0 {
                    return None;
                }
                f as u64
            }
        }
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u32::try_from(raw).ok().filter(|i| *i <= MAX_OUTCOME_INDEX)
}

pub fn boolish(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(v) => Some(*v),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" => Some(true),
            "false" | "0" | "no" | "n" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

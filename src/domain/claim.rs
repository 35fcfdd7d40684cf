use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Serialize;

use super::position::{ClaimablePosition, PositionSummary};

/// Condition id -> positions in that market, in first-seen order.
pub type ClaimGroups = IndexMap<String, Vec<ClaimablePosition>>;

/// Which route produced a settlement entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SettlementPath {
    #[serde(rename = "relayed")]
    Relayed,
    #[serde(rename = "on-chain")]
    OnChain,
    #[serde(rename = "data-source")]
    DataSource,
}

impl SettlementPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementPath::Relayed => "relayed",
            SettlementPath::OnChain => "on-chain",
            SettlementPath::DataSource => "data-source",
        }
    }
}

impl std::fmt::Display for SettlementPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EntryPayload {
    /// Relayer accepted and confirmed the redemption.
    Relayed { result: String },
    /// Transaction mined with success status.
    Confirmed { tx_hash: String },
    Failed {
        #[serde(skip_serializing_if = "Option::is_none")]
        tx_hash: Option<String>,
        error: String,
    },
}

/// Result of trying to settle one market over one path.
///
/// `condition_id == None` marks a path-level note rather than a group result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementEntry {
    pub condition_id: Option<String>,
    pub mode: SettlementPath,
    #[serde(flatten)]
    pub payload: EntryPayload,
}

impl SettlementEntry {
    pub fn relayed(condition_id: &str, result: impl Into<String>) -> Self {
        Self {
            condition_id: Some(condition_id.to_string()),
            mode: SettlementPath::Relayed,
            payload: EntryPayload::Relayed {
                result: result.into(),
            },
        }
    }

    pub fn confirmed(condition_id: &str, tx_hash: impl Into<String>) -> Self {
        Self {
            condition_id: Some(condition_id.to_string()),
            mode: SettlementPath::OnChain,
            payload: EntryPayload::Confirmed {
                tx_hash: tx_hash.into(),
            },
        }
    }

    pub fn failed(condition_id: &str, mode: SettlementPath, error: impl Into<String>) -> Self {
        Self {
            condition_id: Some(condition_id.to_string()),
            mode,
            payload: EntryPayload::Failed {
                tx_hash: None,
                error: error.into(),
            },
        }
    }

    pub fn reverted(condition_id: &str, tx_hash: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            condition_id: Some(condition_id.to_string()),
            mode: SettlementPath::OnChain,
            payload: EntryPayload::Failed {
                tx_hash: Some(tx_hash.into()),
                error: error.into(),
            },
        }
    }

    pub fn path_failure(mode: SettlementPath, error: impl Into<String>) -> Self {
        Self {
            condition_id: None,
            mode,
            payload: EntryPayload::Failed {
                tx_hash: None,
                error: error.into(),
            },
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.payload {
            EntryPayload::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn tx_hash(&self) -> Option<&str> {
        match &self.payload {
            EntryPayload::Confirmed { tx_hash } => Some(tx_hash),
            EntryPayload::Failed { tx_hash, .. } => tx_hash.as_deref(),
            EntryPayload::Relayed { .. } => None,
        }
    }
}

/// Successes and failures produced by one settlement path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathOutcome {
    pub success: Vec<SettlementEntry>,
    pub failed: Vec<SettlementEntry>,
}

/// Final report of one claim run.
///
/// `total_amount` is the pre-attempt valuation of every redeemable position
/// and is not reconciled with how many claims went through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimReport {
    pub success: Vec<SettlementEntry>,
    pub failed: Vec<SettlementEntry>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<Vec<PositionSummary>>,
}

impl ClaimReport {
    /// Nothing redeemable was found.
    pub fn empty() -> Self {
        Self {
            success: Vec::new(),
            failed: Vec::new(),
            total_amount: Decimal::ZERO,
            pending: None,
        }
    }

    /// Position lookup failed before any valuation happened.
    pub fn data_source_failure(error: impl Into<String>) -> Self {
        Self {
            failed: vec![SettlementEntry::path_failure(SettlementPath::DataSource, error)],
            ..Self::empty()
        }
    }
}

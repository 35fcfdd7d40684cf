//! Primary settlement path: redeem through the builder relayer.
//!
//! The relayer pays gas, so this path never looks at gas prices or RPC state.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::traits::{Capability, RelayerProvider};
use crate::domain::{ClaimGroups, ClaimablePosition, PathOutcome, SettlementEntry, SettlementPath};
use crate::error::PathUnavailable;
use crate::signing::SigningCredentials;

/// Shares held per outcome index within one market.
///
/// Kept sparse so multi-outcome markets with high indices don't need a
/// pre-sized vector; positions with no index contribute nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeAmounts(BTreeMap<u32, Decimal>);

impl OutcomeAmounts {
    pub fn from_positions(positions: &[ClaimablePosition]) -> Self {
        let mut amounts = BTreeMap::new();
        for pos in positions {
            if let Some(index) = pos.outcome_index {
                let held = amounts.entry(index).or_insert(Decimal::ZERO);
                *held = held.saturating_add(pos.quantity);
            }
        }
        Self(amounts)
    }

    pub fn get(&self, index: u32) -> Decimal {
        self.0.get(&index).copied().unwrap_or(Decimal::ZERO)
    }

    /// Dense per-outcome vector, at least two entries long (binary markets).
    pub fn to_dense(&self) -> Vec<Decimal> {
        let len = self
            .0
            .keys()
            .next_back()
            .map(|max| *max as usize + 1)
            .unwrap_or(0)
            .max(2);
        (0..len as u32).map(|i| self.get(i)).collect()
    }
}

/// Drives the relayed path over every claim group.
pub struct RelayedSettler {
    provider: Arc<dyn RelayerProvider>,
}

impl RelayedSettler {
    pub fn new(provider: Arc<dyn RelayerProvider>) -> Self {
        Self { provider }
    }

    /// Attempt every group once; a failing group does not stop the rest.
    ///
    /// Returns `Err` only when no relay client could be built at all.
    pub async fn settle(
        &self,
        credentials: &SigningCredentials,
        groups: &ClaimGroups,
    ) -> Result<PathOutcome, PathUnavailable> {
        let client = match self.provider.relayer(credentials).await {
            Capability::Ready(client) => client,
            Capability::Unavailable(reason) => {
                warn!("Relayed path unavailable: {}", reason);
                return Err(PathUnavailable::new(reason));
            }
        };

        let mut outcome = PathOutcome::default();

        for (condition_id, positions) in groups {
            let amounts = OutcomeAmounts::from_positions(positions).to_dense();
            let neg_risk = positions.iter().any(|p| p.negative_risk);

            info!(
                "Relaying redeem for {} (amounts={:?}, neg_risk={})",
                condition_id, amounts, neg_risk
            );

            match client.redeem(condition_id, &amounts, neg_risk).await {
                Ok(result) => {
                    info!("Relayed redeem succeeded for {}: {}", condition_id, result);
                    outcome.success.push(SettlementEntry::relayed(condition_id, result));
                }
                Err(e) => {
                    warn!("Relayed redeem failed for {}: {}", condition_id, e);
                    outcome.failed.push(SettlementEntry::failed(
                        condition_id,
                        SettlementPath::Relayed,
                        e.to_string(),
                    ));
                }
            }
        }

        Ok(outcome)
    }
}

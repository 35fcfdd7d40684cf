//! Secondary settlement path: sign and broadcast `redeemPositions` ourselves.
//!
//! Used for whatever the relayer did not settle. Pays gas from the signer, so
//! every group passes a gas-price admission check first.

use alloy::primitives::{B256, U256};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::traits::{Capability, ChainClient, ChainProvider, ReceiptStatus, RedeemTransaction};
use crate::adapters::contracts::{redeem_positions_calldata, CONDITIONAL_TOKENS};
use crate::domain::coerce::MAX_OUTCOME_INDEX;
use crate::domain::{ClaimGroups, ClaimablePosition, PathOutcome, SettlementEntry, SettlementPath};
use crate::error::{PathUnavailable, Result};
use crate::signing::SigningCredentials;
use crate::validation::parse_condition_id;

/// Prefix of the failure reason for groups skipped by the gas ceiling.
pub const GAS_CEILING_EXCEEDED: &str = "gas price exceeds ceiling";

const WEI_PER_GWEI: u128 = 1_000_000_000;

#[derive(Debug, Clone)]
pub struct OnchainSettings {
    pub receipt_timeout: Duration,
    pub fallback_gas_limit: u64,
}

impl Default for OnchainSettings {
    fn default() -> Self {
        Self {
            receipt_timeout: Duration::from_secs(600),
            fallback_gas_limit: 500_000,
        }
    }
}

/// Index sets for a binary/multi-outcome CTF redemption: `1 << i` per held
/// outcome, ascending. Without any usable index both outcomes are redeemed.
pub fn index_sets(positions: &[ClaimablePosition]) -> Vec<U256> {
    let indices: BTreeSet<u32> = positions
        .iter()
        .filter_map(|p| p.outcome_index)
        .filter(|i| *i <= MAX_OUTCOME_INDEX)
        .collect();

    if indices.is_empty() {
        return vec![U256::from(1u8), U256::from(2u8)];
    }
    indices.into_iter().map(|i| U256::from(1u8) << i as usize).collect()
}

pub fn gas_ceiling_wei(max_gas_price_gwei: u64) -> u128 {
    max_gas_price_gwei as u128 * WEI_PER_GWEI
}

/// Estimate plus 20% headroom.
pub fn with_safety_margin(estimate: u64) -> u64 {
    estimate.saturating_add(estimate / 5)
}

/// One nonce counter shared by every submission of a single `settle` call.
struct NonceCounter(u64);

impl NonceCounter {
    fn current(&self) -> u64 {
        self.0
    }

    fn advance(&mut self) {
        self.0 += 1;
    }
}

pub struct OnchainSettler {
    provider: Arc<dyn ChainProvider>,
    settings: OnchainSettings,
}

impl OnchainSettler {
    pub fn new(provider: Arc<dyn ChainProvider>, settings: OnchainSettings) -> Self {
        Self { provider, settings }
    }

    /// Settle each group with its own transaction, sequentially.
    ///
    /// Returns `Err` when the path cannot run at all: no endpoint, no client,
    /// or the node is unreachable. Everything after that is per group.
    pub async fn settle(
        &self,
        credentials: &SigningCredentials,
        groups: &ClaimGroups,
        endpoint: Option<&str>,
        max_gas_price_gwei: Option<u64>,
    ) -> std::result::Result<PathOutcome, PathUnavailable> {
        let endpoint = endpoint
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| PathUnavailable::new("no RPC endpoint configured"))?;

        let client = match self.provider.connect(credentials, endpoint).await {
            Capability::Ready(client) => client,
            Capability::Unavailable(reason) => {
                warn!("On-chain path unavailable: {}", reason);
                return Err(PathUnavailable::new(reason));
            }
        };

        let chain_id = client.chain_id().await.map_err(|e| {
            warn!("RPC connectivity check failed: {}", e);
            PathUnavailable::new(format!("RPC unreachable: {}", e))
        })?;

        let mut nonce = NonceCounter(
            client
                .transaction_count()
                .await
                .map_err(|e| PathUnavailable::new(format!("failed to fetch nonce: {}", e)))?,
        );

        info!(
            "On-chain path ready (chain_id={}, sender={}, nonce={})",
            chain_id,
            client.sender(),
            nonce.current()
        );

        let ceiling = max_gas_price_gwei.map(gas_ceiling_wei);
        let mut outcome = PathOutcome::default();

        for (condition_id, positions) in groups {
            let gas_price = match client.gas_price().await {
                Ok(price) => price,
                Err(e) => {
                    warn!("Gas price lookup failed for {}: {}", condition_id, e);
                    outcome.failed.push(SettlementEntry::failed(
                        condition_id,
                        SettlementPath::OnChain,
                        e.to_string(),
                    ));
                    continue;
                }
            };

            if let Some(ceiling) = ceiling {
                if gas_price > ceiling {
                    warn!(
                        "Skipping {}: gas price {} wei above ceiling {} wei",
                        condition_id, gas_price, ceiling
                    );
                    outcome.failed.push(SettlementEntry::failed(
                        condition_id,
                        SettlementPath::OnChain,
                        format!(
                            "{} ({} gwei > {} gwei)",
                            GAS_CEILING_EXCEEDED,
                            gas_price / WEI_PER_GWEI,
                            ceiling / WEI_PER_GWEI
                        ),
                    ));
                    continue;
                }
            }

            let tx = match self.build_transaction(
                client.as_ref(),
                condition_id,
                positions,
                nonce.current(),
                gas_price,
                chain_id,
            ) {
                Ok(tx) => tx,
                Err(e) => {
                    warn!("Cannot build redeem for {}: {}", condition_id, e);
                    outcome.failed.push(SettlementEntry::failed(
                        condition_id,
                        SettlementPath::OnChain,
                        e.to_string(),
                    ));
                    continue;
                }
            };
            let tx = self.with_gas_limit(client.as_ref(), tx).await;

            let tx_hash = match client.send_transaction(&tx).await {
                Ok(hash) => hash,
                Err(e) => {
                    warn!("Broadcast failed for {}: {}", condition_id, e);
                    outcome.failed.push(SettlementEntry::failed(
                        condition_id,
                        SettlementPath::OnChain,
                        e.to_string(),
                    ));
                    continue;
                }
            };
            nonce.advance();

            let hash = format!("{:#x}", tx_hash);
            info!("Submitted redeem for {}: {} (nonce {})", condition_id, hash, tx.nonce);

            match self.await_receipt(client.as_ref(), condition_id, tx_hash, hash).await {
                Ok(entry) => outcome.success.push(entry),
                Err(entry) => outcome.failed.push(entry),
            }
        }

        Ok(outcome)
    }

    fn build_transaction(
        &self,
        client: &dyn ChainClient,
        condition_id: &str,
        positions: &[ClaimablePosition],
        nonce: u64,
        gas_price: u128,
        chain_id: u64,
    ) -> Result<RedeemTransaction> {
        let condition = B256::from(parse_condition_id(condition_id)?);
        let sets = index_sets(positions);
        debug!("Index sets for {}: {:?}", condition_id, sets);

        Ok(RedeemTransaction {
            from: client.sender(),
            to: CONDITIONAL_TOKENS,
            input: redeem_positions_calldata(condition, sets),
            nonce,
            gas_price,
            gas_limit: None,
            chain_id,
        })
    }

    async fn with_gas_limit(&self, client: &dyn ChainClient, mut tx: RedeemTransaction) -> RedeemTransaction {
        let limit = match client.estimate_gas(&tx).await {
            Ok(estimate) => with_safety_margin(estimate),
            Err(e) => {
                debug!(
                    "Gas estimation failed ({}), using {}",
                    e, self.settings.fallback_gas_limit
                );
                self.settings.fallback_gas_limit
            }
        };
        tx.gas_limit = Some(limit);
        tx
    }

    async fn await_receipt(
        &self,
        client: &dyn ChainClient,
        condition_id: &str,
        tx_hash: B256,
        hash: String,
    ) -> std::result::Result<SettlementEntry, SettlementEntry> {
        match client.wait_for_receipt(tx_hash, self.settings.receipt_timeout).await {
            Ok(ReceiptStatus::Success) => {
                info!("Redeem confirmed for {}: {}", condition_id, hash);
                Ok(SettlementEntry::confirmed(condition_id, hash))
            }
            Ok(ReceiptStatus::Reverted) => {
                warn!("Redeem reverted for {}: {}", condition_id, hash);
                Err(SettlementEntry::reverted(condition_id, hash, "transaction reverted"))
            }
            Err(e) => {
                warn!("No receipt for {} ({}): {}", condition_id, hash, e);
                Err(SettlementEntry::reverted(condition_id, hash, e.to_string()))
            }
        }
    }
}

//! Claim orchestration for resolved positions.
//!
//! Finds redeemable positions for an address, groups them per market, and
//! either reports them (dry run) or settles them: first through the builder
//! relayer, then directly on-chain for whatever is left.

pub mod aggregate;
pub mod dry_run;
pub mod groups;
pub mod onchain;
pub mod relayed;
pub mod traits;

pub use aggregate::aggregate;
pub use dry_run::dry_run_report;
pub use groups::{build_claim_groups, residual_groups};
pub use onchain::{OnchainSettings, OnchainSettler, GAS_CEILING_EXCEEDED};
pub use relayed::{OutcomeAmounts, RelayedSettler};
pub use traits::{
    Capability, ChainClient, ChainProvider, PositionSource, ReceiptStatus, RedeemTransaction,
    RelayClient, RelayerProvider,
};

use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::ClaimReport;
use crate::error::Result;
use crate::signing::SigningCredentials;
use crate::validation::parse_address;

/// One claim run's inputs. The engine never reads the environment itself.
#[derive(Clone, Default)]
pub struct ClaimRequest {
    pub private_key: String,
    pub address: String,
    pub dry_run: bool,
    pub onchain_endpoint: Option<String>,
    pub max_gas_price_gwei: Option<u64>,
}

impl fmt::Debug for ClaimRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimRequest")
            .field("private_key", &"[REDACTED]")
            .field("address", &self.address)
            .field("dry_run", &self.dry_run)
            .field("onchain_endpoint", &self.onchain_endpoint)
            .field("max_gas_price_gwei", &self.max_gas_price_gwei)
            .finish()
    }
}

pub struct ClaimOrchestrator {
    positions: Arc<dyn PositionSource>,
    relayed: RelayedSettler,
    onchain: OnchainSettler,
}

impl ClaimOrchestrator {
    pub fn new(
        positions: Arc<dyn PositionSource>,
        relayer: Arc<dyn RelayerProvider>,
        chain: Arc<dyn ChainProvider>,
        settings: OnchainSettings,
    ) -> Self {
        Self {
            positions,
            relayed: RelayedSettler::new(relayer),
            onchain: OnchainSettler::new(chain, settings),
        }
    }

    /// Run one claim pass.
    ///
    /// Only invalid input is returned as an error. Data source and settlement
    /// problems are folded into the report.
    pub async fn orchestrate(&self, request: &ClaimRequest) -> Result<ClaimReport> {
        let user = parse_address(&request.address)?;
        let credentials = SigningCredentials::from_private_key(&request.private_key)?;

        let records = match self.positions.fetch_positions(&user).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Position lookup failed for {}: {}", user, e);
                return Ok(ClaimReport::data_source_failure(e.to_string()));
            }
        };

        let (groups, total_value) = build_claim_groups(&records);
        info!(
            "Found {} redeemable market(s) worth ${} for {}",
            groups.len(),
            total_value,
            user
        );

        if request.dry_run {
            return Ok(dry_run_report(&groups, total_value));
        }
        if groups.is_empty() {
            return Ok(ClaimReport::empty());
        }

        let relayed = self.relayed.settle(&credentials, &groups).await;
        let settled = match &relayed {
            Ok(outcome) => outcome.success.as_slice(),
            Err(_) => &[],
        };
        let residual = residual_groups(&groups, settled);

        let onchain = match request.onchain_endpoint.as_deref() {
            Some(endpoint) if !residual.is_empty() => {
                info!("{} market(s) left for on-chain redemption", residual.len());
                Some(
                    self.onchain
                        .settle(&credentials, &residual, Some(endpoint), request.max_gas_price_gwei)
                        .await,
                )
            }
            _ => None,
        };

        Ok(aggregate(relayed, onchain, total_value))
    }
}

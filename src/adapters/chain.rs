//! Polygon RPC access over alloy for the on-chain redemption path

use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::contracts::{IERC20, USDC_E};
use crate::claimer::{Capability, ChainClient, ChainProvider, ReceiptStatus, RedeemTransaction};
use crate::error::{ClaimError, Result};
use crate::signing::SigningCredentials;

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

fn parse_rpc_url(endpoint: &str) -> Result<reqwest::Url> {
    endpoint
        .trim()
        .parse()
        .map_err(|e| ClaimError::Validation(format!("Invalid RPC URL {}: {}", endpoint, e)))
}

fn rpc_error(what: &str, e: impl std::fmt::Display) -> ClaimError {
    ClaimError::Chain(format!("{}: {}", what, e))
}

/// Signing RPC client bound to one endpoint and one key
pub struct RpcChainClient {
    provider: DynProvider,
    sender: Address,
}

impl RpcChainClient {
    pub fn connect(credentials: &SigningCredentials, endpoint: &str) -> Result<Self> {
        let url = parse_rpc_url(endpoint)?;
        let provider = ProviderBuilder::new()
            .wallet(credentials.wallet())
            .connect_http(url)
            .erased();
        Ok(Self {
            provider,
            sender: credentials.address(),
        })
    }

    fn request(tx: &RedeemTransaction) -> TransactionRequest {
        let mut request = TransactionRequest::default()
            .with_from(tx.from)
            .with_to(tx.to)
            .with_input(tx.input.clone())
            .with_nonce(tx.nonce)
            .with_gas_price(tx.gas_price)
            .with_chain_id(tx.chain_id);
        if let Some(limit) = tx.gas_limit {
            request.set_gas_limit(limit);
        }
        request
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| rpc_error("Failed to get chain id", e))
    }

    async fn gas_price(&self) -> Result<u128> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| rpc_error("Failed to get gas price", e))
    }

    async fn transaction_count(&self) -> Result<u64> {
        self.provider
            .get_transaction_count(self.sender)
            .pending()
            .await
            .map_err(|e| rpc_error("Failed to get transaction count", e))
    }

    async fn estimate_gas(&self, tx: &RedeemTransaction) -> Result<u64> {
        self.provider
            .estimate_gas(Self::request(tx))
            .await
            .map_err(|e| rpc_error("Gas estimation failed", e))
    }

    async fn send_transaction(&self, tx: &RedeemTransaction) -> Result<B256> {
        let pending = self
            .provider
            .send_transaction(Self::request(tx))
            .await
            .map_err(|e| rpc_error("Redeem tx failed", e))?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: B256, timeout: Duration) -> Result<ReceiptStatus> {
        let poll = async {
            loop {
                match self.provider.get_transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => {
                        return Ok(if receipt.status() {
                            ReceiptStatus::Success
                        } else {
                            ReceiptStatus::Reverted
                        })
                    }
                    Ok(None) => debug!("Receipt for {:#x} not available yet", tx_hash),
                    Err(e) => return Err(rpc_error("Failed to get receipt", e)),
                }
                tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, poll).await.map_err(|_| {
            ClaimError::Timeout(format!(
                "no receipt for {:#x} after {}s",
                tx_hash,
                timeout.as_secs()
            ))
        })?
    }
}

/// Connects [`RpcChainClient`]s on demand.
#[derive(Debug, Default, Clone)]
pub struct RpcChainProvider;

#[async_trait]
impl ChainProvider for RpcChainProvider {
    async fn connect(
        &self,
        credentials: &SigningCredentials,
        endpoint: &str,
    ) -> Capability<Arc<dyn ChainClient>> {
        match RpcChainClient::connect(credentials, endpoint) {
            Ok(client) => {
                let client: Arc<dyn ChainClient> = Arc::new(client);
                Capability::Ready(client)
            }
            Err(e) => Capability::Unavailable(e.to_string()),
        }
    }
}

/// Raw USDC.e balance of `owner` in 6-decimal base units.
pub async fn usdc_balance(endpoint: &str, owner: Address) -> Result<U256> {
    let provider = ProviderBuilder::new().connect_http(parse_rpc_url(endpoint)?);
    let token = IERC20::new(USDC_E, &provider);
    token
        .balanceOf(owner)
        .call()
        .await
        .map_err(|e| rpc_error("Failed to read USDC.e balance", e))
}

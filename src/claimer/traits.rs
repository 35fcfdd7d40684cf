//! Capabilities the claim engine consumes but does not implement.
//!
//! Concrete implementations live in `crate::adapters`; tests substitute
//! in-memory fakes.

use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::signing::SigningCredentials;

/// A capability that may or may not be usable in this runtime.
pub enum Capability<T> {
    Ready(T),
    Unavailable(String),
}

impl<T> Capability<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Capability::Ready(_))
    }
}

/// Source of raw position records for an address.
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Fails with `ClaimError::DataSource` on transport or parse failure.
    async fn fetch_positions(&self, user: &Address) -> Result<Vec<Value>>;
}

/// Relayer-backed ("gasless") redemption.
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Redeem one market. `amounts[i]` is the share quantity held for outcome `i`.
    async fn redeem(&self, condition_id: &str, amounts: &[Decimal], neg_risk: bool) -> Result<String>;
}

/// Builds a [`RelayClient`] for a signer, or explains why it cannot.
#[async_trait]
pub trait RelayerProvider: Send + Sync {
    async fn relayer(&self, credentials: &SigningCredentials) -> Capability<Arc<dyn RelayClient>>;
}

/// Fully specified redeem transaction, ready to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemTransaction {
    pub from: Address,
    pub to: Address,
    pub input: Bytes,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: Option<u64>,
    pub chain_id: u64,
}

/// Receipt status of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// RPC access for the direct on-chain path.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address transactions are sent from.
    fn sender(&self) -> Address;
    /// Doubles as the connectivity check.
    async fn chain_id(&self) -> Result<u64>;
    /// Current gas price in wei.
    async fn gas_price(&self) -> Result<u128>;
    /// Pending transaction count of the sender.
    async fn transaction_count(&self) -> Result<u64>;
    async fn estimate_gas(&self, tx: &RedeemTransaction) -> Result<u64>;
    /// Sign and broadcast; returns the transaction hash.
    async fn send_transaction(&self, tx: &RedeemTransaction) -> Result<B256>;
    /// Block until mined or `timeout` elapses.
    async fn wait_for_receipt(&self, tx_hash: B256, timeout: Duration) -> Result<ReceiptStatus>;
}

/// Connects a [`ChainClient`] to an RPC endpoint.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    async fn connect(
        &self,
        credentials: &SigningCredentials,
        endpoint: &str,
    ) -> Capability<Arc<dyn ChainClient>>;
}

//! In-memory fakes of the claim engine's capabilities.
#![allow(dead_code)]

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use polyclaim::claimer::{
    Capability, ChainClient, ChainProvider, PositionSource, ReceiptStatus, RedeemTransaction,
    RelayClient, RelayerProvider,
};
use polyclaim::error::{ClaimError, Result};
use polyclaim::signing::SigningCredentials;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Hardhat/anvil account #0; never holds real funds.
pub const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

/// 32-byte condition id made of one repeated byte.
pub fn condition(byte: u8) -> String {
    format!("0x{}", hex::encode([byte; 32]))
}

pub fn record(condition_id: &str, index: u32, qty: f64, value: f64, redeemable: bool) -> Value {
    json!({
        "conditionId": condition_id,
        "title": format!("Market {}", &condition_id[..6]),
        "outcome": if index == 0 { "Yes" } else { "No" },
        "outcomeIndex": index,
        "size": qty,
        "currentValue": value,
        "redeemable": redeemable,
        "negativeRisk": false
    })
}

// ---- position source ----

pub struct FakeSource {
    result: std::result::Result<Vec<Value>, String>,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub fn with(records: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(records),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PositionSource for FakeSource {
    async fn fetch_positions(&self, _user: &Address) -> Result<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(ClaimError::DataSource)
    }
}

// ---- relayer ----

#[derive(Default)]
pub struct FakeRelay {
    pub calls: Mutex<Vec<(String, Vec<Decimal>, bool)>>,
    pub reject: Vec<String>,
}

#[async_trait]
impl RelayClient for FakeRelay {
    async fn redeem(&self, condition_id: &str, amounts: &[Decimal], neg_risk: bool) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((condition_id.to_string(), amounts.to_vec(), neg_risk));
        if self.reject.iter().any(|r| r == condition_id) {
            return Err(ClaimError::Relayer("STATE_FAILED: reverted".into()));
        }
        Ok(format!("0xrelayed{}", &condition_id[2..8]))
    }
}

pub enum FakeRelayer {
    Ready(Arc<FakeRelay>),
    Unavailable(&'static str),
    /// Fails the test if the relay path is even consulted.
    Forbidden,
}

#[async_trait]
impl RelayerProvider for FakeRelayer {
    async fn relayer(&self, _: &SigningCredentials) -> Capability<Arc<dyn RelayClient>> {
        match self {
            FakeRelayer::Ready(relay) => {
                let client: Arc<dyn RelayClient> = relay.clone();
                Capability::Ready(client)
            }
            FakeRelayer::Unavailable(reason) => Capability::Unavailable(reason.to_string()),
            FakeRelayer::Forbidden => panic!("relayer must not be used"),
        }
    }
}

// ---- chain ----

/// Scripted chain: records every submitted transaction.
pub struct FakeChain {
    pub sender: Address,
    pub chain_id: std::result::Result<u64, String>,
    pub initial_nonce: u64,
    pub nonce_error: Option<String>,
    /// Gas price per lookup, in wei; the last one repeats.
    pub gas_prices: Mutex<VecDeque<u128>>,
    pub estimate: Option<u64>,
    /// Condition id hex (no 0x) -> broadcast error
    pub broadcast_errors: HashMap<String, String>,
    /// Condition id hex (no 0x) -> receipt status
    pub receipts: HashMap<String, ReceiptStatus>,
    pub sent: Mutex<Vec<RedeemTransaction>>,
    pub estimated: AtomicUsize,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self {
            sender: TEST_ADDRESS.parse().unwrap(),
            chain_id: Ok(137),
            initial_nonce: 0,
            nonce_error: None,
            gas_prices: Mutex::new(VecDeque::from(vec![30_000_000_000])),
            estimate: Some(100_000),
            broadcast_errors: HashMap::new(),
            receipts: HashMap::new(),
            sent: Mutex::new(Vec::new()),
            estimated: AtomicUsize::new(0),
        }
    }
}

impl FakeChain {
    pub fn nonces(&self) -> Vec<u64> {
        self.sent.lock().unwrap().iter().map(|tx| tx.nonce).collect()
    }

    /// The condition id encoded in the calldata (third ABI word).
    fn condition_of(tx: &RedeemTransaction) -> String {
        hex::encode(&tx.input[4 + 64..4 + 96])
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn chain_id(&self) -> Result<u64> {
        self.chain_id.clone().map_err(ClaimError::Chain)
    }

    async fn gas_price(&self) -> Result<u128> {
        let mut prices = self.gas_prices.lock().unwrap();
        if prices.len() > 1 {
            Ok(prices.pop_front().unwrap())
        } else {
            Ok(*prices.front().unwrap())
        }
    }

    async fn transaction_count(&self) -> Result<u64> {
        match &self.nonce_error {
            Some(err) => Err(ClaimError::Chain(err.clone())),
            None => Ok(self.initial_nonce),
        }
    }

    async fn estimate_gas(&self, _tx: &RedeemTransaction) -> Result<u64> {
        self.estimated.fetch_add(1, Ordering::SeqCst);
        self.estimate
            .ok_or_else(|| ClaimError::Chain("execution reverted".into()))
    }

    async fn send_transaction(&self, tx: &RedeemTransaction) -> Result<B256> {
        let condition = Self::condition_of(tx);
        if let Some(err) = self.broadcast_errors.get(&condition) {
            return Err(ClaimError::Chain(err.clone()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(tx.clone());
        Ok(B256::with_last_byte(sent.len() as u8))
    }

    async fn wait_for_receipt(&self, tx_hash: B256, _timeout: Duration) -> Result<ReceiptStatus> {
        let sent = self.sent.lock().unwrap();
        let tx = &sent[tx_hash.0[31] as usize - 1];
        Ok(self
            .receipts
            .get(&Self::condition_of(tx))
            .copied()
            .unwrap_or(ReceiptStatus::Success))
    }
}

pub enum FakeChainProvider {
    Ready(Arc<FakeChain>),
    Unavailable(&'static str),
    Forbidden,
}

#[async_trait]
impl ChainProvider for FakeChainProvider {
    async fn connect(&self, _: &SigningCredentials, _endpoint: &str) -> Capability<Arc<dyn ChainClient>> {
        match self {
            FakeChainProvider::Ready(chain) => {
                let client: Arc<dyn ChainClient> = chain.clone();
                Capability::Ready(client)
            }
            FakeChainProvider::Unavailable(reason) => Capability::Unavailable(reason.to_string()),
            FakeChainProvider::Forbidden => panic!("chain must not be used"),
        }
    }
}

pub fn credentials() -> SigningCredentials {
    SigningCredentials::from_private_key(TEST_KEY).unwrap()
}

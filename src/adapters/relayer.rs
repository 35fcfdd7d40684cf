//! Polymarket builder relayer client (gasless redemption)
//!
//! Submits `redeemPositions` calls through `POST /submit` with builder HMAC
//! headers, then polls `GET /transaction/{id}` until the relayer reports a
//! terminal state.

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::contracts::{
    neg_risk_redeem_calldata, redeem_positions_calldata, to_base_units, CONDITIONAL_TOKENS,
    NEG_RISK_ADAPTER,
};
use crate::claimer::{Capability, RelayClient, RelayerProvider};
use crate::config::RelayerConfig;
use crate::error::{ClaimError, Result};
use crate::signing::{BuilderAuth, BuilderCredentials, SigningCredentials};
use crate::validation::{parse_address, parse_condition_id};

const SUBMIT_PATH: &str = "/submit";

/// One call executed by the relayer from the user's wallet
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RelayTransaction {
    pub to: String,
    /// 0 = Call
    pub operation: u8,
    pub data: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_wallet: Option<String>,
    pub signature_type: u8,
    pub transactions: Vec<RelayTransaction>,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "transactionID", alias = "transactionId", alias = "id")]
    transaction_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionStatus {
    #[serde(default)]
    state: String,
    #[serde(default)]
    transaction_hash: Option<String>,
    #[serde(default)]
    metadata: Option<Value>,
}

/// Terminal or in-flight relayer transaction state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayState {
    Confirmed(String),
    Failed(String),
    Pending(String),
}

impl TransactionStatus {
    fn classify(self) -> RelayState {
        match self.state.as_str() {
            "STATE_CONFIRMED" => RelayState::Confirmed(
                self.transaction_hash
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
            "STATE_FAILED" | "STATE_INVALID" => {
                let reason = match self.metadata {
                    Some(Value::String(s)) if !s.is_empty() => s,
                    Some(Value::Null) | None => "transaction failed".to_string(),
                    Some(other) => other.to_string(),
                };
                RelayState::Failed(format!("{}: {}", self.state, reason))
            }
            other => RelayState::Pending(other.to_string()),
        }
    }
}

/// Build the single relayer call that redeems one market.
///
/// Negative-risk markets go through the adapter with per-outcome amounts;
/// everything else redeems both outcomes on the CTF contract directly.
pub fn redeem_transaction(condition_id: &str, amounts: &[Decimal], neg_risk: bool) -> Result<RelayTransaction> {
    let condition = B256::from(parse_condition_id(condition_id)?);

    let (to, data) = if neg_risk {
        let amounts = amounts
            .iter()
            .copied()
            .map(to_base_units)
            .collect::<Result<Vec<U256>>>()?;
        (NEG_RISK_ADAPTER, neg_risk_redeem_calldata(condition, amounts))
    } else {
        (
            CONDITIONAL_TOKENS,
            redeem_positions_calldata(condition, vec![U256::from(1u8), U256::from(2u8)]),
        )
    };

    Ok(RelayTransaction {
        to: format!("{:#x}", to),
        operation: 0,
        data: format!("0x{}", hex::encode(&data)),
        value: "0".to_string(),
    })
}

/// HTTP client for one signer against the builder relayer
pub struct HttpRelayClient {
    http: reqwest::Client,
    base_url: String,
    auth: BuilderAuth,
    from: Address,
    proxy_wallet: Option<Address>,
    signature_type: u8,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl HttpRelayClient {
    pub fn new(
        config: &RelayerConfig,
        credentials: BuilderCredentials,
        from: Address,
        proxy_wallet: Option<Address>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            auth: BuilderAuth::new(credentials),
            from,
            proxy_wallet,
            signature_type: config.signature_type,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            poll_timeout: Duration::from_secs(config.poll_timeout_secs),
        })
    }

    /// Submit a batch and return the relayer transaction id.
    pub async fn submit(&self, transactions: Vec<RelayTransaction>, description: String) -> Result<String> {
        let request = SubmitRequest {
            from: format!("{:#x}", self.from),
            proxy_wallet: self.proxy_wallet.map(|a| format!("{:#x}", a)),
            signature_type: self.signature_type,
            transactions,
            description,
        };
        let body = serde_json::to_string(&request)?;
        let headers = self.auth.build_headers("POST", SUBMIT_PATH, Some(&body))?;

        let response = self
            .http
            .post(format!("{}{}", self.base_url, SUBMIT_PATH))
            .headers(headers)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ClaimError::Relayer(format!("Failed to submit to relayer: {}", e)))?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ClaimError::Relayer(format!(
                "Relayer rejected submission ({}): {}",
                status, text
            )));
        }

        let parsed: SubmitResponse = serde_json::from_str(&text).map_err(|e| {
            ClaimError::Relayer(format!("Unexpected relayer response {}: {}", text, e))
        })?;
        Ok(parsed.transaction_id)
    }

    /// Poll until the relayer confirms or fails the transaction.
    pub async fn wait_for_transaction(&self, transaction_id: &str) -> Result<String> {
        let url = format!("{}/transaction/{}", self.base_url, transaction_id);
        let deadline = Instant::now() + self.poll_timeout;

        loop {
            match self.fetch_state(&url).await {
                Ok(RelayState::Confirmed(hash)) => return Ok(hash),
                Ok(RelayState::Failed(reason)) => {
                    return Err(ClaimError::Relayer(format!(
                        "Relayer transaction {} failed: {}",
                        transaction_id, reason
                    )))
                }
                Ok(RelayState::Pending(state)) => {
                    debug!("Relayer transaction {} state: {}", transaction_id, state);
                }
                Err(e) => warn!("Failed to check relayer status: {} - will retry", e),
            }

            if Instant::now() + self.poll_interval > deadline {
                return Err(ClaimError::Timeout(format!(
                    "Relayer transaction {} not confirmed after {}s",
                    transaction_id,
                    self.poll_timeout.as_secs()
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn fetch_state(&self, url: &str) -> Result<RelayState> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClaimError::Relayer(format!("status endpoint returned {}", status)));
        }

        // The status endpoint may wrap the record in a one-element array.
        let body: Value = response.json().await?;
        let record = match body {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };
        let parsed: TransactionStatus = serde_json::from_value(record)?;
        Ok(parsed.classify())
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn redeem(&self, condition_id: &str, amounts: &[Decimal], neg_risk: bool) -> Result<String> {
        let tx = redeem_transaction(condition_id, amounts, neg_risk)?;
        let id = self
            .submit(vec![tx], format!("Redeem positions for {}", condition_id))
            .await?;
        info!("Relayer accepted redeem for {} as {}", condition_id, id);
        self.wait_for_transaction(&id).await
    }
}

/// Hands out relay clients when the relayer is enabled and credentialed.
pub struct BuilderRelayerProvider {
    config: RelayerConfig,
    credentials: Option<BuilderCredentials>,
}

impl BuilderRelayerProvider {
    pub fn new(config: RelayerConfig, credentials: Option<BuilderCredentials>) -> Self {
        Self { config, credentials }
    }
}

#[async_trait]
impl RelayerProvider for BuilderRelayerProvider {
    async fn relayer(&self, signer: &SigningCredentials) -> Capability<Arc<dyn RelayClient>> {
        if !self.config.enabled {
            return Capability::Unavailable("relayer disabled".to_string());
        }
        let Some(credentials) = self.credentials.clone() else {
            return Capability::Unavailable("builder API credentials not configured".to_string());
        };

        let proxy_wallet = match self.config.proxy_wallet.as_deref() {
            Some(raw) => match parse_address(raw) {
                Ok(address) => Some(address),
                Err(e) => return Capability::Unavailable(format!("invalid proxy wallet: {}", e)),
            },
            None => None,
        };

        match HttpRelayClient::new(&self.config, credentials, signer.address(), proxy_wallet) {
            Ok(client) => {
                let client: Arc<dyn RelayClient> = Arc::new(client);
                Capability::Ready(client)
            }
            Err(e) => Capability::Unavailable(format!("failed to build relayer client: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    const CONDITION: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    #[test]
    fn test_binary_redeem_targets_ctf() {
        let tx = redeem_transaction(CONDITION, &[dec!(3), dec!(0)], false).unwrap();
        assert_eq!(tx.to, format!("{:#x}", CONDITIONAL_TOKENS));
        assert_eq!(tx.operation, 0);
        assert_eq!(tx.value, "0");
        assert!(tx.data.starts_with("0x"));
    }

    #[test]
    fn test_neg_risk_redeem_targets_adapter() {
        let tx = redeem_transaction(CONDITION, &[dec!(1.5), dec!(0)], true).unwrap();
        assert_eq!(tx.to, format!("{:#x}", NEG_RISK_ADAPTER));
        // 1.5 shares -> 1_500_000 base units somewhere in the encoded amounts
        assert!(tx.data.contains(&format!("{:064x}", 1_500_000u64)));
    }

    #[test]
    fn test_oversized_neg_risk_amount_is_rejected() {
        let err = redeem_transaction(CONDITION, &[dec!(100000000000000000000000), dec!(0)], true)
            .unwrap_err();
        assert!(matches!(err, ClaimError::Settlement(_)));
        // Binary markets never convert amounts.
        assert!(redeem_transaction(CONDITION, &[Decimal::MAX, dec!(0)], false).is_ok());
    }

    #[test]
    fn test_bad_condition_id() {
        assert!(redeem_transaction("0xnothex", &[], false).is_err());
    }

    #[test]
    fn test_status_classification() {
        let confirmed: TransactionStatus =
            serde_json::from_value(json!({"state": "STATE_CONFIRMED", "transactionHash": "0xabc"})).unwrap();
        assert_eq!(confirmed.classify(), RelayState::Confirmed("0xabc".into()));

        let failed: TransactionStatus =
            serde_json::from_value(json!({"state": "STATE_FAILED", "metadata": "reverted"})).unwrap();
        assert_eq!(failed.classify(), RelayState::Failed("STATE_FAILED: reverted".into()));

        let pending: TransactionStatus = serde_json::from_value(json!({"state": "STATE_MINED"})).unwrap();
        assert_eq!(pending.classify(), RelayState::Pending("STATE_MINED".into()));
    }

    #[test]
    fn test_submit_request_shape() {
        let request = SubmitRequest {
            from: "0xabc".into(),
            proxy_wallet: None,
            signature_type: 1,
            transactions: vec![],
            description: "d".into(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"from": "0xabc", "signatureType": 1, "transactions": [], "description": "d"})
        );
    }

    #[tokio::test]
    async fn test_provider_unavailable_without_credentials() {
        let signer = SigningCredentials::from_private_key(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();

        let provider = BuilderRelayerProvider::new(RelayerConfig::default(), None);
        match provider.relayer(&signer).await {
            Capability::Unavailable(reason) => assert!(reason.contains("credentials")),
            Capability::Ready(_) => panic!("expected unavailable"),
        }

        let disabled = RelayerConfig {
            enabled: false,
            ..RelayerConfig::default()
        };
        let creds = BuilderCredentials::new("k".into(), "s".into(), "p".into());
        let provider = BuilderRelayerProvider::new(disabled, Some(creds));
        assert!(!provider.relayer(&signer).await.is_ready());
    }
}

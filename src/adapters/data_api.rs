//! Polymarket Data API client (positions lookup)

use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::claimer::PositionSource;
use crate::config::DataApiConfig;
use crate::domain::PositionView;
use crate::error::{ClaimError, Result};

/// Read-only client for `GET /positions`
#[derive(Debug, Clone)]
pub struct DataApiClient {
    http: reqwest::Client,
    base_url: String,
    page_limit: u32,
}

impl DataApiClient {
    pub fn new(config: &DataApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_limit: config.page_limit,
        })
    }

    /// Raw position records, largest holdings first.
    #[instrument(skip(self))]
    pub async fn positions(&self, user: &Address) -> Result<Vec<Value>> {
        let url = format!("{}/positions", self.base_url);
        let user = format!("{:#x}", user);
        let limit = self.page_limit.to_string();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("user", user.as_str()),
                ("limit", limit.as_str()),
                ("sizeThreshold", "0"),
                ("sortBy", "TOKENS"),
                ("sortDirection", "DESC"),
            ])
            .send()
            .await
            .map_err(|e| ClaimError::DataSource(format!("Failed to fetch positions: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClaimError::DataSource(format!(
                "Data API error: {} for user {}",
                status, user
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ClaimError::DataSource(format!("Failed to parse positions response: {}", e)))?;

        match body {
            Value::Array(records) => {
                debug!("Fetched {} position records for {}", records.len(), user);
                Ok(records)
            }
            other => Err(ClaimError::DataSource(format!(
                "Expected a list of positions, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Every position for display, redeemable or not.
    pub async fn position_views(&self, user: &Address) -> Result<Vec<PositionView>> {
        let records = self.positions(user).await?;
        Ok(records.iter().filter_map(PositionView::from_record).collect())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl PositionSource for DataApiClient {
    async fn fetch_positions(&self, user: &Address) -> Result<Vec<Value>> {
        self.positions(user).await
    }
}

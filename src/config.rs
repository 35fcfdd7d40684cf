use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

pub const DATA_API_URL: &str = "https://data-api.polymarket.com";
pub const RELAYER_URL: &str = "https://relayer-v2.polymarket.com";
pub const POLYGON_CHAIN_ID: u64 = 137;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data_api: DataApiConfig,
    #[serde(default)]
    pub relayer: RelayerConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataApiConfig {
    /// Base URL of the positions Data API
    #[serde(default = "default_data_api_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_data_api_timeout")]
    pub timeout_secs: u64,
    /// Page size requested from `/positions`
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

fn default_data_api_url() -> String {
    DATA_API_URL.to_string()
}

fn default_data_api_timeout() -> u64 {
    10
}

fn default_page_limit() -> u32 {
    500
}

impl Default for DataApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_data_api_url(),
            timeout_secs: default_data_api_timeout(),
            page_limit: default_page_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayerConfig {
    /// Disable to go straight to the on-chain path
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_relayer_url")]
    pub url: String,
    /// Builder API key (POLY_BUILDER_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub passphrase: Option<String>,
    /// 0 = EOA, 1 = Polymarket proxy, 2 = Gnosis Safe
    #[serde(default = "default_signature_type")]
    pub signature_type: u8,
    /// Proxy wallet holding the positions, when different from the signer
    #[serde(default)]
    pub proxy_wallet: Option<String>,
    /// Polling interval for relayer transaction state in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Give up waiting for relayer confirmation after this many seconds
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_relayer_url() -> String {
    RELAYER_URL.to_string()
}

fn default_signature_type() -> u8 {
    1
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_poll_timeout() -> u64 {
    120
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_relayer_url(),
            api_key: None,
            secret: None,
            passphrase: None,
            signature_type: default_signature_type(),
            proxy_wallet: None,
            poll_interval_ms: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// Polygon RPC endpoint for the on-chain fallback; none disables it
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Skip on-chain claims while gas is above this price
    #[serde(default)]
    pub max_gas_price_gwei: Option<u64>,
    /// How long to wait for a redeem receipt
    #[serde(default = "default_receipt_timeout")]
    pub receipt_timeout_secs: u64,
    /// Gas limit used when estimation fails
    #[serde(default = "default_fallback_gas_limit")]
    pub fallback_gas_limit: u64,
}

fn default_chain_id() -> u64 {
    POLYGON_CHAIN_ID
}

fn default_receipt_timeout() -> u64 {
    600
}

fn default_fallback_gas_limit() -> u64 {
    500_000
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            chain_id: default_chain_id(),
            max_gas_price_gwei: None,
            receipt_timeout_secs: default_receipt_timeout(),
            fallback_gas_limit: default_fallback_gas_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_api: DataApiConfig::default(),
            relayer: RelayerConfig::default(),
            chain: ChainConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Layered load: built-in defaults, `<dir>/default.toml`, an optional
    /// `<dir>/local.toml`, then `POLYCLAIM_<SECTION>__<KEY>` variables.
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let dir = config_dir.as_ref();

        Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .add_source(File::from(dir.join("default.toml")).required(false))
            .add_source(File::from(dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("POLYCLAIM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Builder credentials, if all three parts are configured
    pub fn builder_credentials(&self) -> Option<crate::signing::BuilderCredentials> {
        crate::signing::BuilderCredentials::from_parts(
            self.relayer.api_key.as_deref(),
            self.relayer.secret.as_deref(),
            self.relayer.passphrase.as_deref(),
        )
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if url::Url::parse(&self.data_api.base_url).is_err() {
            errors.push(format!("data_api.base_url is not a URL: {}", self.data_api.base_url));
        }

        if self.data_api.page_limit == 0 {
            errors.push("data_api.page_limit must be positive".to_string());
        }

        if self.relayer.enabled && url::Url::parse(&self.relayer.url).is_err() {
            errors.push(format!("relayer.url is not a URL: {}", self.relayer.url));
        }

        if self.relayer.signature_type > 2 {
            errors.push(format!(
                "relayer.signature_type must be 0, 1 or 2, got {}",
                self.relayer.signature_type
            ));
        }

        if let Some(rpc) = &self.chain.rpc_url {
            if url::Url::parse(rpc).is_err() {
                errors.push(format!("chain.rpc_url is not a URL: {}", rpc));
            }
        }

        if self.chain.receipt_timeout_secs == 0 {
            errors.push("chain.receipt_timeout_secs must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

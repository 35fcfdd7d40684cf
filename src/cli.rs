//! `polyclaim` command line: argument parsing and command runners.

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tabled::{Table, Tabled};
use tracing::{info, warn};

use crate::adapters::contracts::{from_base_units, USDC_E};
use crate::adapters::{usdc_balance, BuilderRelayerProvider, DataApiClient, RpcChainProvider};
use crate::claimer::{ClaimOrchestrator, ClaimRequest, OnchainSettings};
use crate::config::AppConfig;
use crate::domain::{ClaimReport, PositionView};
use crate::error::{ClaimError, Result};
use crate::signing::BuilderCredentials;
use crate::validation::parse_address;

/// Public Polygon endpoints tried in order when no RPC URL is configured.
pub const PUBLIC_POLYGON_RPCS: &[&str] = &[
    "https://polygon-bor-rpc.publicnode.com",
    "https://polygon-rpc.com",
    "https://1rpc.io/matic",
];

#[derive(Parser, Debug)]
#[command(name = "polyclaim")]
#[command(author, version, about = "Claim redeemable Polymarket winnings", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory (default.toml and per-environment overrides)
    #[arg(long, global = true, default_value = "config")]
    pub config_dir: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find redeemable positions and claim them (dry run unless --execute)
    Claim(ClaimArgs),
    /// List every position held by an address
    Positions {
        /// Address to look up (defaults to FUNDER_ADDRESS / USER_ADDRESS)
        address: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// USDC.e collateral balance on Polygon
    Balance {
        /// Address to look up (defaults to FUNDER_ADDRESS / USER_ADDRESS)
        address: Option<String>,
        #[arg(long, env = "POLYGON_RPC_URL")]
        rpc_url: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Clone)]
pub struct ClaimArgs {
    /// Address holding the positions (defaults to FUNDER_ADDRESS / USER_ADDRESS)
    #[arg(long, visible_alias = "user-address")]
    pub address: Option<String>,

    /// Key used to sign redemptions
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Actually claim instead of only listing what would be claimed
    #[arg(long)]
    pub execute: bool,

    /// Polygon RPC for the on-chain fallback
    #[arg(long, visible_alias = "fallback-rpc-url", env = "POLYGON_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Skip on-chain claims while gas is above this price
    #[arg(long)]
    pub max_gas_price_gwei: Option<u64>,

    #[arg(long, env = "POLY_BUILDER_API_KEY", hide_env_values = true)]
    pub builder_api_key: Option<String>,

    #[arg(long, env = "POLY_BUILDER_SECRET", hide_env_values = true)]
    pub builder_secret: Option<String>,

    #[arg(long, env = "POLY_BUILDER_PASSPHRASE", hide_env_values = true)]
    pub builder_passphrase: Option<String>,
}

impl std::fmt::Debug for ClaimArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimArgs")
            .field("address", &self.address)
            .field("execute", &self.execute)
            .field("rpc_url", &self.rpc_url)
            .field("max_gas_price_gwei", &self.max_gas_price_gwei)
            .field("builder_api_key", &self.builder_api_key)
            .finish_non_exhaustive()
    }
}

/// Explicit argument, else `FUNDER_ADDRESS`, else `USER_ADDRESS`.
pub fn resolve_address(explicit: Option<&str>) -> Result<String> {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var("FUNDER_ADDRESS").ok())
        .or_else(|| std::env::var("USER_ADDRESS").ok())
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| {
            ClaimError::Validation(
                "no address given; pass one or set FUNDER_ADDRESS / USER_ADDRESS".to_string(),
            )
        })
}

pub async fn run_claim(args: &ClaimArgs, config: &AppConfig) -> Result<ClaimReport> {
    let address = resolve_address(args.address.as_deref())?;
    let private_key = args
        .private_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            ClaimError::Wallet("no private key given; pass --private-key or set PRIVATE_KEY".into())
        })?;

    let builder = BuilderCredentials::from_parts(
        args.builder_api_key.as_deref(),
        args.builder_secret.as_deref(),
        args.builder_passphrase.as_deref(),
    )
    .or_else(|| config.builder_credentials());

    let orchestrator = ClaimOrchestrator::new(
        Arc::new(DataApiClient::new(&config.data_api)?),
        Arc::new(BuilderRelayerProvider::new(config.relayer.clone(), builder)),
        Arc::new(RpcChainProvider),
        OnchainSettings {
            receipt_timeout: Duration::from_secs(config.chain.receipt_timeout_secs),
            fallback_gas_limit: config.chain.fallback_gas_limit,
        },
    );

    let request = ClaimRequest {
        private_key,
        address,
        dry_run: !args.execute,
        onchain_endpoint: args.rpc_url.clone().or_else(|| config.chain.rpc_url.clone()),
        max_gas_price_gwei: args.max_gas_price_gwei.or(config.chain.max_gas_price_gwei),
    };
    info!("Starting claim run: {:?}", request);

    orchestrator.orchestrate(&request).await
}

#[derive(Debug, Serialize, Tabled)]
pub struct PositionRow {
    #[tabled(rename = "Market")]
    pub market: String,
    #[tabled(rename = "Outcome")]
    pub outcome: String,
    #[tabled(rename = "Shares")]
    pub shares: String,
    #[tabled(rename = "Avg Price")]
    pub avg_price: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Redeemable")]
    pub redeemable: String,
}

impl From<&PositionView> for PositionRow {
    fn from(view: &PositionView) -> Self {
        let mut market = view.market_question.clone();
        if market.chars().count() > 60 {
            market = market.chars().take(57).collect::<String>() + "...";
        }
        Self {
            market,
            outcome: view.outcome.clone(),
            shares: format!("{:.2}", view.quantity.round_dp(2)),
            avg_price: format!("{:.4}", view.avg_price.round_dp(4)),
            value: format!("${:.2}", view.current_value.round_dp(2)),
            redeemable: if view.redeemable { "yes" } else { "" }.to_string(),
        }
    }
}

pub async fn run_positions(address: Option<&str>, json: bool, config: &AppConfig) -> Result<()> {
    let user = parse_address(&resolve_address(address)?)?;
    let client = DataApiClient::new(&config.data_api)?;
    let views = client.position_views(&user).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if views.is_empty() {
        println!("(no positions)");
        return Ok(());
    }
    let rows: Vec<PositionRow> = views.iter().map(PositionRow::from).collect();
    println!("{}", Table::new(&rows));

    let redeemable: Vec<&PositionView> = views.iter().filter(|v| v.redeemable).collect();
    if !redeemable.is_empty() {
        println!(
            "\n{} redeemable position(s) worth ${:.2}; run `polyclaim claim` to review",
            redeemable.len(),
            redeemable_value(&redeemable).round_dp(2)
        );
    }
    Ok(())
}

/// Summed value of the redeemable rows; saturates on absurd Data API values.
fn redeemable_value(views: &[&PositionView]) -> rust_decimal::Decimal {
    views
        .iter()
        .fold(rust_decimal::Decimal::ZERO, |acc, v| acc.saturating_add(v.current_value))
}

#[derive(Debug, Serialize)]
pub struct BalanceReport {
    pub address: String,
    pub chain_id: u64,
    pub usdc_contract: String,
    pub raw_balance: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: rust_decimal::Decimal,
    pub rpc_url: String,
}

pub async fn run_balance(address: Option<&str>, rpc_url: Option<&str>, json: bool, config: &AppConfig) -> Result<()> {
    let owner = parse_address(&resolve_address(address)?)?;
    let report = fetch_balance(owner, rpc_url.or(config.chain.rpc_url.as_deref()), config.chain.chain_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Address:     {}", report.address);
        println!("Network:     Polygon (chain_id={})", report.chain_id);
        println!("Collateral:  USDC.e {}", report.usdc_contract);
        println!("Raw balance: {}", report.raw_balance);
        println!("Balance:     {:.6} USDC", report.balance);
    }
    Ok(())
}

/// Read the balance from `rpc_url`, or from the public endpoints in turn.
async fn fetch_balance(owner: Address, rpc_url: Option<&str>, chain_id: u64) -> Result<BalanceReport> {
    let candidates: Vec<&str> = match rpc_url {
        Some(url) => vec![url],
        None => PUBLIC_POLYGON_RPCS.to_vec(),
    };

    let mut last_error = None;
    for url in candidates {
        match usdc_balance(url, owner).await {
            Ok(raw) => {
                return Ok(BalanceReport {
                    address: format!("{:#x}", owner),
                    chain_id,
                    usdc_contract: format!("{:#x}", USDC_E),
                    raw_balance: raw.to_string(),
                    balance: from_base_units(raw),
                    rpc_url: url.to_string(),
                })
            }
            Err(e) => {
                warn!("Balance lookup via {} failed: {}", url, e);
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| ClaimError::Chain("no RPC endpoint available".into())))
}

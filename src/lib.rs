pub mod adapters;
pub mod claimer;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod signing;
pub mod validation;

pub use claimer::{ClaimOrchestrator, ClaimRequest, OnchainSettings};
pub use config::AppConfig;
pub use domain::{ClaimReport, SettlementEntry, SettlementPath};
pub use error::{ClaimError, Result};
pub use signing::SigningCredentials;

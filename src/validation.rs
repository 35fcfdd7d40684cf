//! Input validation for caller-supplied identifiers
//!
//! Everything here runs before any network call. Failures are fatal to a
//! claim run and are the only errors `ClaimOrchestrator::orchestrate` returns.

use crate::error::{ClaimError, Result};
use alloy::primitives::Address;
use std::str::FromStr;

/// Trim, ensure a `0x` prefix and lowercase the hex digits.
///
/// No EIP-55 checksum handling; the Data API expects lowercase.
pub fn normalize_address(address: &str) -> String {
    let addr = address.trim();
    if addr.is_empty() {
        return String::new();
    }
    let body = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);
    format!("0x{}", body.to_ascii_lowercase())
}

/// Check an EVM address: `0x` + 40 hex digits after normalization.
pub fn is_valid_evm_address(address: &str) -> bool {
    let addr = normalize_address(address);
    addr.len() == 42 && addr[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate and parse a wallet address
///
/// # Returns
/// * `Ok(Address)` if the input is a well-formed EVM address
/// * `Err(ClaimError::InvalidAddress)` otherwise
pub fn parse_address(address: &str) -> Result<Address> {
    let normalized = normalize_address(address);
    if !is_valid_evm_address(&normalized) {
        return Err(ClaimError::InvalidAddress(format!("{:?}", address)));
    }
    Address::from_str(&normalized).map_err(|e| ClaimError::InvalidAddress(e.to_string()))
}

/// Validate a hex private key and return it with a `0x` prefix.
pub fn normalize_private_key(private_key: &str) -> Result<String> {
    let pk = private_key.trim();
    if pk.is_empty() {
        return Err(ClaimError::Wallet("Private key cannot be empty".to_string()));
    }
    if pk.starts_with("0x") || pk.starts_with("0X") {
        Ok(format!("0x{}", &pk[2..]))
    } else {
        Ok(format!("0x{}", pk))
    }
}

/// Validate a condition id and decode it into 32 bytes.
pub fn parse_condition_id(condition_id: &str) -> Result<[u8; 32]> {
    let hex_part = condition_id
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    let bytes = hex::decode(hex_part)
        .map_err(|e| ClaimError::Validation(format!("Invalid condition id {}: {}", condition_id, e)))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        ClaimError::Validation(format!(
            "Condition id {} has {} bytes, expected 32",
            condition_id,
            b.len()
        ))
    })
}

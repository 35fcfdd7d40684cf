use crate::error::{ClaimError, Result};
use crate::validation::normalize_private_key;
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use tracing::debug;
use zeroize::Zeroize;

/// Signing key used by both settlement paths
///
/// # Security
/// The hex private key is zeroized as soon as the signer is built and is
/// never stored in this struct.
#[derive(Clone)]
pub struct SigningCredentials {
    signer: PrivateKeySigner,
}

impl SigningCredentials {
    /// Create credentials from a hex private key (with or without `0x`)
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let mut secure_key = normalize_private_key(private_key)?;

        let parsed = secure_key
            .parse::<PrivateKeySigner>()
            .map_err(|e| ClaimError::Wallet(format!("Invalid private key: {}", e)));

        secure_key.zeroize();
        let signer = parsed?;

        debug!("Signer initialized: {}", signer.address());
        Ok(Self { signer })
    }

    /// Get the signer address
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Wallet wrapper for alloy providers
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("address", &self.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key, never use with real funds.
    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_credentials_creation() {
        let creds = SigningCredentials::from_private_key(TEST_KEY).unwrap();
        assert_eq!(
            format!("{:?}", creds.address()).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );

        let prefixed = SigningCredentials::from_private_key(&format!("0x{}", TEST_KEY)).unwrap();
        assert_eq!(prefixed.address(), creds.address());
    }

    #[test]
    fn test_invalid_key_is_wallet_error() {
        assert!(matches!(
            SigningCredentials::from_private_key("0x1234"),
            Err(ClaimError::Wallet(_))
        ));
        assert!(matches!(
            SigningCredentials::from_private_key(""),
            Err(ClaimError::Wallet(_))
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let creds = SigningCredentials::from_private_key(TEST_KEY).unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains(TEST_KEY));
    }
}

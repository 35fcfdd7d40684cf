use thiserror::Error;

/// Main error type for the claimer
#[derive(Error, Debug)]
pub enum ClaimError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Input validation errors (fatal, raised before any I/O)
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    // Position lookup errors
    #[error("Data API error: {0}")]
    DataSource(String),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Settlement errors
    #[error("Relayer error: {0}")]
    Relayer(String),

    #[error("Chain error: {0}")]
    Chain(String),

    #[error("Settlement failed: {0}")]
    Settlement(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Signature error: {0}")]
    Signature(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ClaimError {
    /// Errors a caller made before anything touched the network.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ClaimError::InvalidAddress(_) | ClaimError::Validation(_) | ClaimError::Wallet(_)
        )
    }
}

/// Result type alias for ClaimError
pub type Result<T> = std::result::Result<T, ClaimError>;

/// Why a whole settlement path was skipped for a run.
///
/// Distinct from a per-group failure: the path never got as far as
/// looking at a single market.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct PathUnavailable {
    pub reason: String,
}

impl PathUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

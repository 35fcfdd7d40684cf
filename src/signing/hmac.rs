use crate::error::{ClaimError, Result};
use base64::{
    engine::general_purpose::{STANDARD as BASE64, URL_SAFE as BASE64_URL},
    Engine,
};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Builder API credentials used to authenticate against the relayer
#[derive(Clone)]
pub struct BuilderCredentials {
    pub api_key: String,
    pub secret: String,
    pub passphrase: String,
}

impl BuilderCredentials {
    pub fn new(api_key: String, secret: String, passphrase: String) -> Self {
        Self {
            api_key,
            secret,
            passphrase,
        }
    }

    /// All three parts present and non-blank.
    pub fn from_parts(
        api_key: Option<&str>,
        secret: Option<&str>,
        passphrase: Option<&str>,
    ) -> Option<Self> {
        let part = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        Some(Self::new(part(api_key)?, part(secret)?, part(passphrase)?))
    }
}

impl std::fmt::Debug for BuilderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuilderCredentials")
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

/// HMAC authentication helper for builder relayer requests
#[derive(Clone, Debug)]
pub struct BuilderAuth {
    credentials: BuilderCredentials,
}

impl BuilderAuth {
    pub fn new(credentials: BuilderCredentials) -> Self {
        Self { credentials }
    }

    /// Get current timestamp in seconds
    fn timestamp() -> i64 {
        chrono::Utc::now().timestamp()
    }

    /// Secrets are issued url-safe base64; tolerate standard base64 and raw strings.
    fn secret_bytes(&self) -> Vec<u8> {
        let secret = &self.credentials.secret;
        BASE64_URL
            .decode(secret)
            .or_else(|_| BASE64.decode(secret))
            .unwrap_or_else(|_| secret.as_bytes().to_vec())
    }

    /// Create HMAC-SHA256 signature, url-safe base64 encoded
    fn sign(&self, message: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret_bytes())
            .map_err(|e| ClaimError::Signature(format!("HMAC init failed: {}", e)))?;

        mac.update(message.as_bytes());
        Ok(BASE64_URL.encode(mac.finalize().into_bytes()))
    }

    /// Build the message to sign for a request
    fn build_message(method: &str, path: &str, timestamp: i64, body: Option<&str>) -> String {
        match body {
            Some(b) if !b.is_empty() => {
                format!("{}{}{}{}", timestamp, method.to_uppercase(), path, b)
            }
            _ => format!("{}{}{}", timestamp, method.to_uppercase(), path),
        }
    }

    /// Build authentication headers for a request
    pub fn build_headers(&self, method: &str, path: &str, body: Option<&str>) -> Result<HeaderMap> {
        let timestamp = Self::timestamp();
        let message = Self::build_message(method, path, timestamp, body);
        let signature = self.sign(&message)?;

        tracing::debug!(
            "Builder HMAC signing - timestamp: {}, method: {}, path: {}",
            timestamp,
            method,
            path
        );

        let header = |name: &str, value: &str| {
            HeaderValue::from_str(value)
                .map_err(|e| ClaimError::Internal(format!("Invalid {} header: {}", name, e)))
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            "POLY_BUILDER_API_KEY",
            header("api key", &self.credentials.api_key)?,
        );
        headers.insert(
            "POLY_BUILDER_PASSPHRASE",
            header("passphrase", &self.credentials.passphrase)?,
        );
        headers.insert("POLY_BUILDER_SIGNATURE", header("signature", &signature)?);
        headers.insert(
            "POLY_BUILDER_TIMESTAMP",
            header("timestamp", &timestamp.to_string())?,
        );

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> BuilderAuth {
        BuilderAuth::new(BuilderCredentials::new(
            "test-key".to_string(),
            BASE64_URL.encode(b"test-secret"),
            "test-pass".to_string(),
        ))
    }

    #[test]
    fn test_build_message() {
        let msg =
            BuilderAuth::build_message("post", "/submit", 1704067200, Some(r#"{"test":"data"}"#));
        assert_eq!(msg, r#"1704067200POST/submit{"test":"data"}"#);

        let msg_no_body = BuilderAuth::build_message("GET", "/transaction/1", 1704067200, None);
        assert_eq!(msg_no_body, "1704067200GET/transaction/1");
    }

    #[test]
    fn test_sign_is_deterministic_url_safe() {
        let a = auth().sign("message").unwrap();
        let b = auth().sign("message").unwrap();
        assert_eq!(a, b);
        assert!(BASE64_URL.decode(&a).is_ok());
        assert!(!a.contains('+') && !a.contains('/'));
    }

    #[test]
    fn test_build_headers() {
        let headers = auth().build_headers("POST", "/submit", Some("{}")).unwrap();
        assert_eq!(headers["POLY_BUILDER_API_KEY"], "test-key");
        assert_eq!(headers["POLY_BUILDER_PASSPHRASE"], "test-pass");
        assert!(headers.contains_key("POLY_BUILDER_SIGNATURE"));
        assert!(headers.contains_key("POLY_BUILDER_TIMESTAMP"));
    }

    #[test]
    fn test_from_parts_requires_all() {
        assert!(BuilderCredentials::from_parts(Some("k"), Some("s"), Some("p")).is_some());
        assert!(BuilderCredentials::from_parts(Some("k"), None, Some("p")).is_none());
        assert!(BuilderCredentials::from_parts(Some("k"), Some(" "), Some("p")).is_none());
    }
}

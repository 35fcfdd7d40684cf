pub mod hmac;
pub mod wallet;

pub use hmac::{BuilderAuth, BuilderCredentials};
pub use wallet::SigningCredentials;

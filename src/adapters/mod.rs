pub mod chain;
pub mod contracts;
pub mod data_api;
pub mod relayer;

pub use chain::{usdc_balance, RpcChainClient, RpcChainProvider};
pub use data_api::DataApiClient;
pub use relayer::{BuilderRelayerProvider, HttpRelayClient};

//! Configuration module for the scanner
//! Everything comes from the environment; nothing is persisted between runs

use alloy_primitives::Address;
use std::str::FromStr;

use crate::models::{ErrorCode, ScanError, ScanResult};

/// Uniswap V2 Router on Ethereum mainnet (default UNISWAP_ADDRESS)
pub const DEFAULT_ROUTER: &str = "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D";

/// WETH on Ethereum mainnet (default WETH_ADDRESS)
pub const DEFAULT_WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

/// Default local forked-node port (DEBUG_HH_PORT)
pub const DEFAULT_FORK_PORT: u16 = 8545;

/// Scanner configuration, read once at startup
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Upstream chain RPC URL (RPC_ENDPOINT, required)
    pub rpc_endpoint: String,

    /// DEX router used for liquidity seeding and swap probes
    pub router: Address,

    /// Native-currency wrapper contract, first hop of every buy path
    pub weth: Address,

    /// Local port the forked test node listens on
    pub fork_port: u16,

    /// Drain and log the forked node's diagnostic output
    pub verbose_node_logs: bool,
}

impl ScannerConfig {
    /// Load from environment. RPC_ENDPOINT is required; everything else
    /// falls back to mainnet defaults.
    pub fn from_env() -> ScanResult<Self> {
        let rpc_endpoint =
            std::env::var("RPC_ENDPOINT").map_err(|_| ScanError::missing_env("RPC_ENDPOINT"))?;

        let router = parse_address_env("UNISWAP_ADDRESS", DEFAULT_ROUTER)?;
        let weth = parse_address_env("WETH_ADDRESS", DEFAULT_WETH)?;

        let fork_port = match std::env::var("DEBUG_HH_PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|_| {
                ScanError::new(
                    ErrorCode::ConfigInvalidValue,
                    format!("DEBUG_HH_PORT is not a port number: {:?}", raw),
                )
            })?,
            Err(_) => DEFAULT_FORK_PORT,
        };

        let verbose_node_logs = std::env::var("DEBUG_HH_VERBOSE")
            .map(|v| !v.eq_ignore_ascii_case("false"))
            .unwrap_or(false);

        Ok(Self {
            rpc_endpoint,
            router,
            weth,
            fork_port,
            verbose_node_logs,
        })
    }

    /// URL of the forked session once the node is up
    pub fn fork_endpoint(&self) -> String {
        format!("http://127.0.0.1:{}/", self.fork_port)
    }
}

fn parse_address_env(var: &str, default: &str) -> ScanResult<Address> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Address::from_str(&raw).map_err(|_| {
        ScanError::new(
            ErrorCode::ConfigInvalidValue,
            format!("{} is not a valid address: {:?}", var, raw),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_addresses_parse() {
        assert!(Address::from_str(DEFAULT_ROUTER).is_ok());
        assert!(Address::from_str(DEFAULT_WETH).is_ok());
    }

    #[test]
    fn test_fork_endpoint_format() {
        let config = ScannerConfig {
            rpc_endpoint: "http://localhost:1".into(),
            router: Address::from_str(DEFAULT_ROUTER).unwrap(),
            weth: Address::from_str(DEFAULT_WETH).unwrap(),
            fork_port: 9999,
            verbose_node_logs: false,
        };
        assert_eq!(config.fork_endpoint(), "http://127.0.0.1:9999/");
    }
}

//! Scan driver
//!
//! Wires the pipeline end to end: deployment lookup, token metadata,
//! static classification, then the forked-chain simulation. The forked
//! node is stopped on every exit path before results are interpreted.

use tracing::info;

use crate::analysis::{EffectWalker, FunctionClassifier};
use crate::bytecode::{disassemble, FunctionTable};
use crate::config::ScannerConfig;
use crate::fourbyte::SignatureResolver;
use crate::models::{ScanError, ScanResult};
use crate::node::ForkedNode;
use crate::orchestrator::SimulationOrchestrator;
use crate::report;
use crate::rpc::{ChainRpc, RpcClient};
use crate::token;

/// Exact shape of a transaction hash argument: 0x + 64 hex digits
pub fn is_transaction_hash(raw: &str) -> bool {
    raw.len() == 66
        && raw.starts_with("0x")
        && raw[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// One full scan of a deployment transaction
pub struct Scanner {
    config: ScannerConfig,
}

impl Scanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self, tx_hash: &str) -> ScanResult<()> {
        // Upstream chain access.
        let upstream = RpcClient::new(&self.config.rpc_endpoint)?;
        upstream.block_number().await.map_err(|e| {
            ScanError::rpc_connection_failed(format!(
                "unable to connect to the RPC {}: {}",
                self.config.rpc_endpoint, e
            ))
        })?;

        // Deployment transaction and receipt.
        let tx = upstream
            .get_transaction(tx_hash)
            .await?
            .ok_or_else(|| ScanError::tx_not_found(format!("transaction {} not found", tx_hash)))?;
        let receipt = upstream
            .get_transaction_receipt(tx_hash)
            .await?
            .ok_or_else(|| ScanError::tx_not_found(format!("no receipt for {}", tx_hash)))?;
        let token_address = receipt.contract_address.ok_or_else(|| {
            ScanError::tx_not_found(format!("{} is not a deployment transaction", tx_hash))
        })?;
        let deploy_block = receipt.block_number_u64()?;
        info!("token {} deployed at block {}", token_address, deploy_block);

        // Basic token info.
        let token_info = token::fetch_token_info(&upstream, token_address).await?;
        report::print_token_info(&token_info);

        // Static stage: disassemble, recover the table, resolve names.
        let code = upstream.get_code(token_address).await?;
        if code.is_empty() {
            return Err(ScanError::tx_not_found(format!(
                "no runtime code at {}",
                token_address
            )));
        }
        let instructions = disassemble(&code);
        let mut table = FunctionTable::scan(&instructions);
        SignatureResolver::new()?.resolve_all(&mut table).await?;
        report::print_functions(&table);

        let walker = EffectWalker::new(&instructions);
        let candidates = FunctionClassifier::new(&table, &walker).classify()?;
        report::print_candidates("BLACKLIST FUNCTIONS", &candidates.blacklist_control);
        report::print_candidates("TRADING FUNCTIONS", &candidates.trading_control);

        // Dynamic stage on a forked session pinned at the deploy block.
        // The fork client is built first; once the node is up, every exit
        // path below runs through `node.stop()`.
        report::print_dynamic_header();
        let fork = RpcClient::new(self.config.fork_endpoint())?;
        let node = ForkedNode::start(&self.config, deploy_block).await?;

        let mut orchestrator = SimulationOrchestrator::new(&fork, &self.config, token_address);
        let outcome = orchestrator
            .run(&node.accounts, &candidates, &code, tx.from)
            .await;

        // The node always comes down before the outcome is interpreted.
        node.stop().await;

        match outcome {
            Ok(simulation) => report::print_simulation(&simulation),
            Err(e) if !e.code.is_fatal() => {
                // Contract properties, not infrastructure failures: they
                // are the dynamic-testing result.
                report::print_abort(&e.message);
            }
            Err(e) => return Err(e),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_ROUTER, DEFAULT_WETH};

    /// Client construction needs no running node, so it happens before the
    /// node starts and cannot error past the teardown path
    #[test]
    fn test_fork_client_builds_without_a_running_node() {
        let config = ScannerConfig {
            rpc_endpoint: "http://localhost:1".into(),
            router: DEFAULT_ROUTER.parse().unwrap(),
            weth: DEFAULT_WETH.parse().unwrap(),
            fork_port: 8545,
            verbose_node_logs: false,
        };
        assert!(RpcClient::new(config.fork_endpoint()).is_ok());
    }

    #[test]
    fn test_valid_transaction_hash() {
        let hash = "0xfe898b7b3d151929ae8e96745340e4ced6af6695b994403d178584202c6dc44f";
        assert!(is_transaction_hash(hash));
    }

    #[test]
    fn test_invalid_transaction_hashes() {
        assert!(!is_transaction_hash(""));
        assert!(!is_transaction_hash("0x1234"));
        // Right length, wrong prefix
        assert!(!is_transaction_hash(
            "00fe898b7b3d151929ae8e96745340e4ced6af6695b994403d178584202c6dc44f"
        ));
        // Non-hex character
        assert!(!is_transaction_hash(
            "0xge898b7b3d151929ae8e96745340e4ced6af6695b994403d178584202c6dc44f"
        ));
        // 67 chars
        assert!(!is_transaction_hash(
            "0xfe898b7b3d151929ae8e96745340e4ced6af6695b994403d178584202c6dc44f0"
        ));
    }
}

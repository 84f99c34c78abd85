//! Supervised forked test node
//!
//! The forked chain session is a child hardhat process. `start` hands back
//! the generated account pool plus a handle owning both the process and the
//! stdout-draining task; `stop` tears both down in order. The drain task is
//! cancelled through an explicit channel it observes between reads, never a
//! shared flag, and the child is killed on drop as a last resort so no exit
//! path leaks the process.

use alloy_primitives::Address;
use std::path::Path;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ScannerConfig;
use crate::models::{ErrorCode, ScanError, ScanResult};

/// Accounts hardhat generates on startup
const EXPECTED_ACCOUNTS: usize = 20;

/// Give `npx hardhat node` this long to fork and print its accounts
const STARTUP_TIMEOUT_SECS: u64 = 120;

/// Working directory holding the generated hardhat config
const HARDHAT_DIR: &str = "./hardhat";

const CONFIG_TEMPLATE: &str = r#"/** @type import('hardhat/config').HardhatUserConfig */
module.exports = {
  solidity: "0.8.9",
  networks: {
  hardhat: {
    forking: {
      url: "RPC_URL",
      blockNumber: BLOCK_NUMBER
    }
   }
 }
};
"#;

/// Handle over the forked node process and its log-drain task
pub struct ForkedNode {
    child: Child,
    drain: Option<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
    /// Generated test accounts, in the node's fixed order
    pub accounts: Vec<Address>,
}

impl ForkedNode {
    /// Fork the chain at `fork_block` and wait until the node is serving.
    /// Fails with `NodeStartFailed` when the process dies before printing
    /// its account pool.
    pub async fn start(config: &ScannerConfig, fork_block: u64) -> ScanResult<Self> {
        write_config(config, fork_block).await?;

        let mut child = Command::new("npx")
            .args(["hardhat", "node", "--port", &config.fork_port.to_string()])
            .current_dir(HARDHAT_DIR)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ScanError::with_source(ErrorCode::NodeStartFailed, "failed to spawn hardhat", e)
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ScanError::new(ErrorCode::NodeStartFailed, "hardhat stdout not captured")
        })?;
        let mut lines = BufReader::new(stdout).lines();

        let accounts = tokio::time::timeout(
            Duration::from_secs(STARTUP_TIMEOUT_SECS),
            collect_accounts(&mut lines),
        )
        .await
        .map_err(|_| {
            ScanError::new(
                ErrorCode::NodeStartFailed,
                "hardhat node did not come up in time",
            )
        })??;

        info!("forked node up with {} accounts", accounts.len());

        // Hand the pipe to the background drain for the node's lifetime.
        let (shutdown, shutdown_rx) = watch::channel(false);
        let verbose = config.verbose_node_logs;
        let drain = tokio::spawn(drain_output(lines, shutdown_rx, verbose));

        Ok(Self {
            child,
            drain: Some(drain),
            shutdown,
            accounts,
        })
    }

    /// Cooperative teardown: signal the drain task, terminate the child,
    /// join the drain so buffered output is not lost
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);

        if let Err(e) = self.child.start_kill() {
            warn!("forked node already gone: {}", e);
        }
        let _ = self.child.wait().await;

        if let Some(drain) = self.drain.take() {
            let _ = drain.await;
        }
    }
}

/// Parse "Account #n: 0x... (10000 ETH)" startup lines until the full pool
/// is seen
async fn collect_accounts(lines: &mut Lines<BufReader<ChildStdout>>) -> ScanResult<Vec<Address>> {
    let mut accounts = Vec::with_capacity(EXPECTED_ACCOUNTS);

    while accounts.len() < EXPECTED_ACCOUNTS {
        let line = lines.next_line().await?.ok_or_else(|| {
            ScanError::new(
                ErrorCode::NodeStartFailed,
                "hardhat exited before printing its accounts",
            )
        })?;
        if let Some(address) = parse_account_line(&line) {
            accounts.push(address);
        }
    }

    Ok(accounts)
}

fn parse_account_line(line: &str) -> Option<Address> {
    if !line.starts_with("Account #") {
        return None;
    }
    let after_colon = line.split(": ").nth(1)?;
    let token = after_colon.split_whitespace().next()?;
    Address::from_str(token).ok()
}

/// Drain the node's diagnostic output until cancelled or EOF. Draining is
/// unconditional (a full pipe stalls the node); logging is gated on
/// DEBUG_HH_VERBOSE.
async fn drain_output(
    mut lines: Lines<BufReader<ChildStdout>>,
    mut shutdown: watch::Receiver<bool>,
    verbose: bool,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if verbose {
                        debug!(target: "hardhat", "{}", line);
                    }
                }
                Ok(None) | Err(_) => break,
            },
        }
    }
}

async fn write_config(config: &ScannerConfig, fork_block: u64) -> ScanResult<()> {
    let rendered = CONFIG_TEMPLATE
        .replace("RPC_URL", &config.rpc_endpoint)
        .replace("BLOCK_NUMBER", &fork_block.to_string());

    if !Path::new(HARDHAT_DIR).exists() {
        tokio::fs::create_dir_all(HARDHAT_DIR).await?;
    }
    tokio::fs::write(format!("{}/hardhat.config.js", HARDHAT_DIR), rendered).await?;
    Ok(())
}

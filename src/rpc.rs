//! JSON-RPC client
//!
//! One thin client serves both the upstream chain endpoint and the forked
//! test node: the fork control-plane methods (hardhat_* / evm_*) are plain
//! JSON-RPC calls against the local session. Reads retry with exponential
//! backoff; mutating calls never retry, a revert must surface exactly once.

use alloy_primitives::{Address, U256};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

use crate::models::{ErrorCode, ScanError, ScanResult};

/// Maximum retry attempts for read calls
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds)
const BASE_RETRY_DELAY_MS: u64 = 100;

/// Receipt polling interval while a transaction is being mined
const RECEIPT_POLL_MS: u64 = 100;

/// Receipt polling attempts before giving up
const RECEIPT_POLL_LIMIT: u32 = 100;

/// Deployment transaction, the fields the scanner needs
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionView {
    pub from: Address,
}

/// Deployment receipt, the fields the scanner needs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptView {
    pub contract_address: Option<Address>,
    pub block_number: String,
}

impl ReceiptView {
    /// Receipt block number decoded from its hex quantity
    pub fn block_number_u64(&self) -> ScanResult<u64> {
        parse_quantity(&self.block_number)
    }
}

/// The chain surface the simulation drives. Production traffic goes
/// through `RpcClient`; tests script a fork behind the same seam.
#[allow(async_fn_in_trait)]
pub trait ChainRpc {
    async fn block_number(&self) -> ScanResult<u64>;
    async fn eth_call(&self, to: Address, data: &[u8]) -> ScanResult<Vec<u8>>;
    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: &[u8],
        value: U256,
    ) -> ScanResult<String>;
    async fn wait_for_receipt(&self, tx_hash: &str) -> ScanResult<()>;
    async fn set_balance(&self, address: Address, wei: U256) -> ScanResult<()>;
    async fn impersonate(&self, address: Address) -> ScanResult<()>;
    async fn stop_impersonating(&self, address: Address) -> ScanResult<()>;
    async fn set_code(&self, address: Address, code: &[u8]) -> ScanResult<()>;
    async fn set_automine(&self, enabled: bool) -> ScanResult<()>;
    async fn mine_blocks(&self, blocks: u64) -> ScanResult<()>;
}

/// JSON-RPC client over HTTP
#[derive(Clone)]
pub struct RpcClient {
    url: String,
    client: reqwest::Client,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> ScanResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ScanError::from)?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    // ============================================
    // Core call plumbing
    // ============================================

    async fn execute(&self, method: &str, params: Value) -> ScanResult<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::new(
                ErrorCode::RpcError,
                format!("HTTP {} from {}", status, self.url),
            ));
        }

        let body: RpcResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(ScanError::new(
                ErrorCode::RpcError,
                format!("{} failed: {} (code {})", method, error.message, error.code),
            ));
        }

        Ok(body.result.unwrap_or(Value::Null))
    }

    /// Single-shot call, null result is an error. Used for mutations.
    pub async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Value,
    ) -> ScanResult<T> {
        let value = self.execute(method, params).await?;
        if value.is_null() {
            return Err(ScanError::new(
                ErrorCode::RpcInvalidResponse,
                format!("{} returned null", method),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Single-shot call where a null result is a valid answer
    pub async fn call_opt<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Value,
    ) -> ScanResult<Option<T>> {
        let value = self.execute(method, params).await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Read call with exponential backoff retry
    pub async fn call_retry<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Value,
    ) -> ScanResult<T> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = BASE_RETRY_DELAY_MS * (2_u64.pow(attempt - 1));
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            match self.call(method, params.clone()).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!(
                        "{} attempt {}/{} failed: {}",
                        method,
                        attempt + 1,
                        MAX_RETRIES,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ScanError::new(ErrorCode::Unknown, "retry loop fell through")))
    }

    // ============================================
    // Chain reads
    // ============================================

    pub async fn get_transaction(&self, tx_hash: &str) -> ScanResult<Option<TransactionView>> {
        self.call_opt("eth_getTransactionByHash", json!([tx_hash]))
            .await
    }

    pub async fn get_transaction_receipt(&self, tx_hash: &str) -> ScanResult<Option<ReceiptView>> {
        self.call_opt("eth_getTransactionReceipt", json!([tx_hash]))
            .await
    }

    /// Deployed runtime code at an address
    pub async fn get_code(&self, address: Address) -> ScanResult<Vec<u8>> {
        let raw: String = self
            .call_retry("eth_getCode", json!([address, "latest"]))
            .await?;
        decode_hex_blob(&raw)
    }

    /// Control-plane call where the node may answer null or true; only the
    /// absence of an error matters
    async fn call_void(&self, method: &str, params: Value) -> ScanResult<()> {
        self.execute(method, params).await.map(|_| ())
    }
}

impl ChainRpc for RpcClient {
    /// eth_blockNumber, doubles as the connectivity probe
    async fn block_number(&self) -> ScanResult<u64> {
        let raw: String = self.call("eth_blockNumber", json!([])).await?;
        parse_quantity(&raw)
    }

    /// eth_call, returns raw ABI-encoded output
    async fn eth_call(&self, to: Address, data: &[u8]) -> ScanResult<Vec<u8>> {
        let raw: String = self
            .call(
                "eth_call",
                json!([{ "to": to, "data": hex_blob(data) }, "latest"]),
            )
            .await?;
        decode_hex_blob(&raw)
    }

    /// eth_sendTransaction from an unlocked/impersonated account.
    /// A revert surfaces as an RPC error from gas estimation; callers that
    /// probe for dead blocks treat that error as a state transition.
    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: &[u8],
        value: U256,
    ) -> ScanResult<String> {
        self.call(
            "eth_sendTransaction",
            json!([{
                "from": from,
                "to": to,
                "data": hex_blob(data),
                "value": hex_quantity(value),
            }]),
        )
        .await
    }

    /// Block until a transaction has a receipt
    async fn wait_for_receipt(&self, tx_hash: &str) -> ScanResult<()> {
        for _ in 0..RECEIPT_POLL_LIMIT {
            if self
                .call_opt::<Value>("eth_getTransactionReceipt", json!([tx_hash]))
                .await?
                .is_some()
            {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(RECEIPT_POLL_MS)).await;
        }
        Err(ScanError::new(
            ErrorCode::RpcError,
            format!("no receipt for {} after polling", tx_hash),
        ))
    }

    // ============================================
    // Fork control plane
    // ============================================

    async fn set_balance(&self, address: Address, wei: U256) -> ScanResult<()> {
        self.call_void("hardhat_setBalance", json!([address, hex_quantity(wei)]))
            .await
    }

    async fn impersonate(&self, address: Address) -> ScanResult<()> {
        self.call_void("hardhat_impersonateAccount", json!([address]))
            .await
    }

    async fn stop_impersonating(&self, address: Address) -> ScanResult<()> {
        self.call_void("hardhat_stopImpersonatingAccount", json!([address]))
            .await
    }

    /// Re-plant the token's runtime code into the forked session
    async fn set_code(&self, address: Address, code: &[u8]) -> ScanResult<()> {
        self.call_void("hardhat_setCode", json!([address, hex_blob(code)]))
            .await
    }

    async fn set_automine(&self, enabled: bool) -> ScanResult<()> {
        self.call_void("evm_setAutomine", json!([enabled])).await
    }

    /// Force-advance the chain by `blocks`
    async fn mine_blocks(&self, blocks: u64) -> ScanResult<()> {
        self.call_void("hardhat_mine", json!([format!("0x{:x}", blocks)]))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Decode a 0x-prefixed hex quantity
pub fn parse_quantity(raw: &str) -> ScanResult<u64> {
    let trimmed = raw.trim_start_matches("0x");
    u64::from_str_radix(trimmed, 16).map_err(|_| {
        ScanError::new(
            ErrorCode::RpcInvalidResponse,
            format!("not a hex quantity: {:?}", raw),
        )
    })
}

fn hex_blob(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn hex_quantity(value: U256) -> String {
    format!("0x{:x}", value)
}

fn decode_hex_blob(raw: &str) -> ScanResult<Vec<u8>> {
    hex::decode(raw.trim_start_matches("0x")).map_err(|e| {
        ScanError::with_source(ErrorCode::RpcInvalidResponse, "invalid hex in response", e)
    })
}

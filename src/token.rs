//! Basic token metadata
//!
//! Fetches name / symbol / decimals / supply plus the balances parked at
//! the two canonical burn addresses, issued as one concurrent batch before
//! any simulation starts.

use alloy_primitives::{address, Address, U256};
use alloy_sol_types::{sol, SolCall};

use crate::models::{ErrorCode, ScanError, ScanResult, TokenInfo};
use crate::rpc::ChainRpc;

/// Conventional burn address
pub const DEAD_ADDRESS: Address = address!("000000000000000000000000000000000000dEaD");

/// The zero address, the other conventional burn target
pub const NULL_ADDRESS: Address = Address::ZERO;

sol! {
    function name() external view returns (string);
    function symbol() external view returns (string);
    function decimals() external view returns (uint8);
    function totalSupply() external view returns (uint256);
    function balanceOf(address account) external view returns (uint256);
}

/// Fetch token metadata with one batched round of eth_calls.
/// Total burnt = balance(dead) + balance(zero).
pub async fn fetch_token_info<R: ChainRpc>(client: &R, token: Address) -> ScanResult<TokenInfo> {
    let name_data = nameCall {}.abi_encode();
    let symbol_data = symbolCall {}.abi_encode();
    let decimals_data = decimalsCall {}.abi_encode();
    let total_supply_data = totalSupplyCall {}.abi_encode();
    let dead_balance_data = balanceOfCall { account: DEAD_ADDRESS }.abi_encode();
    let null_balance_data = balanceOfCall { account: NULL_ADDRESS }.abi_encode();
    let (name, symbol, decimals, total_supply, dead_balance, null_balance) = tokio::join!(
        client.eth_call(token, &name_data),
        client.eth_call(token, &symbol_data),
        client.eth_call(token, &decimals_data),
        client.eth_call(token, &total_supply_data),
        client.eth_call(token, &dead_balance_data),
        client.eth_call(token, &null_balance_data),
    );

    let name = decode_string(&name?)?;
    let symbol = decode_string(&symbol?)?;
    let decimals = decode_u256(&decimals?)?
        .try_into()
        .map_err(|_| ScanError::new(ErrorCode::RpcInvalidResponse, "decimals out of range"))?;
    let total_supply = decode_u256(&total_supply?)?;
    let total_burnt = decode_u256(&dead_balance?)?.saturating_add(decode_u256(&null_balance?)?);

    Ok(TokenInfo {
        name,
        symbol,
        decimals,
        total_supply,
        total_burnt,
    })
}

/// Deployer token balance on the forked session
pub async fn balance_of<R: ChainRpc>(
    client: &R,
    token: Address,
    holder: Address,
) -> ScanResult<U256> {
    let out = client
        .eth_call(token, &balanceOfCall { account: holder }.abi_encode())
        .await?;
    decode_u256(&out)
}

/// Decode a solo ABI string return
fn decode_string(data: &[u8]) -> ScanResult<String> {
    // offset word, length word, then the bytes
    if data.len() < 64 {
        return Ok(String::new());
    }
    let len: usize = U256::from_be_slice(&data[32..64])
        .try_into()
        .map_err(|_| ScanError::new(ErrorCode::RpcInvalidResponse, "string length overflow"))?;
    let start = 64;
    let end = start + len;
    if data.len() < end {
        return Err(ScanError::new(
            ErrorCode::RpcInvalidResponse,
            "truncated string return",
        ));
    }
    String::from_utf8(data[start..end].to_vec())
        .map_err(|e| ScanError::with_source(ErrorCode::RpcInvalidResponse, "non-utf8 string", e))
}

/// Decode a solo ABI uint return
fn decode_u256(data: &[u8]) -> ScanResult<U256> {
    if data.len() < 32 {
        return Err(ScanError::new(
            ErrorCode::RpcInvalidResponse,
            "short uint return",
        ));
    }
    Ok(U256::from_be_slice(&data[..32]))
}

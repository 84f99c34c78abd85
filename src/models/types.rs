//! Type definitions for the scanner
//! Core data structures shared between static analysis and simulation

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// One effect observed while symbolically walking a function body.
///
/// The walk records instruction categories, not values; a trace is a
/// structured effect collection, never matched against its textual
/// rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectTag {
    /// SLOAD
    StorageRead,
    /// SSTORE - a persistent storage write
    StorageWrite,
    /// CALL / CALLCODE / DELEGATECALL / STATICCALL
    ExternalCall,
    /// CREATE / CREATE2
    ContractCreate,
    /// LOG0..LOG4
    Log,
}

/// Ordered effects produced by one symbolic walk of a function body.
/// Re-derivable from the bytecode at any time, so never cached across runs.
#[derive(Debug, Clone, Default)]
pub struct TraceRecord {
    pub effects: Vec<EffectTag>,
}

impl TraceRecord {
    /// True iff the walk reached a persistent storage write
    pub fn writes_storage(&self) -> bool {
        self.effects.contains(&EffectTag::StorageWrite)
    }

    /// True iff the walk reached an external call
    pub fn makes_external_call(&self) -> bool {
        self.effects.contains(&EffectTag::ExternalCall)
    }
}

/// Classification category for a public function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Gates trading on/off (openTrading, enableTrading, ...)
    TradingControl,
    /// Blacklists addresses (setBots, blacklist, ...)
    BlacklistControl,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::TradingControl => "trading-control",
            Category::BlacklistControl => "blacklist-control",
        }
    }
}

/// Derived, read-only view of one classified function.
///
/// The storage/call flags are facts about immutable bytecode; once computed
/// for a deployment they never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// 4-byte selector from the dispatcher
    pub selector: [u8; 4],
    /// Resolved human name, e.g. "openTrading()"
    pub name: String,
    /// Payability of the prologue (heuristic, mismatch defaults payable)
    pub is_payable: bool,
    /// Trace reached SSTORE
    pub uses_storage: bool,
    /// Trace reached an external call (add-liquidity shaped)
    pub calls_liquidity_router: bool,
}

impl Candidate {
    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }
}

/// Candidate sets in function-table order. The first trading-control entry
/// is treated as canonical: only one trading-control function is ever
/// exercised by the simulation.
#[derive(Debug, Clone, Default)]
pub struct CandidateSets {
    pub trading_control: Vec<Candidate>,
    pub blacklist_control: Vec<Candidate>,
}

impl CandidateSets {
    /// The canonical trading-enable function, if any was detected
    pub fn canonical_trading(&self) -> Option<&Candidate> {
        self.trading_control.first()
    }
}

/// Basic ERC20 metadata fetched before any simulation
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    /// Sum of balances held at the two canonical burn addresses
    pub total_burnt: U256,
}

impl TokenInfo {
    /// Human units, truncated to the token's decimals
    pub fn to_units(&self, raw: U256) -> f64 {
        let raw: u128 = raw.try_into().unwrap_or(u128::MAX);
        raw as f64 / 10f64.powi(self.decimals as i32)
    }
}

/// How liquidity got into the pool during simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquiditySource {
    /// Seeded directly via the router's addLiquidityETH
    Router,
    /// The trading-enable call wires up the pool itself
    TradingFunction,
}

impl LiquiditySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiquiditySource::Router => "Uniswap router",
            LiquiditySource::TradingFunction => "trading-enable function",
        }
    }
}

/// Final outcome of the dynamic-testing state machine
#[derive(Debug, Clone)]
pub enum SimulationReport {
    /// A probe succeeded; fee and dead blocks were measured
    Succeeded {
        liquidity: LiquiditySource,
        dead_blocks: u64,
        fee_percent: u64,
    },
    /// Every probe account reverted - reported, not fatal
    Exhausted {
        liquidity: LiquiditySource,
        dead_blocks: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_flags() {
        let trace = TraceRecord {
            effects: vec![EffectTag::StorageRead, EffectTag::StorageWrite],
        };
        assert!(trace.writes_storage());
        assert!(!trace.makes_external_call());

        let empty = TraceRecord::default();
        assert!(!empty.writes_storage());
    }

    #[test]
    fn test_canonical_trading_is_first() {
        let mk = |name: &str| Candidate {
            selector: [0; 4],
            name: name.to_string(),
            is_payable: false,
            uses_storage: true,
            calls_liquidity_router: false,
        };
        let sets = CandidateSets {
            trading_control: vec![mk("openTrading()"), mk("enableTrading()")],
            blacklist_control: vec![],
        };
        assert_eq!(sets.canonical_trading().unwrap().name, "openTrading()");
    }

    #[test]
    fn test_token_units() {
        let info = TokenInfo {
            name: "Test".into(),
            symbol: "TST".into(),
            decimals: 9,
            total_supply: U256::from(1_000_000_000u64),
            total_burnt: U256::ZERO,
        };
        assert!((info.to_units(info.total_supply) - 1.0).abs() < 1e-9);
    }
}

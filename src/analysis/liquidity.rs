//! Liquidity call detection
//!
//! Distinguishes "this function wires up the DEX pool itself" from
//! "liquidity must be seeded externally". A trading-enable function that
//! performs an external call is treated as an add-liquidity router
//! invocation; plain flag flips never leave the contract.

use crate::analysis::EffectWalker;
use crate::bytecode::FunctionTable;
use crate::models::{ScanError, ScanResult};

/// Reports whether a function body performs an external call
pub struct LiquidityCallDetector<'a> {
    table: &'a FunctionTable,
    walker: &'a EffectWalker<'a>,
}

impl<'a> LiquidityCallDetector<'a> {
    pub fn new(table: &'a FunctionTable, walker: &'a EffectWalker<'a>) -> Self {
        Self { table, walker }
    }

    /// True iff the function's effect trace contains an external call
    pub fn uses_liquidity_router(&self, selector: [u8; 4]) -> ScanResult<bool> {
        let entry = self
            .table
            .entry_for(selector)
            .ok_or_else(|| ScanError::unknown_selector(selector))?;
        Ok(self.walker.walk(entry).makes_external_call())
    }
}

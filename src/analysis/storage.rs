//! Storage usage analysis
//!
//! A trading-control name alone is weak evidence; a reachable SSTORE is
//! what separates a real "trading enabled" flag flip from a no-op or
//! log-only function.

use crate::analysis::EffectWalker;
use crate::bytecode::FunctionTable;
use crate::models::{ScanError, ScanResult};

/// Reports whether a function body can reach a persistent storage write
pub struct StorageUsageAnalyzer<'a> {
    table: &'a FunctionTable,
    walker: &'a EffectWalker<'a>,
}

impl<'a> StorageUsageAnalyzer<'a> {
    pub fn new(table: &'a FunctionTable, walker: &'a EffectWalker<'a>) -> Self {
        Self { table, walker }
    }

    /// True iff the function's effect trace contains a storage write.
    /// Deterministic for a given code image. A selector missing from the
    /// function table is an internal inconsistency and aborts the run.
    pub fn analyze(&self, selector: [u8; 4]) -> ScanResult<bool> {
        let entry = self
            .table
            .entry_for(selector)
            .ok_or_else(|| ScanError::unknown_selector(selector))?;
        Ok(self.walker.walk(entry).writes_storage())
    }
}

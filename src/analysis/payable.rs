//! Payability analysis
//!
//! Solc emits the same non-payable guard at the top of every non-payable
//! function: read the call value, duplicate it, test it for zero, revert on
//! the non-zero branch. We match that exact 3-instruction prologue after
//! the entry JUMPDEST. This is a syntactic check, not a semantic proof:
//! a compiler emitting an equivalent but reordered guard will be reported
//! payable, which is the safe direction for the simulation (it attaches
//! value only when payable).

use crate::analysis::EffectWalker;
use crate::bytecode::{opcode, FunctionTable};
use crate::models::{ScanError, ScanResult};

/// Classifies function prologues as payable / non-payable
pub struct PayabilityAnalyzer<'a> {
    table: &'a FunctionTable,
    walker: &'a EffectWalker<'a>,
}

impl<'a> PayabilityAnalyzer<'a> {
    pub fn new(table: &'a FunctionTable, walker: &'a EffectWalker<'a>) -> Self {
        Self { table, walker }
    }

    /// False iff the three instructions after the entry jump target are
    /// exactly CALLVALUE, DUPn, ISZERO. Any deviation, including a missing
    /// guard, classifies the function payable.
    pub fn is_payable(&self, selector: [u8; 4]) -> ScanResult<bool> {
        let entry = self
            .table
            .entry_for(selector)
            .ok_or_else(|| ScanError::unknown_selector(selector))?;

        let body = self.walker.instructions_from(entry);
        // body[0] is the entry JUMPDEST; the guard occupies the next three
        let guard_matches = body.len() >= 4
            && body[1].opcode == opcode::CALLVALUE
            && opcode::is_dup(body[2].opcode)
            && body[3].opcode == opcode::ISZERO;

        Ok(!guard_matches)
    }
}

//! Forward symbolic effect walker
//!
//! Walks a function body from its entry JUMPDEST and records which
//! instruction categories it can reach. This is a control/effect trace, not
//! full symbolic execution: no stack values are resolved, only statically
//! known jump targets (PUSH immediately before JUMP/JUMPI) are followed,
//! and both edges of every conditional are explored. A visited set bounds
//! the walk, so loops terminate.

use std::collections::{HashMap, HashSet};

use crate::bytecode::{opcode, Instruction};
use crate::models::{EffectTag, TraceRecord};

/// Shared walker over one disassembled code image.
/// Traces are re-derived per request and never cached across runs.
pub struct EffectWalker<'a> {
    instructions: &'a [Instruction],
    /// Byte offset -> index into `instructions`
    offset_index: HashMap<usize, usize>,
}

impl<'a> EffectWalker<'a> {
    pub fn new(instructions: &'a [Instruction]) -> Self {
        let offset_index = instructions
            .iter()
            .enumerate()
            .map(|(i, inst)| (inst.offset, i))
            .collect();
        Self {
            instructions,
            offset_index,
        }
    }

    /// Instructions from a byte offset onward, empty when the offset does
    /// not land on an instruction boundary
    pub fn instructions_from(&self, offset: usize) -> &'a [Instruction] {
        match self.offset_index.get(&offset) {
            Some(&i) => &self.instructions[i..],
            None => &[],
        }
    }

    /// Walk from `entry_offset`, collecting effect tags in visit order.
    /// An unmapped entry yields an empty trace; presence of the selector in
    /// the function table is the caller's responsibility.
    pub fn walk(&self, entry_offset: usize) -> TraceRecord {
        let mut effects = Vec::new();
        let mut visited: HashSet<usize> = HashSet::new();
        let mut worklist: Vec<usize> = Vec::new();

        if let Some(&start) = self.offset_index.get(&entry_offset) {
            worklist.push(start);
        }

        while let Some(mut idx) = worklist.pop() {
            while idx < self.instructions.len() {
                if !visited.insert(idx) {
                    break;
                }
                let inst = &self.instructions[idx];
                let op = inst.opcode;

                if let Some(tag) = effect_of(op) {
                    effects.push(tag);
                }

                if opcode::is_terminator(op) {
                    break;
                }

                if op == opcode::JUMP {
                    if let Some(target) = self.static_target(idx) {
                        worklist.push(target);
                    }
                    break;
                }

                if op == opcode::JUMPI {
                    if let Some(target) = self.static_target(idx) {
                        worklist.push(target);
                    }
                    // fall through to the not-taken edge
                }

                idx += 1;
            }
        }

        TraceRecord { effects }
    }

    /// Jump target when the instruction right before the jump is a PUSH of
    /// a valid JUMPDEST offset
    fn static_target(&self, jump_idx: usize) -> Option<usize> {
        let push = self.instructions.get(jump_idx.checked_sub(1)?)?;
        if !opcode::is_push(push.opcode) {
            return None;
        }
        let dest = push.push_target()?;
        let &idx = self.offset_index.get(&dest)?;
        if self.instructions[idx].opcode == opcode::JUMPDEST {
            Some(idx)
        } else {
            None
        }
    }
}

/// Effect category of an opcode, None for pure stack/arithmetic traffic
fn effect_of(op: u8) -> Option<EffectTag> {
    if op == opcode::SLOAD {
        Some(EffectTag::StorageRead)
    } else if op == opcode::SSTORE {
        Some(EffectTag::StorageWrite)
    } else if opcode::is_call(op) {
        Some(EffectTag::ExternalCall)
    } else if opcode::is_create(op) {
        Some(EffectTag::ContractCreate)
    } else if opcode::is_log(op) {
        Some(EffectTag::Log)
    } else {
        None
    }
}

//! Public function table recovery
//!
//! Recovers dispatchable entry points from the solc dispatcher shape:
//! `DUP1 PUSH4 <selector> EQ PUSHn <dest> JUMPI`. Declaration order is the
//! dispatcher comparison order and is preserved; every downstream ordering
//! (classification, canonical trading candidate) derives from it.

use crate::bytecode::{opcode, Instruction};

/// One dispatchable entry point discovered in the jump table.
/// `name` is populated lazily by the signature resolver; an unresolved
/// selector is a valid state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub selector: [u8; 4],
    pub entry_offset: usize,
    pub name: Option<String>,
}

impl Function {
    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }

    /// Resolved name, or a placeholder for unresolved selectors
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unresolved>")
    }
}

/// Ordered public function table plus the reserved fallback destination.
/// The fallback is printed but never classified.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    pub functions: Vec<Function>,
    pub fallback_offset: Option<usize>,
}

impl FunctionTable {
    /// Scan the dispatcher for `PUSH4 sel .. EQ .. PUSHn dest JUMPI`
    /// comparison chains. Duplicate selectors keep the first occurrence
    /// (selector uniqueness invariant).
    pub fn scan(instructions: &[Instruction]) -> Self {
        let mut functions: Vec<Function> = Vec::new();
        let mut last_dispatch_end = None;

        for (i, inst) in instructions.iter().enumerate() {
            if inst.opcode != opcode::PUSH4 || inst.push_data.len() != 4 {
                continue;
            }

            // Selector comparison sits within the next three instructions:
            // EQ directly, or via an interleaved DUP.
            let window = &instructions[i + 1..(i + 4).min(instructions.len())];
            let Some(eq_pos) = window.iter().position(|w| w.opcode == opcode::EQ) else {
                continue;
            };

            // Jump to the function body: PUSHn dest, JUMPI
            let after_eq = i + 1 + eq_pos + 1;
            let Some(push) = instructions.get(after_eq) else {
                continue;
            };
            let Some(jumpi) = instructions.get(after_eq + 1) else {
                continue;
            };
            if !opcode::is_push(push.opcode) || jumpi.opcode != opcode::JUMPI {
                continue;
            }
            let Some(dest) = push.push_target() else {
                continue;
            };

            let selector: [u8; 4] = inst.push_data[..4].try_into().unwrap_or_default();
            if functions.iter().any(|f| f.selector == selector) {
                continue;
            }

            functions.push(Function {
                selector,
                entry_offset: dest,
                name: None,
            });
            last_dispatch_end = Some(after_eq + 2);
        }

        // Fall-through after the last comparison commonly jumps straight to
        // the fallback block.
        let fallback_offset = last_dispatch_end.and_then(|idx| {
            let push = instructions.get(idx)?;
            let jump = instructions.get(idx + 1)?;
            if opcode::is_push(push.opcode) && jump.opcode == opcode::JUMP {
                push.push_target()
            } else {
                None
            }
        });

        Self {
            functions,
            fallback_offset,
        }
    }

    /// Entry offset for a selector, None when the table has no such entry
    pub fn entry_for(&self, selector: [u8; 4]) -> Option<usize> {
        self.functions
            .iter()
            .find(|f| f.selector == selector)
            .map(|f| f.entry_offset)
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::disassemble;

    /// DUP1 PUSH4 sel EQ PUSH2 dest JUMPI
    fn dispatch_entry(sel: [u8; 4], dest: u16) -> Vec<u8> {
        let mut code = vec![0x80, 0x63];
        code.extend_from_slice(&sel);
        code.push(0x14); // EQ
        code.push(0x61); // PUSH2
        code.extend_from_slice(&dest.to_be_bytes());
        code.push(0x57); // JUMPI
        code
    }

    #[test]
    fn test_scan_preserves_dispatch_order() {
        let mut code = Vec::new();
        code.extend(dispatch_entry([0x06, 0xfd, 0xde, 0x03], 0x100)); // name()
        code.extend(dispatch_entry([0xa9, 0x05, 0x9c, 0xbb], 0x200)); // transfer(address,uint256)
        let table = FunctionTable::scan(&disassemble(&code));

        assert_eq!(table.len(), 2);
        assert_eq!(table.functions[0].selector, [0x06, 0xfd, 0xde, 0x03]);
        assert_eq!(table.functions[0].entry_offset, 0x100);
        assert_eq!(table.functions[1].entry_offset, 0x200);
    }

    #[test]
    fn test_duplicate_selector_keeps_first() {
        let mut code = Vec::new();
        code.extend(dispatch_entry([0xaa, 0xbb, 0xcc, 0xdd], 0x10));
        code.extend(dispatch_entry([0xaa, 0xbb, 0xcc, 0xdd], 0x20));
        let table = FunctionTable::scan(&disassemble(&code));

        assert_eq!(table.len(), 1);
        assert_eq!(table.functions[0].entry_offset, 0x10);
    }

    #[test]
    fn test_fallback_tail_jump() {
        let mut code = Vec::new();
        code.extend(dispatch_entry([0x01, 0x02, 0x03, 0x04], 0x40));
        // PUSH2 0x0300 JUMP - fall-through to fallback
        code.extend([0x61, 0x03, 0x00, 0x56]);
        let table = FunctionTable::scan(&disassemble(&code));

        assert_eq!(table.fallback_offset, Some(0x300));
    }

    #[test]
    fn test_entry_lookup() {
        let code = dispatch_entry([0x11, 0x22, 0x33, 0x44], 0x80);
        let table = FunctionTable::scan(&disassemble(&code));

        assert_eq!(table.entry_for([0x11, 0x22, 0x33, 0x44]), Some(0x80));
        assert_eq!(table.entry_for([0x00, 0x00, 0x00, 0x00]), None);
    }
}

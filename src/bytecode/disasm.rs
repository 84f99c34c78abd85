//! Linear-sweep disassembler

use crate::bytecode::opcode;

/// One decoded EVM instruction, immutable once produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Byte offset in the code image
    pub offset: usize,
    /// Raw opcode byte
    pub opcode: u8,
    /// PUSH operand bytes, empty for everything else
    pub push_data: Vec<u8>,
}

impl Instruction {
    /// PUSH operand interpreted as a big-endian jump target.
    /// None for non-PUSH instructions or operands wider than usize.
    pub fn push_target(&self) -> Option<usize> {
        if self.push_data.is_empty() || self.push_data.len() > 8 {
            return None;
        }
        let mut value: usize = 0;
        for b in &self.push_data {
            value = value.checked_shl(8)?.checked_add(*b as usize)?;
        }
        Some(value)
    }
}

/// Decode a full code image into an instruction sequence.
///
/// Data trailing a truncated PUSH at the end of the image is tolerated: the
/// operand is cut short rather than the whole decode failing, matching how
/// deployed contracts append metadata after the runtime code.
pub fn disassemble(code: &[u8]) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let mut offset = 0;

    while offset < code.len() {
        let op = code[offset];
        let operand_len = opcode::push_size(op);
        let start = offset + 1;
        let end = (start + operand_len).min(code.len());

        instructions.push(Instruction {
            offset,
            opcode: op,
            push_data: code[start..end].to_vec(),
        });

        offset = end;
    }

    instructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::opcode::*;

    #[test]
    fn test_disassemble_push_operands() {
        // PUSH1 0x80 PUSH1 0x40 MSTORE
        let code = [0x60, 0x80, 0x60, 0x40, 0x52];
        let instructions = disassemble(&code);
        assert_eq!(instructions.len(), 3);
        assert_eq!(instructions[0].push_data, vec![0x80]);
        assert_eq!(instructions[1].offset, 2);
        assert_eq!(instructions[2].opcode, 0x52);
    }

    #[test]
    fn test_truncated_trailing_push() {
        // PUSH4 with only 2 operand bytes available
        let code = [PUSH4, 0xde, 0xad];
        let instructions = disassemble(&code);
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].push_data, vec![0xde, 0xad]);
    }

    #[test]
    fn test_push_target() {
        let code = [0x61, 0x01, 0x23]; // PUSH2 0x0123
        let instructions = disassemble(&code);
        assert_eq!(instructions[0].push_target(), Some(0x0123));

        let stop = Instruction {
            offset: 0,
            opcode: STOP,
            push_data: vec![],
        };
        assert_eq!(stop.push_target(), None);
    }
}

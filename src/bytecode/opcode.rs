//! EVM opcode constants and category helpers

pub const STOP: u8 = 0x00;
pub const ISZERO: u8 = 0x15;
pub const EQ: u8 = 0x14;
pub const CALLVALUE: u8 = 0x34;
pub const SLOAD: u8 = 0x54;
pub const SSTORE: u8 = 0x55;
pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const JUMPDEST: u8 = 0x5b;
pub const PUSH0: u8 = 0x5f;
pub const PUSH1: u8 = 0x60;
pub const PUSH4: u8 = 0x63;
pub const PUSH32: u8 = 0x7f;
pub const DUP1: u8 = 0x80;
pub const DUP16: u8 = 0x8f;
pub const LOG0: u8 = 0xa0;
pub const LOG4: u8 = 0xa4;
pub const CREATE: u8 = 0xf0;
pub const CALL: u8 = 0xf1;
pub const CALLCODE: u8 = 0xf2;
pub const RETURN: u8 = 0xf3;
pub const DELEGATECALL: u8 = 0xf4;
pub const CREATE2: u8 = 0xf5;
pub const STATICCALL: u8 = 0xfa;
pub const REVERT: u8 = 0xfd;
pub const INVALID: u8 = 0xfe;
pub const SELFDESTRUCT: u8 = 0xff;

/// PUSH1..PUSH32 (PUSH0 carries no operand)
#[inline]
pub fn is_push(op: u8) -> bool {
    (PUSH1..=PUSH32).contains(&op)
}

/// Operand length for a PUSH opcode, 0 for anything else
#[inline]
pub fn push_size(op: u8) -> usize {
    if is_push(op) {
        (op - PUSH1 + 1) as usize
    } else {
        0
    }
}

#[inline]
pub fn is_dup(op: u8) -> bool {
    (DUP1..=DUP16).contains(&op)
}

#[inline]
pub fn is_log(op: u8) -> bool {
    (LOG0..=LOG4).contains(&op)
}

/// CALL family - the shape an add-liquidity router invocation takes
#[inline]
pub fn is_call(op: u8) -> bool {
    matches!(op, CALL | CALLCODE | DELEGATECALL | STATICCALL)
}

#[inline]
pub fn is_create(op: u8) -> bool {
    matches!(op, CREATE | CREATE2)
}

/// Instructions that end a walk path
#[inline]
pub fn is_terminator(op: u8) -> bool {
    matches!(op, STOP | RETURN | REVERT | INVALID | SELFDESTRUCT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_sizes() {
        assert_eq!(push_size(PUSH1), 1);
        assert_eq!(push_size(PUSH4), 4);
        assert_eq!(push_size(PUSH32), 32);
        assert_eq!(push_size(PUSH0), 0);
        assert_eq!(push_size(SSTORE), 0);
    }

    #[test]
    fn test_categories() {
        assert!(is_dup(DUP1));
        assert!(is_dup(DUP16));
        assert!(!is_dup(DUP16 + 1)); // SWAP1
        assert!(is_call(STATICCALL));
        assert!(!is_call(CREATE));
        assert!(is_terminator(REVERT));
        assert!(!is_terminator(JUMP));
    }
}

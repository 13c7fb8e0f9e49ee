//! Instruction-decoder capability.
//!
//! The engine only needs a thin view of each instruction: how long it is,
//! whether it transfers control (jump / call / return), and its operands
//! reduced to kind + immediate value. Anything that can answer those
//! questions can drive the analysis; the capstone adapter in
//! [`capstone`](self::capstone) is one implementation, scripted fakes in the
//! test suite are another.

#[cfg(feature = "capstone-backend")]
pub mod capstone;

#[cfg(feature = "capstone-backend")]
pub use self::capstone::CapstoneDecoder;

/// Control-flow classification of a decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowGroup {
    /// No control transfer.
    None,
    /// Conditional or unconditional jump.
    Jump,
    /// Call.
    Call,
    /// Return.
    Return,
    /// Transfers control some other way (interrupt, iret, ...).
    Other,
}

/// Operand classification, reduced to what the boundary heuristic needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Immediate,
    Memory,
    Register,
    Other,
}

/// One operand: its kind and, for immediates, the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub kind: OperandKind,
    pub value: u64,
}

impl Operand {
    pub fn imm(value: u64) -> Self {
        Self { kind: OperandKind::Immediate, value }
    }

    pub fn mem() -> Self {
        Self { kind: OperandKind::Memory, value: 0 }
    }

    pub fn reg() -> Self {
        Self { kind: OperandKind::Register, value: 0 }
    }
}

/// A decoded instruction, consumed immediately by the scan loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInsn {
    /// Encoded length in bytes. Always at least 1.
    pub len: u8,
    pub group: FlowGroup,
    /// For jumps: true when the transfer is unconditional (`jmp` rather than
    /// `jcc`). Meaningless for other groups.
    pub unconditional: bool,
    pub operands: Vec<Operand>,
}

impl DecodedInsn {
    /// First operand if it is an immediate, as the heuristic reads jump and
    /// call targets.
    pub fn imm_target(&self) -> Option<u64> {
        match self.operands.first() {
            Some(op) if op.kind == OperandKind::Immediate => Some(op.value),
            _ => None,
        }
    }

    /// True for the `jmp [mem]` import/thunk pattern: a jump whose sole
    /// operand is memory-indirect.
    pub fn is_indirect_jump(&self) -> bool {
        self.group == FlowGroup::Jump
            && matches!(self.operands.first(), Some(op) if op.kind == OperandKind::Memory)
    }
}

/// Capability decoding exactly one instruction.
///
/// `bytes` is the view returned by `Region::translate` for `addr` and always
/// includes the decode slack, so implementations never have to worry about
/// reading past the end of the last in-region instruction.
///
/// `None` means the bytes do not decode at `addr` (invalid opcode, truncated
/// stream). That is an expected condition, not an error: callers resynchronize
/// by advancing a single byte.
pub trait InsnDecoder {
    fn decode(&self, addr: u64, bytes: &[u8]) -> Option<DecodedInsn>;
}

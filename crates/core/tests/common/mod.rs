//! Scripted decoder for driving the analysis without real machine code.
//!
//! A script maps addresses to decoded instructions; any address not in the
//! script is a decode failure, exactly like an invalid opcode byte.

use std::collections::HashMap;

use sweep_core::decode::{DecodedInsn, FlowGroup, InsnDecoder, Operand};

#[derive(Default)]
pub struct Script {
    insns: HashMap<u64, DecodedInsn>,
}

#[allow(dead_code)]
impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(mut self, addr: u64, insn: DecodedInsn) -> Self {
        self.insns.insert(addr, insn);
        self
    }

    /// Plain instruction with no operands (nop, arithmetic, ...).
    pub fn insn(self, addr: u64, len: u8) -> Self {
        self.add(
            addr,
            DecodedInsn { len, group: FlowGroup::None, unconditional: false, operands: vec![] },
        )
    }

    /// Non-jump instruction carrying an immediate (call target, push addr,
    /// mov reg, addr).
    pub fn call(self, addr: u64, len: u8, target: u64) -> Self {
        self.add(
            addr,
            DecodedInsn {
                len,
                group: FlowGroup::Call,
                unconditional: false,
                operands: vec![Operand::imm(target)],
            },
        )
    }

    pub fn push_imm(self, addr: u64, len: u8, value: u64) -> Self {
        self.add(
            addr,
            DecodedInsn {
                len,
                group: FlowGroup::None,
                unconditional: false,
                operands: vec![Operand::imm(value)],
            },
        )
    }

    /// Unconditional direct jump.
    pub fn jmp(self, addr: u64, len: u8, dest: u64) -> Self {
        self.add(
            addr,
            DecodedInsn {
                len,
                group: FlowGroup::Jump,
                unconditional: true,
                operands: vec![Operand::imm(dest)],
            },
        )
    }

    /// Conditional direct jump.
    pub fn jcc(self, addr: u64, len: u8, dest: u64) -> Self {
        self.add(
            addr,
            DecodedInsn {
                len,
                group: FlowGroup::Jump,
                unconditional: false,
                operands: vec![Operand::imm(dest)],
            },
        )
    }

    /// Memory-indirect unconditional jump (`jmp [addr]`), the import stub
    /// pattern.
    pub fn jmp_mem(self, addr: u64, len: u8) -> Self {
        self.add(
            addr,
            DecodedInsn {
                len,
                group: FlowGroup::Jump,
                unconditional: true,
                operands: vec![Operand::mem()],
            },
        )
    }

    pub fn ret(self, addr: u64) -> Self {
        self.add(
            addr,
            DecodedInsn {
                len: 1,
                group: FlowGroup::Return,
                unconditional: false,
                operands: vec![],
            },
        )
    }
}

impl InsnDecoder for Script {
    fn decode(&self, addr: u64, _bytes: &[u8]) -> Option<DecodedInsn> {
        self.insns.get(&addr).cloned()
    }
}

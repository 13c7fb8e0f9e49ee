//! Capstone-backed implementation of the decoder capability.

use capstone::{arch, prelude::*, Capstone, InsnGroupId, InsnGroupType};

use crate::decode::{DecodedInsn, FlowGroup, InsnDecoder, Operand, OperandKind};
use crate::region::DECODE_SLACK;

/// Decoder over a single capstone handle, configured for one architecture.
pub struct CapstoneDecoder {
    cs: Capstone,
}

/// Error from capstone initialization (unknown arch string, library failure).
#[derive(Debug, thiserror::Error)]
#[error("capstone init failed: {0}")]
pub struct DecoderInitError(String);

fn make_cs(arch: &str) -> Result<Capstone, DecoderInitError> {
    match arch {
        "x86_64" | "amd64" => Capstone::new()
            .x86()
            .mode(arch::x86::ArchMode::Mode64)
            .detail(true)
            .build()
            .map_err(|e| DecoderInitError(e.to_string())),
        "x86" | "i386" => Capstone::new()
            .x86()
            .mode(arch::x86::ArchMode::Mode32)
            .detail(true)
            .build()
            .map_err(|e| DecoderInitError(e.to_string())),
        "arm" | "armv7" => Capstone::new()
            .arm()
            .mode(arch::arm::ArchMode::Arm)
            .detail(true)
            .build()
            .map_err(|e| DecoderInitError(e.to_string())),
        "arm64" | "aarch64" => Capstone::new()
            .arm64()
            .mode(arch::arm64::ArchMode::Arm)
            .detail(true)
            .build()
            .map_err(|e| DecoderInitError(e.to_string())),
        "riscv" | "riscv64" => Capstone::new()
            .riscv()
            .mode(arch::riscv::ArchMode::RiscV64)
            .detail(true)
            .build()
            .map_err(|e| DecoderInitError(e.to_string())),
        "riscv32" => Capstone::new()
            .riscv()
            .mode(arch::riscv::ArchMode::RiscV32)
            .detail(true)
            .build()
            .map_err(|e| DecoderInitError(e.to_string())),
        "ppc" | "powerpc" | "ppc64" => Capstone::new()
            .ppc()
            .mode(arch::ppc::ArchMode::Mode64)
            .detail(true)
            .build()
            .map_err(|e| DecoderInitError(e.to_string())),
        other => Err(DecoderInitError(format!("unsupported architecture: {other}"))),
    }
}

fn map_operands(detail: &capstone::InsnDetail) -> Vec<Operand> {
    detail
        .arch_detail()
        .operands()
        .iter()
        .map(|op| match op {
            capstone::arch::ArchOperand::X86Operand(op) => match op.op_type {
                capstone::arch::x86::X86OperandType::Imm(imm) => Operand::imm(imm as u64),
                capstone::arch::x86::X86OperandType::Mem(_) => Operand::mem(),
                capstone::arch::x86::X86OperandType::Reg(_) => Operand::reg(),
                _ => Operand { kind: OperandKind::Other, value: 0 },
            },
            capstone::arch::ArchOperand::ArmOperand(op) => match op.op_type {
                capstone::arch::arm::ArmOperandType::Imm(imm) => Operand::imm(imm as u64),
                capstone::arch::arm::ArmOperandType::Mem(_) => Operand::mem(),
                capstone::arch::arm::ArmOperandType::Reg(_) => Operand::reg(),
                _ => Operand { kind: OperandKind::Other, value: 0 },
            },
            capstone::arch::ArchOperand::Arm64Operand(op) => match op.op_type {
                capstone::arch::arm64::Arm64OperandType::Imm(imm) => Operand::imm(imm as u64),
                capstone::arch::arm64::Arm64OperandType::Mem(_) => Operand::mem(),
                capstone::arch::arm64::Arm64OperandType::Reg(_) => Operand::reg(),
                _ => Operand { kind: OperandKind::Other, value: 0 },
            },
            capstone::arch::ArchOperand::RiscVOperand(op) => match op {
                capstone::arch::riscv::RiscVOperand::Imm(imm) => Operand::imm(*imm as u64),
                capstone::arch::riscv::RiscVOperand::Mem(_) => Operand::mem(),
                capstone::arch::riscv::RiscVOperand::Reg(_) => Operand::reg(),
                _ => Operand { kind: OperandKind::Other, value: 0 },
            },
            capstone::arch::ArchOperand::PpcOperand(op) => match op {
                capstone::arch::ppc::PpcOperand::Imm(imm) => Operand::imm(*imm as u64),
                capstone::arch::ppc::PpcOperand::Mem(_) => Operand::mem(),
                capstone::arch::ppc::PpcOperand::Reg(_) => Operand::reg(),
                _ => Operand { kind: OperandKind::Other, value: 0 },
            },
            _ => Operand { kind: OperandKind::Other, value: 0 },
        })
        .collect()
}

impl CapstoneDecoder {
    /// Build a decoder for the given architecture string (`x86_64`, `x86`,
    /// `arm`, `arm64`, `riscv`, `ppc`, plus common aliases).
    pub fn new(arch: &str) -> Result<Self, DecoderInitError> {
        Ok(Self { cs: make_cs(arch)? })
    }

    /// Capstone library version, for run bookkeeping.
    pub fn backend_version() -> String {
        let (major, minor) = Capstone::lib_version();
        format!("{major}.{minor}")
    }
}

impl InsnDecoder for CapstoneDecoder {
    fn decode(&self, addr: u64, bytes: &[u8]) -> Option<DecodedInsn> {
        // The translate view can run to the end of the region; capstone only
        // needs one instruction's worth of bytes.
        let window = &bytes[..bytes.len().min(DECODE_SLACK)];
        let insns = self.cs.disasm_count(window, addr, 1).ok()?;
        let insn = insns.iter().next()?;
        let detail = self.cs.insn_detail(insn).ok()?;

        let in_group = |group: InsnGroupType::Type| {
            detail.groups().iter().any(|g| *g == InsnGroupId(group as u8))
        };
        let group = if in_group(InsnGroupType::CS_GRP_RET) {
            FlowGroup::Return
        } else if in_group(InsnGroupType::CS_GRP_CALL) {
            FlowGroup::Call
        } else if in_group(InsnGroupType::CS_GRP_JUMP) {
            FlowGroup::Jump
        } else if in_group(InsnGroupType::CS_GRP_INT) || in_group(InsnGroupType::CS_GRP_IRET) {
            FlowGroup::Other
        } else {
            FlowGroup::None
        };

        let mnemonic = insn.mnemonic().unwrap_or("").to_lowercase();
        let conditional =
            mnemonic.starts_with('j') && !matches!(mnemonic.as_str(), "jmp" | "jr" | "j" | "jal");

        Some(DecodedInsn {
            len: insn.bytes().len() as u8,
            group,
            unconditional: group == FlowGroup::Jump && !conditional,
            operands: map_operands(&detail),
        })
    }
}

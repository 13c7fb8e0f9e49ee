//! Reference scanner: the first linear sweep over the region.
//!
//! Every immediate operand of a non-jump instruction that points back into
//! the region is taken as a possible function start (`call target`,
//! `push target`, `mov reg, target`). Jump targets are deliberately skipped:
//! those are intra-function control flow and would flood the set with basic
//! block labels.

use crate::decode::{FlowGroup, InsnDecoder, OperandKind};
use crate::model::{Candidate, CandidateSet};
use crate::region::Region;

/// Sweep the whole region and return the normalized candidate set.
pub(crate) fn populate_references(region: &Region, decoder: &dyn InsnDecoder) -> CandidateSet {
    let mut set = CandidateSet::new();

    let mut addr = region.base();
    while addr < region.end() {
        match region.translate(addr).and_then(|view| decoder.decode(addr, view)) {
            Some(insn) => {
                if insn.group != FlowGroup::Jump {
                    for op in &insn.operands {
                        if op.kind == OperandKind::Immediate && region.contains(op.value) {
                            set.push(Candidate::new(op.value));
                        }
                    }
                }
                addr += u64::from(insn.len);
            }
            // Invalid opcode or untranslatable byte: resynchronize one byte
            // at a time, never a presumed instruction width.
            None => addr += 1,
        }
    }

    set.normalize();
    log::debug!("{} referenced starts populated in {:#x}..{:#x}", set.len(), region.base(), region.end());
    set
}

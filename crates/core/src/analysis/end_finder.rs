//! Boundary heuristic: walk forward from a candidate start and guess where
//! the function ends.
//!
//! The walk tracks three things:
//! - `end`: the best return site seen so far;
//! - `fardest`: the farthest forward jump target seen so far. A return
//!   before this point is not yet trustworthy as the true end, because code
//!   past it is still reachable from that jump;
//! - `jumpback`: the last unconditional jump landing before the tentative
//!   return site. Such a jump appearing *after* the return is a loop tail or
//!   epilogue jump, and extends the function past the naive return.

use crate::decode::{FlowGroup, InsnDecoder};
use crate::region::Region;

/// Find the end of the function assumed to start at `start`, never looking
/// at or past `maxaddr`. `None` means no defensible end was found; the
/// candidate stays unresolved.
pub(crate) fn find_function_end(
    region: &Region,
    decoder: &dyn InsnDecoder,
    start: u64,
    maxaddr: u64,
) -> Option<u64> {
    // `jmp [mem]` right at the start marks an import/thunk stub, not a
    // function body.
    if let Some(insn) = region.translate(start).and_then(|view| decoder.decode(start, view)) {
        if insn.is_indirect_jump() {
            return None;
        }
    }

    let mut end: Option<u64> = None;
    let mut jumpback: Option<u64> = None;
    let mut fardest: u64 = 0;

    let mut addr = start;
    while addr < maxaddr {
        let Some(insn) = region.translate(addr).and_then(|view| decoder.decode(addr, view))
        else {
            addr += 1;
            continue;
        };

        // The instruction would straddle the bound; everything from here on
        // belongs to the next candidate.
        if addr + u64::from(insn.len) > maxaddr {
            break;
        }

        if insn.group == FlowGroup::Jump {
            if let Some(dest) = insn.imm_target() {
                if dest >= maxaddr {
                    // Jump across the allotted range; currently unused.
                } else if dest > addr && dest > fardest {
                    fardest = dest;
                } else if insn.unconditional && end.is_some_and(|e| dest < e) {
                    jumpback = Some(addr);
                }
            }
        } else if insn.group == FlowGroup::Return {
            end = Some(addr);
            // Accept this return as terminal unless a forward jump target
            // still lies past it.
            if fardest < addr {
                break;
            }
        }

        addr += u64::from(insn.len);
    }

    match (end, jumpback) {
        (Some(e), Some(j)) if j > e => Some(j),
        _ => end,
    }
}

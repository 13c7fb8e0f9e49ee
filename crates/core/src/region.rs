//! Snapshotted code region and the memory-source capability that fills it.
//!
//! The analysis never touches target memory directly: it takes one snapshot
//! of `[base, base + size)` up front and treats it as immutable for the rest
//! of the session. Every byte access goes through [`Region::translate`]; there
//! is no address arithmetic anywhere else in the crate.

use thiserror::Error;

/// Extra bytes kept past the logical end of the region so the last in-region
/// instruction can decode without running off the buffer. Matches the longest
/// instruction any supported decoder will ask to look at.
pub const DECODE_SLACK: usize = 16;

/// Error from a memory source that could not service a read at all.
///
/// A *short* read is not an error (unmapped tails are assumed zero); this is
/// for sources that are genuinely unavailable, where continuing would
/// silently produce an empty analysis.
#[derive(Debug, Error)]
#[error("memory source failed reading {len} bytes at {addr:#x}: {reason}")]
pub struct SourceError {
    pub addr: u64,
    pub len: usize,
    pub reason: String,
}

impl SourceError {
    pub fn new(addr: u64, len: usize, reason: impl Into<String>) -> Self {
        Self { addr, len, reason: reason.into() }
    }
}

/// Capability supplying the bytes of the target address space.
///
/// `read_into` fills `buf` starting at virtual address `addr` and returns how
/// many bytes were actually available. Returning fewer than `buf.len()` is
/// the normal way to report an unmapped tail; the caller keeps the remainder
/// zeroed. Only a source that cannot read anything meaningful should error.
pub trait MemorySource {
    fn read_into(&self, addr: u64, buf: &mut [u8]) -> Result<usize, SourceError>;
}

/// An owned snapshot of `[base, base + size)` plus decode slack.
#[derive(Debug, Clone)]
pub struct Region {
    base: u64,
    size: u64,
    bytes: Vec<u8>,
}

impl Region {
    /// Snapshot `size` bytes at `base` from the given source.
    ///
    /// The backing buffer is `size + DECODE_SLACK` long; the slack stays
    /// zeroed (or whatever a short read left it as) so the final in-region
    /// instruction can always decode without an out-of-bounds read.
    pub fn snapshot(source: &dyn MemorySource, base: u64, size: u64) -> Result<Self, SourceError> {
        let mut bytes = vec![0u8; size as usize + DECODE_SLACK];
        let _ = source.read_into(base, &mut bytes[..size as usize])?;
        Ok(Self { base, size, bytes })
    }

    /// Build a region directly from a byte buffer. Mainly for tests and for
    /// callers that already hold the bytes in memory.
    pub fn from_bytes(base: u64, data: &[u8]) -> Self {
        let mut bytes = vec![0u8; data.len() + DECODE_SLACK];
        bytes[..data.len()].copy_from_slice(data);
        Self { base, size: data.len() as u64, bytes }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Exclusive upper address of the region.
    pub fn end(&self) -> u64 {
        self.base + self.size
    }

    /// True iff `addr` lies inside `[base, base + size)`.
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.end()
    }

    /// Translate a virtual address into a local view, including the decode
    /// slack past the logical end. `None` means the address is outside the
    /// region; callers scanning linearly fall back to a one-byte step.
    pub fn translate(&self, addr: u64) -> Option<&[u8]> {
        if !self.contains(addr) {
            return None;
        }
        let offset = (addr - self.base) as usize;
        Some(&self.bytes[offset..])
    }
}

/// Memory source over an in-memory buffer mapped at a fixed base address.
///
/// Reads outside the buffer come back short, which the snapshot zero-fills,
/// mirroring how a debugger treats unmapped pages.
pub struct BufferSource {
    base: u64,
    data: Vec<u8>,
}

impl BufferSource {
    pub fn new(base: u64, data: Vec<u8>) -> Self {
        Self { base, data }
    }
}

impl MemorySource for BufferSource {
    fn read_into(&self, addr: u64, buf: &mut [u8]) -> Result<usize, SourceError> {
        if addr < self.base {
            return Ok(0);
        }
        let offset = (addr - self.base) as usize;
        if offset >= self.data.len() {
            return Ok(0);
        }
        let available = &self.data[offset..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        Ok(n)
    }
}

//! File-backed memory source and executable-section discovery.
//!
//! Frontends usually analyze a window of a binary on disk rather than live
//! process memory. [`FileImage`] owns the file bytes and hands out
//! [`ImageWindow`]s mapping a virtual-address range onto a file offset;
//! [`text_region`] finds the executable section of an ELF/PE/Mach-O image so
//! the CLI can default to "analyze the text section".

use goblin::{elf, mach, pe, Object};
use serde::{Deserialize, Serialize};

use crate::region::{MemorySource, SourceError};

/// A region of a file image to analyze: where it lives in the address space
/// and where its bytes sit in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSpec {
    /// Virtual base address of the region.
    pub base: u64,
    /// Offset of the region's first byte within the file.
    pub file_offset: u64,
    /// Region size in bytes.
    pub size: u64,
}

/// The bytes of a binary file on disk.
pub struct FileImage {
    bytes: Vec<u8>,
}

impl FileImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Memory source serving `spec`'s virtual window from these file bytes.
    pub fn window(&self, spec: RegionSpec) -> ImageWindow<'_> {
        ImageWindow { bytes: &self.bytes, base: spec.base, file_offset: spec.file_offset }
    }

    /// The executable section of this image, when it parses as one.
    pub fn text_region(&self) -> Option<RegionSpec> {
        text_region(&self.bytes)
    }
}

/// One virtual-address window of a [`FileImage`]. Reads outside the window
/// or past EOF come back short and are zero-filled by the snapshot.
pub struct ImageWindow<'a> {
    bytes: &'a [u8],
    base: u64,
    file_offset: u64,
}

impl MemorySource for ImageWindow<'_> {
    fn read_into(&self, addr: u64, buf: &mut [u8]) -> Result<usize, SourceError> {
        if addr < self.base {
            return Ok(0);
        }
        let offset = (self.file_offset + (addr - self.base)) as usize;
        if offset >= self.bytes.len() {
            return Ok(0);
        }
        let available = &self.bytes[offset..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        Ok(n)
    }
}

/// Locate the primary executable section of an object file.
///
/// Returns `None` when the bytes do not parse as a known format or no
/// executable section exists; callers then have to supply the region
/// explicitly.
pub fn text_region(bytes: &[u8]) -> Option<RegionSpec> {
    match Object::parse(bytes).ok()? {
        Object::Elf(elf) => elf
            .section_headers
            .iter()
            .find(|sh| {
                sh.sh_flags & u64::from(elf::section_header::SHF_EXECINSTR) != 0 && sh.sh_size > 0
            })
            .map(|sh| RegionSpec { base: sh.sh_addr, file_offset: sh.sh_offset, size: sh.sh_size }),
        Object::PE(pe) => pe
            .sections
            .iter()
            .find(|sec| {
                sec.characteristics & pe::section_table::IMAGE_SCN_MEM_EXECUTE != 0
                    && sec.size_of_raw_data > 0
            })
            .map(|sec| RegionSpec {
                base: pe.image_base as u64 + sec.virtual_address as u64,
                file_offset: sec.pointer_to_raw_data as u64,
                size: if sec.virtual_size > 0 {
                    u64::from(sec.virtual_size).min(u64::from(sec.size_of_raw_data))
                } else {
                    u64::from(sec.size_of_raw_data)
                },
            }),
        Object::Mach(mach::Mach::Binary(bin)) => bin
            .segments
            .sections()
            .flatten()
            .filter_map(Result::ok)
            .find(|(sec, _)| sec.name().ok() == Some("__text") && sec.size > 0)
            .map(|(sec, _)| RegionSpec {
                base: sec.addr,
                file_offset: u64::from(sec.offset),
                size: sec.size,
            }),
        _ => None,
    }
}

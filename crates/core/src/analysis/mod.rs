//! Analysis session: snapshot a region, discover candidates, resolve ends,
//! export boundaries.

mod end_finder;
mod scanner;

use thiserror::Error;

use crate::decode::InsnDecoder;
use crate::model::CandidateSet;
use crate::region::{MemorySource, Region, SourceError};
use crate::registry::{FunctionRegistry, RegistryError};

/// Fatal analysis failures. Decode failures and unresolved candidates are
/// not errors and never show up here; this is strictly for unavailable
/// upstream capabilities.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// One analysis session over a snapshotted `[base, base + size)`.
///
/// The region is populated once and immutable afterwards; `analyze` can be
/// called any number of times and always returns the same set for the same
/// bytes.
#[derive(Debug)]
pub struct Analysis {
    region: Region,
}

impl Analysis {
    /// Snapshot `size` bytes at `base` through the memory source.
    pub fn snapshot(
        source: &dyn MemorySource,
        base: u64,
        size: u64,
    ) -> Result<Self, AnalysisError> {
        Ok(Self { region: Region::snapshot(source, base, size)? })
    }

    /// Run over an already-materialized region.
    pub fn from_region(region: Region) -> Self {
        Self { region }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Discover candidates and resolve their ends.
    ///
    /// The candidate set is normalized before the end pass and never
    /// reordered or resized afterwards, so each candidate's upper search
    /// bound (the next candidate's start) stays valid while ends are being
    /// written.
    pub fn analyze(&self, decoder: &dyn InsnDecoder) -> CandidateSet {
        let mut set = scanner::populate_references(&self.region, decoder);

        for index in 0..set.len() {
            let Some(candidate) = set.get(index).copied() else { continue };
            if candidate.resolved() {
                continue;
            }
            let maxaddr = set.bound(index, self.region.end());
            if let Some(end) =
                end_finder::find_function_end(&self.region, decoder, candidate.start, maxaddr)
            {
                set.set_end(index, end);
            }
        }

        log::debug!(
            "{} of {} candidates resolved in {:#x}..{:#x}",
            set.resolved().count(),
            set.len(),
            self.region.base(),
            self.region.end()
        );
        set
    }

    /// Replace every recorded range inside the region with the resolved
    /// candidates. Unresolved candidates are skipped silently.
    pub fn export_boundaries(
        &self,
        set: &CandidateSet,
        registry: &mut dyn FunctionRegistry,
    ) -> Result<(), AnalysisError> {
        registry.remove_range(self.region.base(), self.region.end())?;
        for candidate in set {
            if let Some(end) = candidate.end {
                registry.add_range(candidate.start, end, true)?;
            }
        }
        Ok(())
    }
}

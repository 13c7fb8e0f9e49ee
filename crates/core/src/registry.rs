//! Function-registry capability: wherever discovered ranges get recorded.
//!
//! The analysis itself does not care whether ranges end up in a debugger, a
//! database, or a plain vector; it only needs the remove/add contract below.

use thiserror::Error;

use crate::model::FunctionRange;

/// Error from a registry that could not record or clear ranges.
///
/// Registry failures are fatal to an export: silently dropping ranges would
/// be indistinguishable from "nothing found".
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("function registry error: {0}")]
    Backend(String),
}

/// Capability recording function ranges.
pub trait FunctionRegistry {
    /// Remove every recorded range lying fully inside `[start, end)`.
    fn remove_range(&mut self, start: u64, end: u64) -> Result<(), RegistryError>;

    /// Record `[start, end)` as a function, flagged heuristic when it came
    /// out of analysis rather than symbols or user input.
    fn add_range(&mut self, start: u64, end: u64, heuristic: bool) -> Result<(), RegistryError>;
}

/// In-memory registry keeping ranges sorted by start. Used by tests and by
/// frontends that only want to print results.
#[derive(Debug, Default, Clone)]
pub struct MemoryRegistry {
    ranges: Vec<FunctionRange>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> &[FunctionRange] {
        &self.ranges
    }
}

impl FunctionRegistry for MemoryRegistry {
    fn remove_range(&mut self, start: u64, end: u64) -> Result<(), RegistryError> {
        self.ranges.retain(|r| !(r.start >= start && r.end <= end));
        Ok(())
    }

    fn add_range(&mut self, start: u64, end: u64, heuristic: bool) -> Result<(), RegistryError> {
        self.ranges.push(FunctionRange { start, end, heuristic });
        self.ranges.sort_unstable();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_range_only_clears_fully_contained_ranges() {
        let mut registry = MemoryRegistry::new();
        registry.add_range(0x10, 0x20, true).unwrap();
        registry.add_range(0x30, 0x40, true).unwrap();
        registry.add_range(0x05, 0x50, false).unwrap();

        registry.remove_range(0x10, 0x40).unwrap();

        // The straddling range survives; the contained ones are gone.
        assert_eq!(registry.ranges().len(), 1);
        assert_eq!(registry.ranges()[0].start, 0x05);
    }
}

//! sweep-core
//!
//! Core library for discovering function boundaries inside a raw region of
//! machine code, without symbols. The engine combines a linear scan for
//! immediate-value references (call/push/mov targets that look like function
//! entries) with a per-candidate forward walk that guesses where each
//! function ends.
//!
//! The hard dependencies of the analysis are expressed as capability traits
//! so the engine can be driven by scripted instruction streams in tests:
//! - [`region::MemorySource`] supplies the bytes,
//! - [`decode::InsnDecoder`] decodes one instruction at a time,
//! - [`registry::FunctionRegistry`] receives the discovered ranges.
//!
//! All substantive logic lives here so it is fully testable and reusable
//! from multiple frontends (CLI, bindings, etc.).

pub mod analysis;
pub mod db;
pub mod decode;
pub mod model;
pub mod region;
pub mod registry;

#[cfg(feature = "capstone-backend")]
pub mod image;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod analyze;
pub mod ranges;

pub use analyze::*;
pub use ranges::*;

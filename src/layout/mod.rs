//! Layout module: Rectangular regions of the buffer.
//!
//! Bounds are 1-based and inclusive, matching how users describe screen
//! areas ("rows 1 to 10, columns 1 to 80").

mod bounds;
mod region;

pub use bounds::Bounds;
pub use region::{MonitorMode, RegionStatus, Registration};

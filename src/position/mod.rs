//! Position module: Row and column lookup for opaque host positions.
//!
//! This module contains:
//! - [`PositionResolver`]: Cached, incremental token → (row, col) mapping
//! - [`PositionCache`]: Bounded TTL cache keyed by token
//! - [`Generation`]: Shared content-change counter that invalidates both

mod cache;
mod generation;
mod resolver;

pub use cache::PositionCache;
pub use generation::Generation;
pub use resolver::{Position, PositionResolver};

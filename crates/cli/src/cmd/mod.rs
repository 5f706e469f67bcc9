//! CLI command implementations

pub mod index;
pub mod serve;
pub mod sync;

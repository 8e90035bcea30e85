//! CLI command implementations.
//!
//! Commands write their results to the given writer so they can be tested
//! without capturing stdout.

pub mod entries;
pub mod keys;
pub mod secretbox;

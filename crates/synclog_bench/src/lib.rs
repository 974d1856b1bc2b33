//! Shared helpers for the synclog benches.

#![warn(missing_docs)]

pub mod utils;

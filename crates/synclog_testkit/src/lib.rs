//! # synclog testkit
//!
//! Test utilities for synclog.
//!
//! This crate provides:
//! - Temporary task directories ([`TempTask`])
//! - Crash simulation on segment files ([`crash`])
//! - Property-based generators for payloads and change events
//!
//! ## Usage
//!
//! ```rust,ignore
//! use synclog_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_log() {
//!     with_temp_task(|log| {
//!         log.write_payload(b"row").unwrap();
//!         log.flush().unwrap();
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;

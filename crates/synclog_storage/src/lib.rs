//! # synclog storage
//!
//! Byte-store backends underneath the synclog segment files.
//!
//! A backend knows nothing about frames, segments or checkpoints. It stores
//! bytes, appends bytes and reports its size. The log crate owns every format
//! decision.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - one segment file on the local filesystem
//! - [`InMemoryBackend`] - a `Vec<u8>`, used by codec tests
//!
//! ## Example
//!
//! ```rust
//! use synclog_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"row change").unwrap();
//! assert_eq!(backend.read_at(offset, 10).unwrap(), b"row change");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;

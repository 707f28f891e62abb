//! Storage locations and low-level file operations.
//!
//! This module centralizes the filesystem-facing logic for
//! `portable-table-core`:
//!
//! - [`StorageLocation`] / [`TableLocation`], the parsed form of a table
//!   root, round-tripping through their string representation.
//! - Small async helpers used by the metadata log and the local storage
//!   client: atomic write-then-rename, create-new writes for commit files,
//!   and whole-file reads.
//!
//! Only the local filesystem backend exists today; the API is shaped so that
//! object-storage backends can be added without rewriting the log and handle
//! layers.

mod error;
mod io;
mod location;

pub use error::{BackendError, StorageError, StorageResult};
pub use io::{exists, read_all_bytes, read_to_string, write_atomic, write_new};
pub use location::{LocationParseError, StorageLocation, TableLocation};

//! Versioned metadata log and the operations interface over it.
//!
//! Each table root carries a `_metadata_log/` directory holding one JSON
//! commit file per version plus a `CURRENT` pointer:
//!
//! ```text
//! table_root/
//!   _metadata_log/
//!     CURRENT                  # latest committed version (e.g. "3\n")
//!     0000000001.json          # MetadataCommit version 1
//!     0000000002.json          # MetadataCommit version 2
//!     0000000003.json          # MetadataCommit version 3
//! ```
//!
//! The log is:
//!
//! - **Append-only**: commits never mutate existing files.
//! - **Monotonically versioned**: versions only increase, enforced by the
//!   commit API's version guard.
//! - **Human-inspectable**: each commit is a single JSON document carrying
//!   the full [`TableMetadata`](crate::metadata::TableMetadata) snapshot at
//!   that version.
//!
//! Writers use optimistic concurrency: the check on `CURRENT` is advisory,
//! and the real guard is the create-new semantics of the commit file itself.

mod operations;
mod store;

pub use operations::{LogTableOperations, TableOperations};
pub use store::{CommitError, MetadataCommit, MetadataLogStore};

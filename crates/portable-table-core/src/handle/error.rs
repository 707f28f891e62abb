//! Error types and SNAFU context selectors for the handle layer.
//!
//! This module centralizes the `TableError` enum used by the public handle
//! API and exposes context selectors (via
//! `#[snafu(visibility(pub(crate)))]`) so sibling modules can attach error
//! context without re-exporting everything at the crate root.

use snafu::prelude::*;

use crate::client::ClientError;
use crate::log::CommitError;
use crate::storage::LocationParseError;

/// Errors from high-level table handle operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TableError {
    /// `client()` was called after the handle's storage client was released.
    ///
    /// This is the fixed policy for acquire-after-close: the slot never
    /// reopens. Build a fresh handle (or decode a fresh copy) instead.
    #[snafu(display("table '{name}': storage client slot is closed"))]
    ClosedHandle {
        /// Name of the handle whose slot was closed.
        name: String,
    },

    /// Storage client construction failed. The slot stays empty, so a later
    /// `client()` call retries.
    #[snafu(display("table '{name}': cannot open storage client: {source}"))]
    ResourceOpen {
        /// Name of the handle that attempted the open.
        name: String,
        /// Underlying client error.
        source: ClientError,
    },

    /// Tearing down the open storage client failed. The slot is closed
    /// regardless.
    #[snafu(display("table '{name}': failed to close storage client: {source}"))]
    ResourceClose {
        /// Name of the handle that attempted the close.
        name: String,
        /// Underlying client error.
        source: ClientError,
    },

    /// Any error coming from the metadata log (conflicts, storage failures,
    /// corrupt commits).
    #[snafu(display("metadata log error: {source}"))]
    MetadataLog {
        /// Underlying metadata log error.
        source: CommitError,
    },

    /// Attempt to create a table where commits already exist.
    #[snafu(display(
        "table already exists; current metadata log version is {current_version}"
    ))]
    AlreadyExists {
        /// Current metadata log version that indicates the table exists.
        current_version: u64,
    },

    /// Attempt to load a table that has no commits at all.
    #[snafu(display("cannot load table with no commits (CURRENT version is 0)"))]
    EmptyTable,

    /// The metadata snapshot carries a location string that does not parse.
    #[snafu(display("invalid table location '{spec}': {source}"))]
    InvalidLocation {
        /// The offending location string.
        spec: String,
        /// Underlying parse error.
        source: LocationParseError,
    },
}

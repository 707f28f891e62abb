//! # portable-table
//!
//! Table handles that survive process boundaries.
//!
//! A driver process builds a [`TableHandle`]; [`TableProxy::copy_of`]
//! snapshots it for the wire; worker processes decode their own copies,
//! each of which lazily opens, and independently closes, its own storage
//! client.
//!
//! This crate is the supported public entry point and provides a small,
//! stable surface over `portable-table-core`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use portable_table::prelude::*;
//! ```

/// Convenience prelude with the stable, supported surface.
pub mod prelude;

pub use portable_table_core::client::{ClientFactory, StorageClient, factory_for};
pub use portable_table_core::handle::{HandleKind, SlotStatus, TableError, TableHandle};
pub use portable_table_core::log::{
    CommitError, LogTableOperations, MetadataLogStore, TableOperations,
};
pub use portable_table_core::metadata::{
    LogicalDataType, LogicalField, LogicalSchema, NullOrder, PartitionSpec, SortDirection,
    SortOrder, TableMetadata, Transform,
};
pub use portable_table_core::proxy::{
    BinaryCodec, CodecError, JsonCodec, ProxyCodec, ProxyError, TableProxy, codecs,
};
pub use portable_table_core::storage::TableLocation;
pub use portable_table_core::transaction::{Transaction, UpdateProperties};
pub use portable_table_core::view::{MetadataViewType, create_view, create_view_with_factory};

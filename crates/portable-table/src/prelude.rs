//! Wrapper prelude.
//!
//! The `portable-table` crate is the supported public entry point.
//! Downstream code should prefer importing from this prelude instead of
//! depending on internal core module paths.

pub use crate::{
    HandleKind, JsonCodec, LogicalDataType, LogicalField, LogicalSchema, MetadataViewType,
    PartitionSpec, ProxyCodec, SortOrder, TableError, TableHandle, TableLocation, TableMetadata,
    TableProxy, Transaction, create_view,
};

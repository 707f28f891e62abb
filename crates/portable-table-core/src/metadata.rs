//! The immutable table metadata model.
//!
//! Everything a worker needs to know about a table (logical schema,
//! partition spec, sort order, properties, location, and version) is
//! captured in a [`TableMetadata`] snapshot with value semantics: snapshots
//! are cloned freely, compared field-for-field, and round-trip exactly
//! through serde. Mutation always produces a *new* snapshot (see
//! [`crate::transaction`]).

mod partition;
mod schema;
mod sort;
mod table_metadata;

pub use partition::{
    PartitionField, PartitionSpec, PartitionSpecBuilder, PartitionSpecError, Transform,
};
pub use schema::{
    LogicalDataType, LogicalField, LogicalSchema, LogicalSchemaError, LogicalTimestampUnit,
};
pub use sort::{NullOrder, SortDirection, SortField, SortOrder, SortOrderBuilder, SortOrderError};
pub use table_metadata::{TABLE_FORMAT_VERSION, TableMetadata};

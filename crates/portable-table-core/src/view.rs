//! Read-only metadata views over a table's committed state.
//!
//! A metadata view is a derived table whose rows describe the base table
//! itself: its snapshots, history, manifests, and so on. Views are full
//! [`TableHandle`]s: they serialize through the same proxy, lazily open
//! their own storage client, and close independently of the base table and
//! of each other.

use std::sync::Arc;
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::client::ClientFactory;
use crate::handle::{HandleKind, TableError, TableHandle};
use crate::log::TableOperations;
use crate::metadata::{
    LogicalDataType, LogicalField, LogicalSchema, LogicalTimestampUnit, TableMetadata,
};

/// The closed set of metadata projections a table exposes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MetadataViewType {
    /// Data files referenced by the current version.
    DataFiles,
    /// Data files referenced by any version.
    AllDataFiles,
    /// Manifest files tracked by the table.
    Manifests,
    /// One row per committed snapshot.
    Snapshots,
    /// The version lineage of the table.
    History,
    /// Row and file counts per partition.
    Partitions,
    /// Named references to snapshots.
    Refs,
}

/// Errors produced when parsing a view type name.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum ParseViewTypeError {
    /// The name did not match any declared view type.
    #[snafu(display("unknown metadata view type '{input}'"))]
    UnknownViewType {
        /// The unrecognized input.
        input: String,
    },
}

impl MetadataViewType {
    /// Every declared view type, for exhaustive iteration.
    pub const ALL: [MetadataViewType; 7] = [
        MetadataViewType::DataFiles,
        MetadataViewType::AllDataFiles,
        MetadataViewType::Manifests,
        MetadataViewType::Snapshots,
        MetadataViewType::History,
        MetadataViewType::Partitions,
        MetadataViewType::Refs,
    ];

    /// Stable lowercase name of this view type.
    pub fn as_str(self) -> &'static str {
        match self {
            MetadataViewType::DataFiles => "data_files",
            MetadataViewType::AllDataFiles => "all_data_files",
            MetadataViewType::Manifests => "manifests",
            MetadataViewType::Snapshots => "snapshots",
            MetadataViewType::History => "history",
            MetadataViewType::Partitions => "partitions",
            MetadataViewType::Refs => "refs",
        }
    }

    /// The logical schema of this view's rows.
    pub fn projected_schema(self) -> LogicalSchema {
        // Field lists are fixed literals with unique names; validity is
        // asserted by the `projected_schemas_are_valid` test.
        let fields = match self {
            MetadataViewType::DataFiles | MetadataViewType::AllDataFiles => vec![
                field("file_path", LogicalDataType::Utf8, false),
                field("file_format", LogicalDataType::Utf8, false),
                field("partition", LogicalDataType::Utf8, true),
                field("record_count", LogicalDataType::Int64, false),
                field("file_size_bytes", LogicalDataType::Int64, false),
            ],
            MetadataViewType::Manifests => vec![
                field("path", LogicalDataType::Utf8, false),
                field("length", LogicalDataType::Int64, false),
                field("partition_spec_id", LogicalDataType::Int32, false),
                field("added_files_count", LogicalDataType::Int32, true),
                field("existing_files_count", LogicalDataType::Int32, true),
                field("deleted_files_count", LogicalDataType::Int32, true),
            ],
            MetadataViewType::Snapshots => vec![
                field("committed_at", utc_timestamp(), false),
                field("version", LogicalDataType::Int64, false),
                field("parent_version", LogicalDataType::Int64, true),
                field("operation", LogicalDataType::Utf8, true),
                field(
                    "summary",
                    LogicalDataType::Map {
                        key: Box::new(field("key", LogicalDataType::Utf8, false)),
                        value: Box::new(field("value", LogicalDataType::Utf8, true)),
                    },
                    true,
                ),
            ],
            MetadataViewType::History => vec![
                field("made_current_at", utc_timestamp(), false),
                field("version", LogicalDataType::Int64, false),
                field("parent_version", LogicalDataType::Int64, true),
                field("is_current_ancestor", LogicalDataType::Bool, false),
            ],
            MetadataViewType::Partitions => vec![
                field("partition", LogicalDataType::Utf8, false),
                field("record_count", LogicalDataType::Int64, false),
                field("file_count", LogicalDataType::Int32, false),
            ],
            MetadataViewType::Refs => vec![
                field("name", LogicalDataType::Utf8, false),
                field("type", LogicalDataType::Utf8, false),
                field("version", LogicalDataType::Int64, false),
                field("max_ref_age_ms", LogicalDataType::Int64, true),
            ],
        };

        LogicalSchema { fields }
    }
}

impl fmt::Display for MetadataViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetadataViewType {
    type Err = ParseViewTypeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == normalized)
            .context(UnknownViewTypeSnafu { input })
    }
}

fn field(name: &str, data_type: LogicalDataType, nullable: bool) -> LogicalField {
    LogicalField {
        name: name.to_string(),
        data_type,
        nullable,
    }
}

fn utc_timestamp() -> LogicalDataType {
    LogicalDataType::Timestamp {
        unit: LogicalTimestampUnit::Micros,
        timezone: Some("UTC".to_string()),
    }
}

/// Build a metadata view handle over `ops`'s current snapshot.
///
/// The view's metadata projects the base snapshot through `view_type`: the
/// view schema replaces the table schema, partitioning and sorting are
/// cleared, and the base location and version are retained, so a serialized
/// copy of the view resolves to the same projection of the same table.
pub fn create_view(
    ops: &dyn TableOperations,
    base_name: &str,
    view_label: &str,
    view_type: MetadataViewType,
) -> Result<TableHandle, TableError> {
    let base = ops.current();
    let metadata = TableMetadata::derived(&base, view_type.projected_schema());
    TableHandle::new(
        format!("{base_name}.{view_label}"),
        HandleKind::MetadataView { view_type },
        metadata,
    )
}

/// [`create_view`] with an explicit client factory.
pub fn create_view_with_factory(
    ops: &dyn TableOperations,
    base_name: &str,
    view_label: &str,
    view_type: MetadataViewType,
    factory: Arc<dyn ClientFactory>,
) -> Result<TableHandle, TableError> {
    let base = ops.current();
    let metadata = TableMetadata::derived(&base, view_type.projected_schema());
    TableHandle::with_factory(
        format!("{base_name}.{view_label}"),
        HandleKind::MetadataView { view_type },
        metadata,
        factory,
    )
}

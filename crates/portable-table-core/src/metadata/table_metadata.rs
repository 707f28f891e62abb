//! The table-level metadata snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metadata::partition::PartitionSpec;
use crate::metadata::schema::LogicalSchema;
use crate::metadata::sort::SortOrder;

/// Current metadata / log format version.
///
/// Bumped only on a breaking change to the on-disk JSON format.
pub const TABLE_FORMAT_VERSION: u32 = 1;

/// Immutable snapshot of everything recorded about a table.
///
/// Value semantics throughout: snapshots are cloned freely, copies are
/// independent, and every field round-trips exactly through serde. Nothing
/// here references a live storage client; that pairing happens in
/// [`crate::handle::TableHandle`], per instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableMetadata {
    /// Logical schema of the table.
    schema: LogicalSchema,

    /// Partition spec in effect at this version.
    partition_spec: PartitionSpec,

    /// Sort order in effect at this version.
    sort_order: SortOrder,

    /// Free-form key/value table properties.
    properties: BTreeMap<String, String>,

    /// Storage location string; parses via
    /// [`TableLocation::parse`](crate::storage::TableLocation::parse).
    location: String,

    /// Committed version this snapshot corresponds to (0 before the first
    /// commit).
    version: u64,

    /// Creation timestamp of the table, stored as RFC3339 UTC.
    created_at: DateTime<Utc>,

    /// Format version for future evolution of the metadata layout.
    format_version: u32,
}

impl TableMetadata {
    /// Build the metadata for a new, not-yet-committed table.
    ///
    /// - Fills `created_at` with `Utc::now()`.
    /// - Fills `format_version` with [`TABLE_FORMAT_VERSION`].
    /// - Leaves `version` at 0; the metadata log stamps the real version at
    ///   commit time.
    pub fn new(
        schema: LogicalSchema,
        partition_spec: PartitionSpec,
        sort_order: SortOrder,
        properties: BTreeMap<String, String>,
        location: impl Into<String>,
    ) -> Self {
        TableMetadata {
            schema,
            partition_spec,
            sort_order,
            properties,
            location: location.into(),
            version: 0,
            created_at: Utc::now(),
            format_version: TABLE_FORMAT_VERSION,
        }
    }

    /// Returns the logical schema.
    pub fn schema(&self) -> &LogicalSchema {
        &self.schema
    }

    /// Returns the partition spec.
    pub fn partition_spec(&self) -> &PartitionSpec {
        &self.partition_spec
    }

    /// Returns the sort order.
    pub fn sort_order(&self) -> &SortOrder {
        &self.sort_order
    }

    /// Returns the table properties.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Look up a single property value.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Returns the storage location string.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the committed version this snapshot corresponds to.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the UTC timestamp when the table was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the on-disk metadata format version.
    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    /// A copy of this snapshot stamped with `version`.
    pub(crate) fn at_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// A copy of this snapshot with `properties` replaced wholesale.
    pub(crate) fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    /// A derived snapshot over the same physical table, carrying `schema`
    /// instead of the base schema.
    ///
    /// Used by metadata views: the projection keeps the base location,
    /// version, properties, and creation time, while the schema describes
    /// the view's rows. Derived snapshots are always unpartitioned and
    /// unsorted.
    pub(crate) fn derived(base: &TableMetadata, schema: LogicalSchema) -> Self {
        TableMetadata {
            schema,
            partition_spec: PartitionSpec::unpartitioned(),
            sort_order: SortOrder::unsorted(),
            properties: base.properties.clone(),
            location: base.location.clone(),
            version: base.version,
            created_at: base.created_at,
            format_version: base.format_version,
        }
    }
}

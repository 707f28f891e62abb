//! Partition specs recorded in table metadata.
//!
//! A partition spec maps source columns through transforms to partition
//! fields. Specs are descriptive metadata here (planning and file layout
//! live in downstream engines), but the builder validates that every source
//! column exists in the table's logical schema, so a snapshot never carries
//! a dangling partition reference.

use std::fmt;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::metadata::schema::LogicalSchema;

/// How a source column value is mapped to a partition value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Transform {
    /// The source value is used unmodified.
    Identity,
    /// The year component of a date/timestamp value.
    Year,
    /// The month component of a date/timestamp value.
    Month,
    /// The day component of a date/timestamp value.
    Day,
    /// The hour component of a timestamp value.
    Hour,
    /// A stable hash of the source value, modulo `count`.
    Bucket {
        /// Number of buckets; must be positive.
        count: u32,
    },
    /// The source value truncated to `width` units.
    Truncate {
        /// Truncation width; must be positive.
        width: u32,
    },
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Identity => write!(f, "identity"),
            Transform::Year => write!(f, "year"),
            Transform::Month => write!(f, "month"),
            Transform::Day => write!(f, "day"),
            Transform::Hour => write!(f, "hour"),
            Transform::Bucket { count } => write!(f, "bucket[{count}]"),
            Transform::Truncate { width } => write!(f, "truncate[{width}]"),
        }
    }
}

/// One field of a partition spec.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartitionField {
    /// Name of the source column in the table schema.
    pub source_column: String,
    /// Name of the resulting partition field.
    pub name: String,
    /// Transform applied to the source column.
    pub transform: Transform,
}

/// Errors produced while building a partition spec.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum PartitionSpecError {
    /// The referenced source column does not exist in the schema.
    #[snafu(display("partition source column '{column}' not found in schema"))]
    UnknownColumn {
        /// The missing column name.
        column: String,
    },

    /// Two partition fields would share the same name.
    #[snafu(display("duplicate partition field name '{name}'"))]
    DuplicateField {
        /// The duplicated partition field name.
        name: String,
    },

    /// Bucket and truncate transforms require a positive parameter.
    #[snafu(display("transform {transform} on '{column}' requires a positive parameter"))]
    NonPositiveParameter {
        /// The offending transform.
        transform: Transform,
        /// The source column the transform was applied to.
        column: String,
    },
}

/// An ordered set of partition fields, identified by a spec id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartitionSpec {
    spec_id: u32,
    fields: Vec<PartitionField>,
}

impl PartitionSpec {
    /// The spec with no partition fields.
    pub fn unpartitioned() -> Self {
        PartitionSpec {
            spec_id: 0,
            fields: Vec::new(),
        }
    }

    /// Start building a spec validated against `schema`.
    pub fn builder(schema: &LogicalSchema) -> PartitionSpecBuilder<'_> {
        PartitionSpecBuilder {
            schema,
            fields: Vec::new(),
        }
    }

    /// Identifier of this spec within the table's metadata history.
    pub fn spec_id(&self) -> u32 {
        self.spec_id
    }

    /// The partition fields, in declaration order.
    pub fn fields(&self) -> &[PartitionField] {
        &self.fields
    }

    /// True when this spec has no partition fields.
    pub fn is_unpartitioned(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`PartitionSpec`], validating columns against a schema.
#[derive(Debug)]
pub struct PartitionSpecBuilder<'a> {
    schema: &'a LogicalSchema,
    fields: Vec<PartitionField>,
}

impl PartitionSpecBuilder<'_> {
    fn push(
        mut self,
        column: &str,
        name: String,
        transform: Transform,
    ) -> Result<Self, PartitionSpecError> {
        ensure!(
            self.schema.field(column).is_some(),
            UnknownColumnSnafu { column }
        );
        ensure!(
            !self.fields.iter().any(|f| f.name == name),
            DuplicateFieldSnafu { name }
        );

        match transform {
            Transform::Bucket { count: 0 } | Transform::Truncate { width: 0 } => {
                return NonPositiveParameterSnafu { transform, column }.fail();
            }
            _ => {}
        }

        self.fields.push(PartitionField {
            source_column: column.to_string(),
            name,
            transform,
        });
        Ok(self)
    }

    /// Partition by the unmodified value of `column`.
    pub fn identity(self, column: &str) -> Result<Self, PartitionSpecError> {
        self.push(column, column.to_string(), Transform::Identity)
    }

    /// Partition by the day of `column`.
    pub fn day(self, column: &str) -> Result<Self, PartitionSpecError> {
        self.push(column, format!("{column}_day"), Transform::Day)
    }

    /// Partition by a stable hash of `column` into `count` buckets.
    pub fn bucket(self, column: &str, count: u32) -> Result<Self, PartitionSpecError> {
        self.push(column, format!("{column}_bucket"), Transform::Bucket { count })
    }

    /// Partition by `column` truncated to `width` units.
    pub fn truncate(self, column: &str, width: u32) -> Result<Self, PartitionSpecError> {
        self.push(
            column,
            format!("{column}_trunc"),
            Transform::Truncate { width },
        )
    }

    /// Finish the spec.
    pub fn build(self) -> PartitionSpec {
        PartitionSpec {
            spec_id: 0,
            fields: self.fields,
        }
    }
}

//! Sort orders recorded in table metadata.

use std::fmt;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::metadata::schema::LogicalSchema;

/// Direction of a sort field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest values first.
    Ascending,
    /// Largest values first.
    Descending,
}

/// Where null values sort relative to non-null values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NullOrder {
    /// Nulls before all non-null values.
    NullsFirst,
    /// Nulls after all non-null values.
    NullsLast,
}

/// One field of a sort order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortField {
    /// Name of the sorted column in the table schema.
    pub column: String,
    /// Sort direction.
    pub direction: SortDirection,
    /// Null placement.
    pub null_order: NullOrder,
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };
        let nulls = match self.null_order {
            NullOrder::NullsFirst => "nulls-first",
            NullOrder::NullsLast => "nulls-last",
        };
        write!(f, "{} {dir} {nulls}", self.column)
    }
}

/// Errors produced while building a sort order.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum SortOrderError {
    /// The referenced column does not exist in the schema.
    #[snafu(display("sort column '{column}' not found in schema"))]
    UnknownColumn {
        /// The missing column name.
        column: String,
    },

    /// The same column appears twice in one sort order.
    #[snafu(display("duplicate sort column '{column}'"))]
    DuplicateColumn {
        /// The duplicated column name.
        column: String,
    },
}

/// An ordered list of sort fields, identified by an order id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortOrder {
    order_id: u32,
    fields: Vec<SortField>,
}

impl SortOrder {
    /// The order with no sort fields.
    pub fn unsorted() -> Self {
        SortOrder {
            order_id: 0,
            fields: Vec::new(),
        }
    }

    /// Start building an order validated against `schema`.
    pub fn builder(schema: &LogicalSchema) -> SortOrderBuilder<'_> {
        SortOrderBuilder {
            schema,
            fields: Vec::new(),
        }
    }

    /// Identifier of this order within the table's metadata history.
    pub fn order_id(&self) -> u32 {
        self.order_id
    }

    /// The sort fields, in precedence order.
    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    /// True when this order has no sort fields.
    pub fn is_unsorted(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`SortOrder`], validating columns against a schema.
#[derive(Debug)]
pub struct SortOrderBuilder<'a> {
    schema: &'a LogicalSchema,
    fields: Vec<SortField>,
}

impl SortOrderBuilder<'_> {
    fn push(
        mut self,
        column: &str,
        direction: SortDirection,
        null_order: NullOrder,
    ) -> Result<Self, SortOrderError> {
        ensure!(
            self.schema.field(column).is_some(),
            UnknownColumnSnafu { column }
        );
        ensure!(
            !self.fields.iter().any(|f| f.column == column),
            DuplicateColumnSnafu { column }
        );

        self.fields.push(SortField {
            column: column.to_string(),
            direction,
            null_order,
        });
        Ok(self)
    }

    /// Sort ascending by `column`, nulls first.
    pub fn asc(self, column: &str) -> Result<Self, SortOrderError> {
        self.push(column, SortDirection::Ascending, NullOrder::NullsFirst)
    }

    /// Sort descending by `column`, nulls last.
    pub fn desc(self, column: &str) -> Result<Self, SortOrderError> {
        self.push(column, SortDirection::Descending, NullOrder::NullsLast)
    }

    /// Finish the order.
    pub fn build(self) -> SortOrder {
        SortOrder {
            order_id: if self.fields.is_empty() { 0 } else { 1 },
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::schema::{LogicalDataType, LogicalField};

    fn sample_schema() -> LogicalSchema {
        LogicalSchema::new(vec![LogicalField {
            name: "id".to_string(),
            data_type: LogicalDataType::Int64,
            nullable: false,
        }])
        .unwrap()
    }

    #[test]
    fn builder_accepts_known_columns() {
        let schema = sample_schema();
        let order = SortOrder::builder(&schema).asc("id").unwrap().build();

        assert_eq!(order.fields().len(), 1);
        assert_eq!(order.order_id(), 1);
        assert_eq!(order.fields()[0].to_string(), "id asc nulls-first");
    }

    #[test]
    fn builder_rejects_unknown_columns() {
        let schema = sample_schema();
        let err = SortOrder::builder(&schema).desc("nope").unwrap_err();
        assert!(matches!(err, SortOrderError::UnknownColumn { .. }));
    }

    #[test]
    fn builder_rejects_duplicate_columns() {
        let schema = sample_schema();
        let err = SortOrder::builder(&schema)
            .asc("id")
            .unwrap()
            .desc("id")
            .unwrap_err();
        assert!(matches!(err, SortOrderError::DuplicateColumn { .. }));
    }

    #[test]
    fn unsorted_order_is_empty() {
        let order = SortOrder::unsorted();
        assert!(order.is_unsorted());
        assert_eq!(order.order_id(), 0);
    }
}

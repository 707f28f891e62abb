//! Logical schema definitions and validation.
//!
//! This module models the logical fields and data types recorded in table
//! metadata. Schemas are purely descriptive here (no physical reader lives
//! in this crate), but they are validated structurally on construction so a
//! snapshot never carries a schema that downstream engines would reject.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

/// Units for logical timestamps recorded in table metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogicalTimestampUnit {
    /// Millisecond precision timestamps.
    Millis,
    /// Microsecond precision timestamps.
    Micros,
    /// Nanosecond precision timestamps.
    Nanos,
}

impl fmt::Display for LogicalTimestampUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalTimestampUnit::Millis => write!(f, "ms"),
            LogicalTimestampUnit::Micros => write!(f, "us"),
            LogicalTimestampUnit::Nanos => write!(f, "ns"),
        }
    }
}

/// Logical column definition in a schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogicalField {
    /// Column name as stored in the schema.
    pub name: String,
    /// Logical data type for the column.
    pub data_type: LogicalDataType,
    /// Whether the column allows null values.
    pub nullable: bool,
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?: {}", self.name, self.data_type)
        } else {
            write!(f, "{}: {}", self.name, self.data_type)
        }
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

/// Logical data types that can be stored in table schema metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogicalDataType {
    /// Boolean value.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// Variable-length binary data.
    Binary,
    /// UTF-8 encoded string.
    Utf8,

    /// Timestamp value with a precision unit and optional timezone.
    Timestamp {
        /// Timestamp precision unit (millis, micros, nanos).
        unit: LogicalTimestampUnit,
        /// Optional IANA timezone identifier.
        timezone: Option<String>,
    },

    /// Fixed-precision decimal value with declared precision and scale.
    Decimal {
        /// Total number of decimal digits.
        precision: i32,
        /// Number of digits to the right of the decimal point.
        scale: i32,
    },

    /// Struct with named child fields.
    Struct {
        /// Ordered set of child fields for the struct.
        fields: Vec<LogicalField>,
    },

    /// List (array) with a single element field definition.
    List {
        /// Element field definition for list items.
        elements: Box<LogicalField>,
    },

    /// Map with key/value field definitions.
    Map {
        /// Key field definition (must be non-nullable).
        key: Box<LogicalField>,
        /// Value field definition.
        value: Box<LogicalField>,
    },
}

impl fmt::Display for LogicalDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalDataType::Bool => write!(f, "bool"),
            LogicalDataType::Int32 => write!(f, "i32"),
            LogicalDataType::Int64 => write!(f, "i64"),
            LogicalDataType::Float32 => write!(f, "f32"),
            LogicalDataType::Float64 => write!(f, "f64"),
            LogicalDataType::Binary => write!(f, "binary"),
            LogicalDataType::Utf8 => write!(f, "utf8"),
            LogicalDataType::Timestamp { unit, timezone } => match timezone {
                Some(tz) => write!(f, "timestamp[{unit}, {tz}]"),
                None => write!(f, "timestamp[{unit}]"),
            },
            LogicalDataType::Decimal { precision, scale } => {
                write!(f, "decimal({precision}, {scale})")
            }
            LogicalDataType::Struct { fields } => {
                write!(f, "struct<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, ">")
            }
            LogicalDataType::List { elements } => write!(f, "list<{elements}>"),
            LogicalDataType::Map { key, value } => write!(f, "map<{key}, {value}>"),
        }
    }
}

/// Errors produced when validating a logical schema.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum LogicalSchemaError {
    /// A schema must contain at least one field.
    #[snafu(display("logical schema has no fields"))]
    EmptySchema,

    /// The same column name appears twice at one nesting level.
    #[snafu(display("duplicate column name '{column}' in logical schema"))]
    DuplicateColumn {
        /// Dotted path of the duplicated column.
        column: String,
    },

    /// Map keys must be non-nullable.
    #[snafu(display("map key '{column}' must be non-nullable"))]
    NullableMapKey {
        /// Dotted path of the offending map key field.
        column: String,
    },
}

/// An ordered, validated collection of [`LogicalField`]s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogicalSchema {
    pub(crate) fields: Vec<LogicalField>,
}

impl LogicalSchema {
    /// Build a schema from fields, validating structure.
    ///
    /// # Errors
    /// Returns [`LogicalSchemaError`] when the field list is empty, a column
    /// name is duplicated at any nesting level, or a map key is nullable.
    pub fn new(fields: Vec<LogicalField>) -> Result<Self, LogicalSchemaError> {
        if fields.is_empty() {
            return Err(LogicalSchemaError::EmptySchema);
        }
        validate_fields(&fields, "")?;
        Ok(LogicalSchema { fields })
    }

    /// The top-level fields of this schema, in declaration order.
    pub fn fields(&self) -> &[LogicalField] {
        &self.fields
    }

    /// Look up a top-level field by name.
    pub fn field(&self, name: &str) -> Option<&LogicalField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for LogicalSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema<")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        write!(f, ">")
    }
}

fn validate_fields(fields: &[LogicalField], parent: &str) -> Result<(), LogicalSchemaError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return DuplicateColumnSnafu {
                column: join_path(parent, &field.name),
            }
            .fail();
        }
        validate_type(&field.data_type, &join_path(parent, &field.name))?;
    }
    Ok(())
}

fn validate_type(data_type: &LogicalDataType, path: &str) -> Result<(), LogicalSchemaError> {
    match data_type {
        LogicalDataType::Struct { fields } => validate_fields(fields, path),
        LogicalDataType::List { elements } => {
            validate_type(&elements.data_type, &join_path(path, &elements.name))
        }
        LogicalDataType::Map { key, value } => {
            let key_path = join_path(path, &key.name);
            ensure!(!key.nullable, NullableMapKeySnafu { column: key_path });
            validate_type(&key.data_type, &join_path(path, &key.name))?;
            validate_type(&value.data_type, &join_path(path, &value.name))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8(name: &str, nullable: bool) -> LogicalField {
        LogicalField {
            name: name.to_string(),
            data_type: LogicalDataType::Utf8,
            nullable,
        }
    }

    #[test]
    fn new_accepts_flat_schemas() {
        let schema = LogicalSchema::new(vec![utf8("a", false), utf8("b", true)]).unwrap();
        assert_eq!(schema.fields().len(), 2);
        assert!(schema.field("a").is_some());
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn new_rejects_empty_schemas() {
        let err = LogicalSchema::new(vec![]).unwrap_err();
        assert!(matches!(err, LogicalSchemaError::EmptySchema));
    }

    #[test]
    fn new_rejects_duplicate_top_level_columns() {
        let err = LogicalSchema::new(vec![utf8("a", false), utf8("a", true)]).unwrap_err();
        assert!(
            matches!(err, LogicalSchemaError::DuplicateColumn { ref column } if column == "a"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn new_rejects_duplicate_nested_columns() {
        let schema = LogicalSchema::new(vec![LogicalField {
            name: "payload".to_string(),
            data_type: LogicalDataType::Struct {
                fields: vec![utf8("x", false), utf8("x", false)],
            },
            nullable: false,
        }]);

        let err = schema.unwrap_err();
        assert!(
            matches!(err, LogicalSchemaError::DuplicateColumn { ref column } if column == "payload.x"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn new_rejects_nullable_map_keys() {
        let schema = LogicalSchema::new(vec![LogicalField {
            name: "summary".to_string(),
            data_type: LogicalDataType::Map {
                key: Box::new(utf8("key", true)),
                value: Box::new(utf8("value", true)),
            },
            nullable: true,
        }]);

        let err = schema.unwrap_err();
        assert!(
            matches!(err, LogicalSchemaError::NullableMapKey { ref column } if column == "summary.key"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn schema_json_round_trip() {
        let schema = LogicalSchema::new(vec![
            LogicalField {
                name: "id".to_string(),
                data_type: LogicalDataType::Int64,
                nullable: false,
            },
            LogicalField {
                name: "ts".to_string(),
                data_type: LogicalDataType::Timestamp {
                    unit: LogicalTimestampUnit::Micros,
                    timezone: Some("UTC".to_string()),
                },
                nullable: true,
            },
        ])
        .unwrap();

        let json = serde_json::to_string(&schema).unwrap();
        let back: LogicalSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn display_is_compact() {
        let schema = LogicalSchema::new(vec![utf8("data", true)]).unwrap();
        assert_eq!(schema.to_string(), "schema<data?: utf8>");
    }
}

//! Parsed table root locations.
//!
//! Locations travel across process boundaries as plain strings (inside
//! metadata snapshots and serialization proxies), so [`StorageLocation`]'s
//! `Display` output must round-trip through [`StorageLocation::parse`].

use std::fmt;
use std::path::PathBuf;

use snafu::prelude::*;

/// Identifies where a table's files live.
///
/// This enum abstracts over storage backends, currently supporting local
/// filesystem paths with room for object storage later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageLocation {
    /// A table rooted at the given local filesystem directory.
    Local(PathBuf),
    // Future:
    // S3 { bucket: String, prefix: String },
}

/// Errors produced when parsing a user-facing location string.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum LocationParseError {
    /// The spec string was empty or only whitespace.
    #[snafu(display("storage location spec is empty"))]
    Empty,

    /// The spec used a URI scheme this crate does not support.
    #[snafu(display(
        "unsupported storage scheme '{scheme}' in '{spec}' (expected a local path or file://)"
    ))]
    UnsupportedScheme {
        /// The original spec string.
        spec: String,
        /// The scheme that was not recognized.
        scheme: String,
    },
}

impl StorageLocation {
    /// Creates a location for a local filesystem root.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        StorageLocation::Local(root.into())
    }

    /// Parse a user-facing location string.
    ///
    /// Accepts plain paths and `file://` URIs; any other scheme is rejected
    /// with [`LocationParseError::UnsupportedScheme`].
    pub fn parse(spec: &str) -> Result<Self, LocationParseError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(LocationParseError::Empty);
        }

        if let Some(path) = spec.strip_prefix("file://") {
            return Ok(StorageLocation::Local(PathBuf::from(path)));
        }

        if let Some((scheme, _)) = spec.split_once("://") {
            return UnsupportedSchemeSnafu {
                spec: spec.to_string(),
                scheme: scheme.to_string(),
            }
            .fail();
        }

        Ok(StorageLocation::Local(PathBuf::from(spec)))
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::Local(root) => write!(f, "{}", root.display()),
        }
    }
}

/// Table root location with table-scoped semantics.
///
/// This wraps [`StorageLocation`] and is used when callers need to treat the
/// location as a table root (metadata log layout, client factory dispatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocation(StorageLocation);

impl From<TableLocation> for StorageLocation {
    fn from(t: TableLocation) -> Self {
        t.0
    }
}

impl AsRef<StorageLocation> for TableLocation {
    fn as_ref(&self) -> &StorageLocation {
        &self.0
    }
}

impl TableLocation {
    /// Creates a new `TableLocation` for a local filesystem path.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        TableLocation(StorageLocation::Local(root.into()))
    }

    /// Parse a user-facing table location string.
    pub fn parse(spec: &str) -> Result<Self, LocationParseError> {
        StorageLocation::parse(spec).map(TableLocation)
    }

    /// Return the underlying [`StorageLocation`].
    pub fn storage(&self) -> &StorageLocation {
        &self.0
    }
}

impl fmt::Display for TableLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_plain_paths() {
        let loc = StorageLocation::parse("/tmp/tables/orders").unwrap();
        assert_eq!(loc, StorageLocation::local("/tmp/tables/orders"));
    }

    #[test]
    fn parse_accepts_file_uris() {
        let loc = StorageLocation::parse("file:///tmp/tables/orders").unwrap();
        assert_eq!(loc, StorageLocation::local("/tmp/tables/orders"));
    }

    #[test]
    fn parse_trims_whitespace() {
        let loc = StorageLocation::parse("  /tmp/t  ").unwrap();
        assert_eq!(loc, StorageLocation::local("/tmp/t"));
    }

    #[test]
    fn parse_rejects_empty_specs() {
        for spec in ["", "   ", "\n\t"] {
            let err = StorageLocation::parse(spec).unwrap_err();
            assert!(matches!(err, LocationParseError::Empty));
        }
    }

    #[test]
    fn parse_rejects_unknown_schemes() {
        let err = StorageLocation::parse("s3://bucket/prefix").unwrap_err();
        assert!(
            matches!(err, LocationParseError::UnsupportedScheme { ref scheme, .. } if scheme == "s3"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        let original = StorageLocation::local("/tmp/tables/orders");
        let reparsed = StorageLocation::parse(&original.to_string()).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn table_location_wraps_storage_location() {
        let table = TableLocation::parse("/tmp/tables/orders").unwrap();
        assert_eq!(
            table.storage(),
            &StorageLocation::local("/tmp/tables/orders")
        );
        assert_eq!(table.to_string(), "/tmp/tables/orders");
    }
}

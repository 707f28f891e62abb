//! The operations interface: refreshable access to a table's current
//! metadata snapshot.
//!
//! Derived handles (metadata views, transactions) do not talk to the log
//! directly; they go through [`TableOperations`] so tests and embedders can
//! substitute their own metadata source.

use std::fmt;
use std::sync::RwLock;

use async_trait::async_trait;
use snafu::prelude::*;

use crate::log::CommitError;
use crate::log::store::{CorruptStateSnafu, MetadataLogStore};
use crate::metadata::TableMetadata;
use crate::storage::TableLocation;

/// Refreshable access to a table's committed metadata.
#[async_trait]
pub trait TableOperations: fmt::Debug + Send + Sync {
    /// The latest snapshot this handle has observed. Cheap; no I/O.
    fn current(&self) -> TableMetadata;

    /// Reload the latest committed snapshot from the table's source of
    /// truth, cache it, and return it.
    async fn refresh(&self) -> Result<TableMetadata, CommitError>;
}

/// [`TableOperations`] backed by a [`MetadataLogStore`].
#[derive(Debug)]
pub struct LogTableOperations {
    store: MetadataLogStore,
    cache: RwLock<TableMetadata>,
}

impl LogTableOperations {
    /// Load the operations view of the table at `location`.
    ///
    /// # Errors
    /// Returns [`CommitError::CorruptState`] when the table has no commits
    /// yet; an operations handle over nothing is meaningless.
    pub async fn load(location: TableLocation) -> Result<Self, CommitError> {
        let store = MetadataLogStore::new(location);
        let metadata = store.load_current_metadata().await?.context(
            CorruptStateSnafu {
                msg: "cannot build operations for a table with no commits".to_string(),
            },
        )?;

        Ok(LogTableOperations {
            store,
            cache: RwLock::new(metadata),
        })
    }

    fn cached(&self) -> TableMetadata {
        // A poisoned lock only means a writer panicked mid-clone; the cached
        // snapshot itself is still a plain value.
        self.cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl TableOperations for LogTableOperations {
    fn current(&self) -> TableMetadata {
        self.cached()
    }

    async fn refresh(&self) -> Result<TableMetadata, CommitError> {
        let metadata = self.store.load_current_metadata().await?.context(
            CorruptStateSnafu {
                msg: "table lost its commits between load and refresh".to_string(),
            },
        )?;

        let mut cache = self
            .cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *cache = metadata.clone();

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{LogicalDataType, LogicalField, LogicalSchema, PartitionSpec, SortOrder};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn sample_metadata(root: &std::path::Path) -> TableMetadata {
        let schema = LogicalSchema::new(vec![LogicalField {
            name: "id".to_string(),
            data_type: LogicalDataType::Int64,
            nullable: false,
        }])
        .expect("valid sample schema");

        TableMetadata::new(
            schema,
            PartitionSpec::unpartitioned(),
            SortOrder::unsorted(),
            BTreeMap::new(),
            root.display().to_string(),
        )
    }

    #[tokio::test]
    async fn load_fails_on_fresh_table() -> TestResult {
        let tmp = TempDir::new()?;

        let err = LogTableOperations::load(TableLocation::local(tmp.path()))
            .await
            .expect_err("expected error");
        assert!(matches!(err, CommitError::CorruptState { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn current_returns_cached_snapshot_without_io() -> TestResult {
        let tmp = TempDir::new()?;
        let location = TableLocation::local(tmp.path());
        let store = MetadataLogStore::new(location.clone());
        store
            .commit_with_expected_version(0, sample_metadata(tmp.path()))
            .await?;

        let ops = LogTableOperations::load(location).await?;
        assert_eq!(ops.current().version(), 1);

        // A second commit is invisible until refresh.
        store
            .commit_with_expected_version(1, sample_metadata(tmp.path()))
            .await?;
        assert_eq!(ops.current().version(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_observes_new_commits() -> TestResult {
        let tmp = TempDir::new()?;
        let location = TableLocation::local(tmp.path());
        let store = MetadataLogStore::new(location.clone());
        store
            .commit_with_expected_version(0, sample_metadata(tmp.path()))
            .await?;

        let ops = LogTableOperations::load(location).await?;
        store
            .commit_with_expected_version(1, sample_metadata(tmp.path()))
            .await?;

        let refreshed = ops.refresh().await?;
        assert_eq!(refreshed.version(), 2);
        assert_eq!(ops.current().version(), 2);
        Ok(())
    }
}

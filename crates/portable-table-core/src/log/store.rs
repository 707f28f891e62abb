//! Async persistence for the metadata log.
//!
//! This module owns all on-disk interactions with `_metadata_log/`:
//! tracking the `CURRENT` pointer (interpreting "no file" as version 0, a
//! fresh table), writing zero-padded commit files with optimistic
//! concurrency control, and mapping storage-layer failures into
//! [`CommitError`] variants so callers can differentiate conflicts, storage
//! errors, and corrupt state.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use snafu::{Backtrace, prelude::*};

use crate::metadata::TableMetadata;
use crate::storage::{self, StorageError, TableLocation};

/// Errors from reading or writing the metadata log.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CommitError {
    /// The version guard failed: another writer committed first.
    #[snafu(display(
        "commit conflict: expected current version {expected}, found {found}"
    ))]
    Conflict {
        /// Version the writer believed was current.
        expected: u64,
        /// Version actually recorded in CURRENT.
        found: u64,
        /// The backtrace captured when the conflict was detected.
        backtrace: Backtrace,
    },

    /// A storage-layer failure while reading or writing log files.
    #[snafu(display("storage error in metadata log: {source}"))]
    Storage {
        /// Underlying storage error.
        source: StorageError,
    },

    /// The log contents are inconsistent or unparseable.
    #[snafu(display("corrupt metadata log state: {msg}"))]
    CorruptState {
        /// Description of the inconsistency.
        msg: String,
        /// The backtrace captured when the corruption was detected.
        backtrace: Backtrace,
    },
}

/// A single, immutable commit in the metadata log.
///
/// Commits are written to files such as `_metadata_log/0000000001.json`.
/// The version field must match the file name; `base_version` records what
/// the writer believed was current when the commit was prepared.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataCommit {
    /// The version number of this commit (monotonic, starting from 1).
    pub version: u64,

    /// The version the writer believed was current when preparing this
    /// commit. Used by the OCC layer as a guard.
    pub base_version: u64,

    /// Commit creation timestamp, stored as RFC3339 UTC.
    pub timestamp: DateTime<Utc>,

    /// Full metadata snapshot as of this version.
    pub metadata: TableMetadata,
}

/// Helper for reading and writing the metadata log under a table root.
#[derive(Debug, Clone)]
pub struct MetadataLogStore {
    location: TableLocation,
}

impl MetadataLogStore {
    /// Name of the subdirectory containing the metadata log.
    pub const LOG_DIR_NAME: &str = "_metadata_log";
    /// Name of the file that stores the current version pointer.
    pub const CURRENT_FILE_NAME: &str = "CURRENT";
    /// Number of digits used in zero-padded commit file names.
    pub const COMMIT_FILENAME_DIGITS: usize = 10;

    /// Create a new store rooted at a table directory.
    pub fn new(location: TableLocation) -> Self {
        Self { location }
    }

    /// The table root this store reads and writes.
    pub fn location(&self) -> &TableLocation {
        &self.location
    }

    fn log_rel_dir() -> PathBuf {
        PathBuf::from(Self::LOG_DIR_NAME)
    }

    fn current_rel_path() -> PathBuf {
        Self::log_rel_dir().join(Self::CURRENT_FILE_NAME)
    }

    fn commit_rel_path(version: u64) -> PathBuf {
        let file_name = format!(
            "{:0width$}.json",
            version,
            width = Self::COMMIT_FILENAME_DIGITS
        );
        Self::log_rel_dir().join(file_name)
    }

    async fn read_to_string_rel(&self, rel: &Path) -> Result<String, CommitError> {
        storage::read_to_string(self.location.as_ref(), rel)
            .await
            .context(StorageSnafu)
    }

    /// Load a single commit by version.
    ///
    /// - On storage-layer failures, returns `CommitError::Storage`.
    /// - On JSON parse failures, returns `CommitError::CorruptState`.
    pub async fn load_commit(&self, version: u64) -> Result<MetadataCommit, CommitError> {
        let rel = Self::commit_rel_path(version);
        let json = self.read_to_string_rel(&rel).await?;

        let commit: MetadataCommit =
            serde_json::from_str(&json).map_err(|e| CommitError::CorruptState {
                msg: format!("failed to parse commit {version}: {e}"),
                backtrace: Backtrace::capture(),
            })?;

        // Defensive: file name version must match payload.
        if commit.version != version {
            return CorruptStateSnafu {
                msg: format!(
                    "commit version mismatch: expected {version}, found {} in payload",
                    commit.version
                ),
            }
            .fail();
        }

        Ok(commit)
    }

    /// Load the CURRENT version pointer.
    ///
    /// Behavior:
    /// - If CURRENT does not exist, treat as a fresh table and return 0.
    /// - If CURRENT contains invalid or empty content, return CorruptState.
    pub async fn load_current_version(&self) -> Result<u64, CommitError> {
        let rel = Self::current_rel_path();

        let contents = match storage::read_to_string(self.location.as_ref(), &rel).await {
            Ok(s) => s,
            Err(StorageError::NotFound { .. }) => return Ok(0),
            Err(source) => return Err(CommitError::Storage { source }),
        };

        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return CorruptStateSnafu {
                msg: format!("CURRENT has empty content at {rel:?}"),
            }
            .fail();
        }
        let version = trimmed
            .parse::<u64>()
            .map_err(|e| CommitError::CorruptState {
                msg: format!("CURRENT has invalid content {trimmed:?}: {e}"),
                backtrace: Backtrace::capture(),
            })?;

        Ok(version)
    }

    /// Load the metadata snapshot at the CURRENT version.
    ///
    /// Returns `Ok(None)` for a fresh table (CURRENT version 0). The
    /// snapshot's own version field is validated against the commit.
    pub async fn load_current_metadata(&self) -> Result<Option<TableMetadata>, CommitError> {
        let current = self.load_current_version().await?;
        if current == 0 {
            return Ok(None);
        }

        let commit = self.load_commit(current).await?;
        if commit.metadata.version() != commit.version {
            return CorruptStateSnafu {
                msg: format!(
                    "metadata version {} does not match commit version {}",
                    commit.metadata.version(),
                    commit.version
                ),
            }
            .fail();
        }

        Ok(Some(commit.metadata))
    }

    /// Commit a new metadata snapshot with an optimistic concurrency guard.
    ///
    /// ## Concurrency semantics
    ///
    /// - The check on CURRENT is advisory and subject to races. Two writers
    ///   may both read the same CURRENT value and attempt the same next
    ///   version; the actual guard is the atomic create-new of the commit
    ///   file.
    /// - If another writer wins the race, this fails with
    ///   `CommitError::Storage` wrapping `StorageError::AlreadyExists`.
    ///   Callers implement retry (reload CURRENT, rebase, retry).
    ///
    /// ## Crash recovery
    ///
    /// If the commit file is created but updating CURRENT fails, the
    /// orphaned commit file is harmless: readers only consider commits up to
    /// the version in CURRENT. A later writer at the same version observes
    /// `AlreadyExists` and retries at the next version after re-reading
    /// CURRENT.
    ///
    /// ## Steps
    ///
    /// 1. Load CURRENT (advisory check); mismatch returns `Conflict`.
    /// 2. Compute version = expected + 1 (with overflow check).
    /// 3. Stamp the snapshot with the new version and wrap it in a
    ///    [`MetadataCommit`].
    /// 4. Create `_metadata_log/<zero-padded>.json` with create-new
    ///    semantics (the real guard).
    /// 5. Update CURRENT via atomic write.
    pub async fn commit_with_expected_version(
        &self,
        expected: u64,
        metadata: TableMetadata,
    ) -> Result<u64, CommitError> {
        let current = self.load_current_version().await?;
        if current != expected {
            return ConflictSnafu {
                expected,
                found: current,
            }
            .fail();
        }

        let version = expected.checked_add(1).context(CorruptStateSnafu {
            msg: "version counter overflow".to_string(),
        })?;

        let commit = MetadataCommit {
            version,
            base_version: expected,
            timestamp: Utc::now(),
            metadata: metadata.at_version(version),
        };

        let json = serde_json::to_vec(&commit).map_err(|e| CommitError::CorruptState {
            msg: format!("failed to serialize commit {version}: {e}"),
            backtrace: Backtrace::capture(),
        })?;

        let commit_rel = Self::commit_rel_path(version);
        storage::write_new(self.location.as_ref(), &commit_rel, &json)
            .await
            .context(StorageSnafu)?;

        let current_rel = Self::current_rel_path();
        let current_contents = format!("{version}\n");
        storage::write_atomic(
            self.location.as_ref(),
            &current_rel,
            current_contents.as_bytes(),
        )
        .await
        .context(StorageSnafu)?;

        debug!("committed metadata version {version} at {}", self.location);

        Ok(version)
    }
}

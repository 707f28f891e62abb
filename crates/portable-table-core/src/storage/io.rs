//! Async file helpers over a [`StorageLocation`].
//!
//! All functions take a location plus a *relative* path so the path
//! conventions stay in the callers (metadata log layout lives in
//! [`crate::log`]). Writes come in two flavors: [`write_atomic`] for
//! pointer files that are replaced in place, and [`write_new`] for commit
//! files that must be created exactly once.

use std::{
    io,
    path::{Path, PathBuf},
};

use snafu::{IntoError, prelude::*};
use tokio::{fs, io::AsyncWriteExt};

use super::error::{AlreadyExistsSnafu, NotFoundSnafu, OtherIoSnafu};
use crate::storage::{BackendError, StorageLocation, StorageResult};

/// Join a storage location with a relative path into an absolute local path.
fn join_local(location: &StorageLocation, rel: &Path) -> PathBuf {
    match location {
        StorageLocation::Local(root) => root.join(rel),
    }
}

/// Wrap a local I/O result into `StorageError::OtherIo` with path context.
fn local_io<T>(result: io::Result<T>, path: &Path) -> StorageResult<T> {
    result.map_err(BackendError::Local).context(OtherIoSnafu {
        path: path.display().to_string(),
    })
}

async fn create_parent_dir(abs: &Path) -> StorageResult<()> {
    if let Some(parent) = abs.parent() {
        local_io(fs::create_dir_all(parent).await, parent)?;
    }
    Ok(())
}

/// Guard that removes a temporary file on drop unless disarmed.
/// Ensures cleanup on error paths during atomic writes.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Disarm the guard so the file is NOT removed on drop.
    /// Call this after a successful rename.
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            // Best-effort cleanup; we are likely already handling another error.
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Write `contents` to `rel_path` inside `location` using an atomic write.
///
/// Performs a write-then-rename sequence: the payload goes to a temporary
/// file next to the target, is synced, and is then renamed into place so the
/// replacement is atomic.
///
/// # Errors
///
/// Returns [`StorageError::OtherIo`](crate::storage::StorageError) when
/// filesystem I/O fails at any step.
pub async fn write_atomic(
    location: &StorageLocation,
    rel_path: &Path,
    contents: &[u8],
) -> StorageResult<()> {
    let abs = join_local(location, rel_path);
    create_parent_dir(&abs).await?;

    let tmp_path = abs.with_extension("tmp");
    let mut guard = TempFileGuard::new(tmp_path.clone());

    {
        let mut file = local_io(fs::File::create(&tmp_path).await, &tmp_path)?;
        local_io(file.write_all(contents).await, &tmp_path)?;
        local_io(file.sync_all().await, &tmp_path)?;
    }

    local_io(fs::rename(&tmp_path, &abs).await, &abs)?;

    // Renamed into place; nothing left to clean up.
    guard.disarm();

    Ok(())
}

/// Create a *new* file at `rel_path` and write `contents`, failing if the
/// file already exists.
///
/// This is the concurrency guard for commit files: each version must be
/// created exactly once, and a losing writer observes
/// [`StorageError::AlreadyExists`](crate::storage::StorageError).
pub async fn write_new(
    location: &StorageLocation,
    rel_path: &Path,
    contents: &[u8],
) -> StorageResult<()> {
    let abs = join_local(location, rel_path);
    create_parent_dir(&abs).await?;

    let open_result = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&abs)
        .await;

    let mut file = match open_result {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(AlreadyExistsSnafu {
                path: abs.display().to_string(),
            }
            .into_error(BackendError::Local(e)));
        }
        Err(e) => {
            return Err(OtherIoSnafu {
                path: abs.display().to_string(),
            }
            .into_error(BackendError::Local(e)));
        }
    };

    local_io(file.write_all(contents).await, &abs)?;
    local_io(file.sync_all().await, &abs)?;

    Ok(())
}

/// Read the file at `rel_path` within `location` as a `String`.
///
/// A missing file is reported as
/// [`StorageError::NotFound`](crate::storage::StorageError); other
/// filesystem problems as `OtherIo`.
pub async fn read_to_string(location: &StorageLocation, rel_path: &Path) -> StorageResult<String> {
    let abs = join_local(location, rel_path);

    match fs::read_to_string(&abs).await {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(BackendError::Local(e)).context(NotFoundSnafu {
                path: abs.display().to_string(),
            })
        }
        Err(e) => Err(BackendError::Local(e)).context(OtherIoSnafu {
            path: abs.display().to_string(),
        }),
    }
}

/// Read the full contents of the file at `rel_path` within `location`.
///
/// Same error classification as [`read_to_string`].
pub async fn read_all_bytes(location: &StorageLocation, rel_path: &Path) -> StorageResult<Vec<u8>> {
    let abs = join_local(location, rel_path);

    match fs::read(&abs).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(BackendError::Local(e)).context(NotFoundSnafu {
                path: abs.display().to_string(),
            })
        }
        Err(e) => Err(BackendError::Local(e)).context(OtherIoSnafu {
            path: abs.display().to_string(),
        }),
    }
}

/// Check whether `rel_path` exists within `location`.
pub async fn exists(location: &StorageLocation, rel_path: &Path) -> StorageResult<bool> {
    let abs = join_local(location, rel_path);

    match fs::metadata(&abs).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BackendError::Local(e)).context(OtherIoSnafu {
            path: abs.display().to_string(),
        }),
    }
}

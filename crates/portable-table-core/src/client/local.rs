//! Local filesystem storage client.

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use snafu::prelude::*;

use crate::client::{
    ClientClosedSnafu, ClientFactory, ClientResult, OpenFailedSnafu, ReadSnafu, RootNotFoundSnafu,
    StorageClient,
};
use crate::storage::{self, StorageLocation};

/// Storage client reading files under a local table root.
///
/// Each client owns its own closed flag; clients opened against the same
/// root are fully independent.
#[derive(Debug)]
pub struct LocalStorageClient {
    location: StorageLocation,
    closed: AtomicBool,
}

impl LocalStorageClient {
    fn ensure_open(&self) -> ClientResult<()> {
        ensure!(
            !self.closed.load(Ordering::Acquire),
            ClientClosedSnafu {
                location: self.location.to_string(),
            }
        );
        Ok(())
    }
}

#[async_trait]
impl StorageClient for LocalStorageClient {
    fn location(&self) -> &StorageLocation {
        &self.location
    }

    async fn read(&self, rel_path: &Path) -> ClientResult<Bytes> {
        self.ensure_open()?;
        let bytes = storage::read_all_bytes(&self.location, rel_path)
            .await
            .context(ReadSnafu)?;
        Ok(Bytes::from(bytes))
    }

    async fn read_to_string(&self, rel_path: &Path) -> ClientResult<String> {
        self.ensure_open()?;
        storage::read_to_string(&self.location, rel_path)
            .await
            .context(ReadSnafu)
    }

    async fn exists(&self, rel_path: &Path) -> ClientResult<bool> {
        self.ensure_open()?;
        storage::exists(&self.location, rel_path)
            .await
            .context(ReadSnafu)
    }

    async fn close(&self) -> ClientResult<()> {
        self.closed.store(true, Ordering::Release);
        debug!("closed local storage client at {}", self.location);
        Ok(())
    }
}

/// Factory opening [`LocalStorageClient`]s.
#[derive(Debug, Default)]
pub struct LocalClientFactory;

impl LocalClientFactory {
    /// Create the factory.
    pub fn new() -> Self {
        LocalClientFactory
    }
}

#[async_trait]
impl ClientFactory for LocalClientFactory {
    async fn open(&self, location: &StorageLocation) -> ClientResult<Arc<dyn StorageClient>> {
        // Validate the root up front so an unreachable location fails at
        // open time, not on the first read.
        let root_exists = storage::exists(location, Path::new(""))
            .await
            .context(OpenFailedSnafu {
                location: location.to_string(),
            })?;
        ensure!(
            root_exists,
            RootNotFoundSnafu {
                location: location.to_string(),
            }
        );

        debug!("opened local storage client at {location}");
        Ok(Arc::new(LocalStorageClient {
            location: location.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

//! The storage client capability consumed by table handles.
//!
//! A storage client is the external resource a handle owns: something that
//! was really opened (connection setup, root validation) and must really be
//! closed. The contract is deliberately small: openable, closable,
//! independent per open call. Embedders can plug in their own client for
//! object stores or test instrumentation.
//!
//! Handles never construct clients directly; they go through a
//! [`ClientFactory`], which is what makes lazy per-copy acquisition work
//! after deserialization (see [`crate::proxy`]).

use std::{fmt, path::Path, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use snafu::prelude::*;

use crate::storage::{StorageError, StorageLocation};

mod local;

pub use local::{LocalClientFactory, LocalStorageClient};

/// General result type used by client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised by storage clients and factories.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClientError {
    /// Opening a client against a location failed.
    #[snafu(display("cannot open storage client at {location}: {source}"))]
    OpenFailed {
        /// The location that could not be opened.
        location: String,
        /// Underlying storage error.
        source: StorageError,
    },

    /// The location's root directory does not exist.
    #[snafu(display("storage root not found at {location}"))]
    RootNotFound {
        /// The location whose root was missing.
        location: String,
    },

    /// The client was used after `close()`.
    #[snafu(display("storage client at {location} is closed"))]
    ClientClosed {
        /// The location the closed client was bound to.
        location: String,
    },

    /// A read through the client failed at the storage layer.
    #[snafu(display("storage client read failed: {source}"))]
    Read {
        /// Underlying storage error.
        source: StorageError,
    },
}

/// A closable I/O client bound to one storage location.
///
/// Implementations must be independent per open call: two clients opened
/// against the same location share no mutable state, and closing one never
/// affects the other.
#[async_trait]
pub trait StorageClient: fmt::Debug + Send + Sync {
    /// The location this client is bound to.
    fn location(&self) -> &StorageLocation;

    /// Read the full contents of `rel_path` under the client's location.
    async fn read(&self, rel_path: &Path) -> ClientResult<Bytes>;

    /// Read `rel_path` as a UTF-8 string.
    async fn read_to_string(&self, rel_path: &Path) -> ClientResult<String>;

    /// Check whether `rel_path` exists.
    async fn exists(&self, rel_path: &Path) -> ClientResult<bool>;

    /// Tear the client down. Further reads fail with
    /// [`ClientError::ClientClosed`].
    async fn close(&self) -> ClientResult<()>;
}

/// Opens storage clients on demand.
///
/// Factories perform real I/O at open time; they are invoked lazily by a
/// handle's resource slot, at most once per handle instance.
#[async_trait]
pub trait ClientFactory: fmt::Debug + Send + Sync {
    /// Open a fresh client against `location`.
    async fn open(&self, location: &StorageLocation) -> ClientResult<Arc<dyn StorageClient>>;
}

/// The default factory for a location's backend.
pub fn factory_for(location: &StorageLocation) -> Arc<dyn ClientFactory> {
    match location {
        StorageLocation::Local(_) => Arc::new(LocalClientFactory::new()),
    }
}

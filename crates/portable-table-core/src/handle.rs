//! Table handles: a metadata snapshot paired with a per-instance, lazily
//! opened storage client.
//!
//! A [`TableHandle`] is the in-process object a driver hands to execution
//! code. Identity is per-instance, not per-logical-table: two handles
//! pointing at the same storage location are completely independent for
//! resource-lifecycle purposes, which is why handles are not `Clone`.
//! Copies exist only via [`crate::proxy::TableProxy`], and each decoded
//! copy starts with an empty slot.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

mod error;
mod slot;

pub use error::TableError;
pub(crate) use error::{AlreadyExistsSnafu, EmptyTableSnafu, InvalidLocationSnafu, MetadataLogSnafu};
pub use slot::{ResourceSlot, SlotStatus};

use crate::client::{ClientFactory, StorageClient, factory_for};
use crate::log::MetadataLogStore;
use crate::metadata::{LogicalSchema, PartitionSpec, SortOrder, TableMetadata};
use crate::storage::TableLocation;
use crate::transaction::Transaction;
use crate::view::MetadataViewType;

/// What a handle is a handle *to*.
///
/// A closed enumeration instead of open-ended subclassing: every handle
/// variant serializes through the same proxy, and decoders dispatch on this
/// tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HandleKind {
    /// The table itself.
    Base,
    /// A read-only metadata projection of the table.
    MetadataView {
        /// Which projection this handle resolves to.
        view_type: MetadataViewType,
    },
    /// A snapshot of a transaction's pending, uncommitted state.
    Transaction,
}

/// In-process table handle owning one lazily opened storage client.
#[derive(Debug)]
pub struct TableHandle {
    name: String,
    kind: HandleKind,
    metadata: TableMetadata,
    location: TableLocation,
    factory: Arc<dyn ClientFactory>,
    slot: ResourceSlot,
}

impl TableHandle {
    /// Construct a handle over `metadata` with an explicit client factory
    /// and an empty slot.
    ///
    /// # Errors
    /// [`TableError::InvalidLocation`] when the snapshot's location string
    /// does not parse.
    pub fn with_factory(
        name: impl Into<String>,
        kind: HandleKind,
        metadata: TableMetadata,
        factory: Arc<dyn ClientFactory>,
    ) -> Result<Self, TableError> {
        let location =
            TableLocation::parse(metadata.location()).context(InvalidLocationSnafu {
                spec: metadata.location(),
            })?;

        Ok(TableHandle {
            name: name.into(),
            kind,
            metadata,
            location,
            factory,
            slot: ResourceSlot::empty(),
        })
    }

    /// Construct a handle with the default client factory for the
    /// metadata's location backend.
    pub fn new(
        name: impl Into<String>,
        kind: HandleKind,
        metadata: TableMetadata,
    ) -> Result<Self, TableError> {
        let location =
            TableLocation::parse(metadata.location()).context(InvalidLocationSnafu {
                spec: metadata.location(),
            })?;
        let factory = factory_for(location.storage());

        Ok(TableHandle {
            name: name.into(),
            kind,
            metadata,
            location,
            factory,
            slot: ResourceSlot::empty(),
        })
    }

    /// Create a new table at `location` and return a handle to it.
    ///
    /// Writes metadata version 1 through the metadata log.
    ///
    /// # Errors
    /// [`TableError::AlreadyExists`] when the location already carries
    /// commits; [`TableError::MetadataLog`] on log failures.
    pub async fn create(
        location: &TableLocation,
        name: &str,
        schema: LogicalSchema,
        partition_spec: PartitionSpec,
        sort_order: SortOrder,
        properties: BTreeMap<String, String>,
    ) -> Result<Self, TableError> {
        let store = MetadataLogStore::new(location.clone());

        let current = store.load_current_version().await.context(MetadataLogSnafu)?;
        ensure!(
            current == 0,
            AlreadyExistsSnafu {
                current_version: current
            }
        );

        let metadata = TableMetadata::new(
            schema,
            partition_spec,
            sort_order,
            properties,
            location.to_string(),
        );
        let version = store
            .commit_with_expected_version(0, metadata.clone())
            .await
            .context(MetadataLogSnafu)?;

        Self::with_factory(
            name,
            HandleKind::Base,
            metadata.at_version(version),
            factory_for(location.storage()),
        )
    }

    /// Load the current committed version of the table at `location`.
    ///
    /// # Errors
    /// [`TableError::EmptyTable`] when the table has no commits.
    pub async fn load(location: &TableLocation, name: &str) -> Result<Self, TableError> {
        Self::load_with_factory(location, name, factory_for(location.storage())).await
    }

    /// [`TableHandle::load`] with an explicit client factory.
    pub async fn load_with_factory(
        location: &TableLocation,
        name: &str,
        factory: Arc<dyn ClientFactory>,
    ) -> Result<Self, TableError> {
        let store = MetadataLogStore::new(location.clone());

        match store
            .load_current_metadata()
            .await
            .context(MetadataLogSnafu)?
        {
            Some(metadata) => Self::with_factory(name, HandleKind::Base, metadata, factory),
            None => EmptyTableSnafu.fail(),
        }
    }

    /// Name of the handle (for views: `base.label` style).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What this handle resolves to.
    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    /// The immutable metadata snapshot this handle carries.
    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    /// The parsed table root location.
    pub fn location(&self) -> &TableLocation {
        &self.location
    }

    /// Convenience accessor for the snapshot's properties.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        self.metadata.properties()
    }

    /// The handle's storage client, opened through the factory on first
    /// call and cached for the lifetime of this instance.
    ///
    /// Safe under concurrent invocation: construction single-flights, and
    /// every caller observes the same client.
    pub async fn client(&self) -> Result<Arc<dyn StorageClient>, TableError> {
        self.slot
            .acquire(self.factory.as_ref(), self.location.storage(), &self.name)
            .await
    }

    /// Close this handle's storage client, if it was ever opened.
    ///
    /// Only this instance's client is affected; copies obtained via
    /// serialization own their own slots. Closing a handle whose client was
    /// never acquired constructs nothing and succeeds silently; the slot
    /// stays empty, so such a handle may still acquire later. Once a *live*
    /// client is released, further [`TableHandle::client`] calls fail with
    /// [`TableError::ClosedHandle`].
    pub async fn close(&self) -> Result<(), TableError> {
        self.slot.release(&self.name).await
    }

    /// Observable state of the client slot (useful for tests and
    /// diagnostics).
    pub async fn client_status(&self) -> SlotStatus {
        self.slot.status().await
    }

    /// Start a transaction layering pending metadata mutations over this
    /// handle's snapshot.
    pub fn new_transaction(&self) -> Transaction {
        Transaction::begin(self)
    }

    /// The factory used to open this handle's client. Shared with derived
    /// handles (transaction snapshots).
    pub(crate) fn client_factory(&self) -> Arc<dyn ClientFactory> {
        Arc::clone(&self.factory)
    }
}

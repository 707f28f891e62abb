//! Transactions layering pending metadata mutations over a base snapshot.
//!
//! A [`Transaction`] clones the base handle's snapshot and accumulates
//! changes into a *pending* snapshot. Individual operations (like
//! [`UpdateProperties`]) commit into the pending snapshot immediately; the
//! base table is untouched until the transaction's overall
//! [`commit`](Transaction::commit) pushes the pending snapshot through the
//! metadata log's version guard.
//!
//! [`Transaction::table`] exposes the pending state as a full
//! [`TableHandle`] of kind [`HandleKind::Transaction`]: it serializes like
//! any other handle, so workers can observe a transaction's uncommitted
//! state while the driver decides whether to commit.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use snafu::prelude::*;

use crate::client::ClientFactory;
use crate::handle::{HandleKind, MetadataLogSnafu, TableError, TableHandle};
use crate::log::MetadataLogStore;
use crate::metadata::TableMetadata;
use crate::storage::TableLocation;

/// An in-flight set of metadata changes against one table.
#[derive(Debug)]
pub struct Transaction {
    name: String,
    location: TableLocation,
    base: TableMetadata,
    pending: TableMetadata,
    factory: Arc<dyn ClientFactory>,
}

impl Transaction {
    /// Start a transaction over `handle`'s current snapshot.
    pub(crate) fn begin(handle: &TableHandle) -> Self {
        let base = handle.metadata().clone();
        Transaction {
            name: handle.name().to_string(),
            location: handle.location().clone(),
            pending: base.clone(),
            base,
            factory: handle.client_factory(),
        }
    }

    /// The snapshot this transaction started from.
    pub fn base_metadata(&self) -> &TableMetadata {
        &self.base
    }

    /// The snapshot including every change committed into this transaction
    /// so far.
    pub fn pending_metadata(&self) -> &TableMetadata {
        &self.pending
    }

    /// Start a property-update operation.
    ///
    /// Changes take effect on the pending snapshot when the operation's
    /// [`commit`](UpdateProperties::commit) runs, not on the base table.
    pub fn update_properties(&mut self) -> UpdateProperties<'_> {
        UpdateProperties {
            txn: self,
            updates: BTreeMap::new(),
            removals: BTreeSet::new(),
        }
    }

    /// A handle over the pending, uncommitted state.
    ///
    /// The handle owns its own client slot, independent of the base handle
    /// and of any other snapshot of this transaction. Serializing it
    /// preserves the pending state as of this call.
    pub fn table(&self) -> Result<TableHandle, TableError> {
        TableHandle::with_factory(
            self.name.clone(),
            HandleKind::Transaction,
            self.pending.clone(),
            Arc::clone(&self.factory),
        )
    }

    /// Materialize the pending snapshot into the base table.
    ///
    /// Commits through the metadata log with the base version as the guard;
    /// a concurrent commit surfaces as
    /// [`CommitError::Conflict`](crate::log::CommitError) wrapped in
    /// [`TableError::MetadataLog`]. On success, returns a fresh base handle
    /// at the new version.
    pub async fn commit(self) -> Result<TableHandle, TableError> {
        let store = MetadataLogStore::new(self.location.clone());
        let version = store
            .commit_with_expected_version(self.base.version(), self.pending.clone())
            .await
            .context(MetadataLogSnafu)?;

        TableHandle::with_factory(
            self.name,
            HandleKind::Base,
            self.pending.at_version(version),
            self.factory,
        )
    }
}

/// Accumulates property changes, then applies them to the transaction's
/// pending snapshot in one step.
#[derive(Debug)]
pub struct UpdateProperties<'a> {
    txn: &'a mut Transaction,
    updates: BTreeMap<String, String>,
    removals: BTreeSet<String>,
}

impl UpdateProperties<'_> {
    /// Set `key` to `value`. A later `set` of the same key wins; a `set`
    /// cancels a prior `remove` of the same key.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.removals.remove(&key);
        self.updates.insert(key, value.into());
        self
    }

    /// Remove `key`. Cancels a prior `set` of the same key.
    pub fn remove(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.updates.remove(&key);
        self.removals.insert(key);
        self
    }

    /// Apply the accumulated changes to the transaction's pending snapshot.
    ///
    /// The base table is not touched; only the transaction's overall
    /// [`commit`](Transaction::commit) publishes anything.
    pub fn commit(self) {
        let mut properties = self.txn.pending.properties().clone();
        for key in &self.removals {
            properties.remove(key);
        }
        properties.extend(self.updates);
        self.txn.pending = self.txn.pending.clone().with_properties(properties);
    }
}

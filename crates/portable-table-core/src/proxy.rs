//! Wire-safe serialization proxies for table handles.
//!
//! A [`TableProxy`] is the only way a handle crosses a process boundary. It
//! captures the handle's name, kind tag, location, and metadata snapshot,
//! and *structurally cannot* capture the storage client: the proxy type has
//! no slot field, so the explicit serde field list is the include/exclude
//! rule every codec routes through. Decoding always yields a handle with an
//! empty slot and a client factory bound to the decoded location; the copy
//! opens its own client on first use.
//!
//! The proxy also carries a byte-size estimate of the snapshot, computed at
//! `copy_of` time, so schedulers can make cost-based broadcast decisions
//! without re-encoding.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

mod codec;

pub use codec::{BinaryCodec, CodecError, JsonCodec, ProxyCodec, codecs};

use crate::client::ClientFactory;
use crate::handle::{HandleKind, TableError, TableHandle};
use crate::metadata::TableMetadata;

/// Fixed allowance for the proxy's own fields (name, kind, location) on top
/// of the encoded metadata snapshot.
const SIZE_ESTIMATE_OVERHEAD_BYTES: u64 = 64;

/// Errors raised while building a proxy.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProxyError {
    /// The metadata snapshot could not be encoded for the size estimate.
    #[snafu(display("cannot estimate proxy size for table '{name}': {source}"))]
    SizeEstimate {
        /// Name of the handle being proxied.
        name: String,
        /// Underlying JSON encoding error.
        source: serde_json::Error,
    },
}

/// Resource-free, wire-safe snapshot of a [`TableHandle`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableProxy {
    name: String,
    kind: HandleKind,
    location: String,
    metadata: TableMetadata,
    size_estimate_bytes: u64,
}

impl TableProxy {
    /// Capture `handle`'s metadata for transport, discarding any reference
    /// to its storage client.
    ///
    /// The size estimate is computed here, once, from the snapshot's JSON
    /// encoding.
    pub fn copy_of(handle: &TableHandle) -> Result<Self, ProxyError> {
        let metadata = handle.metadata().clone();
        let encoded_len = serde_json::to_vec(&metadata)
            .context(SizeEstimateSnafu {
                name: handle.name(),
            })?
            .len() as u64;

        Ok(TableProxy {
            name: handle.name().to_string(),
            kind: handle.kind(),
            location: metadata.location().to_string(),
            metadata,
            size_estimate_bytes: encoded_len
                + handle.name().len() as u64
                + SIZE_ESTIMATE_OVERHEAD_BYTES,
        })
    }

    /// Name of the proxied handle.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind tag of the proxied handle.
    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    /// Location string of the proxied handle.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The carried metadata snapshot.
    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    /// Approximate in-memory footprint of the proxied handle, for
    /// cost-based broadcast decisions.
    pub fn size_estimate_bytes(&self) -> u64 {
        self.size_estimate_bytes
    }

    /// Rehydrate a handle with a fresh, empty client slot and the default
    /// factory for the decoded location's backend.
    pub fn into_handle(self) -> Result<TableHandle, TableError> {
        TableHandle::new(self.name, self.kind, self.metadata)
    }

    /// [`TableProxy::into_handle`] with an explicit client factory.
    pub fn into_handle_with_factory(
        self,
        factory: Arc<dyn ClientFactory>,
    ) -> Result<TableHandle, TableError> {
        TableHandle::with_factory(self.name, self.kind, self.metadata, factory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::SlotStatus;
    use crate::metadata::{
        LogicalDataType, LogicalField, LogicalSchema, PartitionSpec, SortOrder,
    };
    use std::collections::BTreeMap;

    fn sample_handle() -> TableHandle {
        let schema = LogicalSchema::new(vec![LogicalField {
            name: "id".to_string(),
            data_type: LogicalDataType::Int64,
            nullable: false,
        }])
        .expect("valid sample schema");

        let metadata = TableMetadata::new(
            schema,
            PartitionSpec::unpartitioned(),
            SortOrder::unsorted(),
            BTreeMap::from([("k1".to_string(), "v1".to_string())]),
            "/tmp/tables/orders",
        );

        TableHandle::new("orders", HandleKind::Base, metadata).expect("valid handle")
    }

    #[test]
    fn copy_of_captures_metadata_and_identity() {
        let handle = sample_handle();
        let proxy = TableProxy::copy_of(&handle).unwrap();

        assert_eq!(proxy.name(), "orders");
        assert_eq!(proxy.kind(), HandleKind::Base);
        assert_eq!(proxy.location(), "/tmp/tables/orders");
        assert_eq!(proxy.metadata(), handle.metadata());
    }

    #[test]
    fn size_estimate_tracks_the_snapshot() {
        let handle = sample_handle();
        let proxy = TableProxy::copy_of(&handle).unwrap();

        let encoded = serde_json::to_vec(handle.metadata()).unwrap();
        assert!(proxy.size_estimate_bytes() >= encoded.len() as u64);
    }

    #[tokio::test]
    async fn into_handle_starts_with_an_empty_slot() {
        let handle = sample_handle();
        let proxy = TableProxy::copy_of(&handle).unwrap();

        let copy = proxy.into_handle().unwrap();
        assert_eq!(copy.client_status().await, SlotStatus::Empty);
        assert_eq!(copy.metadata(), handle.metadata());
        assert_eq!(copy.kind(), handle.kind());
    }
}

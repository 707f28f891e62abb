//! Integration tests for serializing transaction handles.
//!
//! A transaction's handle snapshots the pending, uncommitted state; workers
//! receiving a serialized copy must observe the pending values while a
//! freshly loaded base table still reports the committed ones, until the
//! transaction's overall commit publishes them.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::BTreeMap;

use portable_table_core::handle::{HandleKind, TableError, TableHandle};
use portable_table_core::metadata::{
    LogicalDataType, LogicalField, LogicalSchema, PartitionSpec, SortOrder,
};
use portable_table_core::proxy::{TableProxy, codecs};
use portable_table_core::storage::TableLocation;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn sample_schema() -> LogicalSchema {
    LogicalSchema::new(vec![LogicalField {
        name: "id".to_string(),
        data_type: LogicalDataType::Int64,
        nullable: false,
    }])
    .expect("valid test schema")
}

async fn create_sample_table(tmp: &TempDir) -> Result<TableHandle, TableError> {
    let location = TableLocation::local(tmp.path());
    TableHandle::create(
        &location,
        "orders",
        sample_schema(),
        PartitionSpec::unpartitioned(),
        SortOrder::unsorted(),
        BTreeMap::from([
            ("k1".to_string(), "v1".to_string()),
            ("k2".to_string(), "v2".to_string()),
        ]),
    )
    .await
}

#[tokio::test]
async fn serialized_transaction_handles_preserve_pending_state() -> TestResult {
    let tmp = TempDir::new()?;
    let handle = create_sample_table(&tmp).await?;
    let location = TableLocation::local(tmp.path());

    let mut txn = handle.new_transaction();
    txn.update_properties().set("k1", "v1new").commit();
    let txn_handle = txn.table()?;

    for codec in codecs() {
        let proxy = TableProxy::copy_of(&txn_handle)?;
        let decoded = codec.decode(&codec.encode(&proxy)?)?;

        assert_eq!(decoded.kind(), HandleKind::Transaction);
        assert_eq!(
            decoded.metadata().property("k1"),
            Some("v1new"),
            "codec {} lost the pending property",
            codec.name()
        );
        assert_eq!(decoded.metadata().property("k2"), Some("v2"));

        // A worker can rehydrate and use the pending snapshot.
        let copy = decoded.into_handle()?;
        assert_eq!(copy.properties().get("k1").map(String::as_str), Some("v1new"));
        copy.client().await?;
        copy.close().await?;
    }

    // The base table, fetched fresh, still reports the committed value:
    // the transaction has not globally committed.
    let base = TableHandle::load(&location, "orders").await?;
    assert_eq!(base.metadata().property("k1"), Some("v1"));
    assert_eq!(base.metadata().version(), 1);
    Ok(())
}

#[tokio::test]
async fn overall_commit_publishes_what_the_copies_saw() -> TestResult {
    let tmp = TempDir::new()?;
    let handle = create_sample_table(&tmp).await?;
    let location = TableLocation::local(tmp.path());

    let mut txn = handle.new_transaction();
    txn.update_properties().set("k1", "v1new").commit();

    // Snapshot the pending state before the overall commit.
    let pending_proxy = TableProxy::copy_of(&txn.table()?)?;

    let committed = txn.commit().await?;
    assert_eq!(committed.metadata().version(), 2);

    let base = TableHandle::load(&location, "orders").await?;
    assert_eq!(base.metadata().property("k1"), Some("v1new"));
    assert_eq!(
        base.metadata().properties(),
        pending_proxy.metadata().properties()
    );
    Ok(())
}

#[tokio::test]
async fn transaction_copies_do_not_share_clients_with_the_base() -> TestResult {
    let tmp = TempDir::new()?;
    let handle = create_sample_table(&tmp).await?;

    let mut txn = handle.new_transaction();
    txn.update_properties().set("k1", "v1new").commit();
    let txn_handle = txn.table()?;

    handle.client().await?;
    txn_handle.client().await?;

    txn_handle.close().await?;

    // The base handle's client is untouched by closing the transaction
    // handle.
    assert!(handle.client().await.is_ok());
    handle.close().await?;
    Ok(())
}

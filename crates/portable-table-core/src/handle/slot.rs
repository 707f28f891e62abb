//! Per-instance lifecycle holder for a lazily opened storage client.
//!
//! A `ResourceSlot` deliberately replaces any location-keyed shared client
//! cache: every handle instance, including every deserialized copy of a
//! handle, pays one extra client open in exchange for complete freedom
//! from cross-instance lifecycle coupling. Closing one instance's slot can
//! never transition another's, because slots are never shared.
//!
//! State machine: `Empty` → `Open` on first successful acquire,
//! `Open` → `Closed` on release. A failed open leaves the slot `Empty`
//! (acquire may retry); release of an `Empty` or `Closed` slot is a silent
//! no-op; acquire on a `Closed` slot fails and never reopens.

use std::sync::Arc;

use snafu::prelude::*;
use tokio::sync::Mutex;

use crate::client::{ClientFactory, StorageClient};
use crate::handle::error::{ClosedHandleSnafu, ResourceCloseSnafu, ResourceOpenSnafu, TableError};
use crate::storage::StorageLocation;

/// Externally observable state of a [`ResourceSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    /// No client has been constructed yet.
    Empty,
    /// A client is live.
    Open,
    /// The client was released.
    Closed,
}

#[derive(Debug)]
enum SlotState {
    Empty,
    Open(Arc<dyn StorageClient>),
    Closed,
}

/// Lazy, exclusively owned holder for one handle's storage client.
///
/// All transitions happen under one async mutex, which is what makes
/// concurrent use safe:
///
/// - `acquire` holds the lock across client construction, so concurrent
///   acquirers single-flight: exactly one constructs, the rest observe the
///   same client (or, if construction failed, an `Empty` slot they may
///   retry against).
/// - `release` takes the same lock, so it serializes behind an in-flight
///   `acquire` instead of deadlocking or racing it.
#[derive(Debug)]
pub struct ResourceSlot {
    state: Mutex<SlotState>,
}

impl ResourceSlot {
    /// A slot with no client.
    pub(crate) fn empty() -> Self {
        ResourceSlot {
            state: Mutex::new(SlotState::Empty),
        }
    }

    /// Return the slot's client, constructing it through `factory` exactly
    /// once per slot.
    ///
    /// # Errors
    /// - [`TableError::ClosedHandle`] if the slot was already released.
    /// - [`TableError::ResourceOpen`] if construction fails; the slot stays
    ///   `Empty` so a later call may retry.
    pub async fn acquire(
        &self,
        factory: &dyn ClientFactory,
        location: &StorageLocation,
        table: &str,
    ) -> Result<Arc<dyn StorageClient>, TableError> {
        let mut state = self.state.lock().await;
        match &*state {
            SlotState::Open(client) => Ok(Arc::clone(client)),
            SlotState::Closed => ClosedHandleSnafu { name: table }.fail(),
            SlotState::Empty => {
                let client = factory
                    .open(location)
                    .await
                    .context(ResourceOpenSnafu { name: table })?;
                *state = SlotState::Open(Arc::clone(&client));
                Ok(client)
            }
        }
    }

    /// Release the slot's client if one is live.
    ///
    /// `Open` transitions to `Closed` and the client is really closed;
    /// `Empty` and `Closed` slots are left untouched. Idempotent under
    /// concurrent invocation.
    ///
    /// # Errors
    /// [`TableError::ResourceClose`] if the client's teardown fails. The
    /// slot is `Closed` either way.
    pub async fn release(&self, table: &str) -> Result<(), TableError> {
        let mut state = self.state.lock().await;
        if matches!(&*state, SlotState::Open(_)) {
            let prev = std::mem::replace(&mut *state, SlotState::Closed);
            if let SlotState::Open(client) = prev {
                client
                    .close()
                    .await
                    .context(ResourceCloseSnafu { name: table })?;
            }
        }
        Ok(())
    }

    /// The slot's current state.
    pub async fn status(&self) -> SlotStatus {
        match &*self.state.lock().await {
            SlotState::Empty => SlotStatus::Empty,
            SlotState::Open(_) => SlotStatus::Open,
            SlotState::Closed => SlotStatus::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, ClientResult};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Test client that records close calls and refuses reads after close.
    #[derive(Debug)]
    struct StubClient {
        location: StorageLocation,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StorageClient for StubClient {
        fn location(&self) -> &StorageLocation {
            &self.location
        }

        async fn read(&self, _rel_path: &Path) -> ClientResult<Bytes> {
            Ok(Bytes::new())
        }

        async fn read_to_string(&self, _rel_path: &Path) -> ClientResult<String> {
            Ok(String::new())
        }

        async fn exists(&self, _rel_path: &Path) -> ClientResult<bool> {
            Ok(false)
        }

        async fn close(&self) -> ClientResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Factory counting opens; optionally fails the first N opens and can
    /// stall inside open to widen race windows.
    #[derive(Debug, Default)]
    struct StubFactory {
        opens: AtomicUsize,
        closes: Arc<AtomicUsize>,
        fail_first: AtomicUsize,
        open_delay: Option<Duration>,
    }

    #[async_trait]
    impl ClientFactory for StubFactory {
        async fn open(&self, location: &StorageLocation) -> ClientResult<Arc<dyn StorageClient>> {
            if let Some(delay) = self.open_delay {
                tokio::time::sleep(delay).await;
            }
            if self
                .fail_first
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(ClientError::RootNotFound {
                    location: location.to_string(),
                });
            }
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubClient {
                location: location.clone(),
                closes: Arc::clone(&self.closes),
            }))
        }
    }

    fn test_location() -> StorageLocation {
        StorageLocation::local("/tmp/slot-tests")
    }

    #[tokio::test]
    async fn acquire_constructs_once_and_caches() {
        let factory = StubFactory::default();
        let slot = ResourceSlot::empty();
        let location = test_location();

        let a = slot.acquire(&factory, &location, "t").await.unwrap();
        let b = slot.acquire(&factory, &location, "t").await.unwrap();

        assert_eq!(factory.opens.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(slot.status().await, SlotStatus::Open);
    }

    #[tokio::test]
    async fn release_without_acquire_is_a_noop() {
        let slot = ResourceSlot::empty();

        slot.release("t").await.unwrap();

        // Stays Empty: no client was ever constructed, nothing to close.
        assert_eq!(slot.status().await, SlotStatus::Empty);
    }

    #[tokio::test]
    async fn release_closes_exactly_once() {
        let factory = StubFactory::default();
        let slot = ResourceSlot::empty();
        let location = test_location();

        slot.acquire(&factory, &location, "t").await.unwrap();
        slot.release("t").await.unwrap();
        slot.release("t").await.unwrap();

        assert_eq!(factory.closes.load(Ordering::SeqCst), 1);
        assert_eq!(slot.status().await, SlotStatus::Closed);
    }

    #[tokio::test]
    async fn acquire_after_release_fails_closed() {
        let factory = StubFactory::default();
        let slot = ResourceSlot::empty();
        let location = test_location();

        slot.acquire(&factory, &location, "t").await.unwrap();
        slot.release("t").await.unwrap();

        let err = slot
            .acquire(&factory, &location, "t")
            .await
            .expect_err("expected ClosedHandle");
        assert!(matches!(err, TableError::ClosedHandle { .. }));
        // The failed acquire constructed nothing.
        assert_eq!(factory.opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_open_leaves_slot_empty_and_retries() {
        let factory = StubFactory {
            fail_first: AtomicUsize::new(1),
            ..StubFactory::default()
        };
        let slot = ResourceSlot::empty();
        let location = test_location();

        let err = slot
            .acquire(&factory, &location, "t")
            .await
            .expect_err("expected ResourceOpen");
        assert!(matches!(err, TableError::ResourceOpen { .. }));
        assert_eq!(slot.status().await, SlotStatus::Empty);

        // The retry succeeds.
        slot.acquire(&factory, &location, "t").await.unwrap();
        assert_eq!(slot.status().await, SlotStatus::Open);
    }

    #[tokio::test]
    async fn concurrent_acquires_single_flight() {
        let factory = Arc::new(StubFactory {
            open_delay: Some(Duration::from_millis(20)),
            ..StubFactory::default()
        });
        let slot = Arc::new(ResourceSlot::empty());
        let location = test_location();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let slot = Arc::clone(&slot);
            let factory = Arc::clone(&factory);
            let location = location.clone();
            tasks.push(tokio::spawn(async move {
                slot.acquire(factory.as_ref(), &location, "t").await
            }));
        }

        let clients: Vec<_> = join_all(tasks).await;
        assert_eq!(factory.opens.load(Ordering::SeqCst), 1);
        for client in &clients {
            assert!(Arc::ptr_eq(client, &clients[0]));
        }
    }

    #[tokio::test]
    async fn concurrent_release_is_idempotent() {
        let factory = Arc::new(StubFactory::default());
        let slot = Arc::new(ResourceSlot::empty());
        let location = test_location();

        slot.acquire(factory.as_ref(), &location, "t").await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let slot = Arc::clone(&slot);
            tasks.push(tokio::spawn(async move { slot.release("t").await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(factory.closes.load(Ordering::SeqCst), 1);
        assert_eq!(slot.status().await, SlotStatus::Closed);
    }

    async fn join_all(
        tasks: Vec<tokio::task::JoinHandle<Result<Arc<dyn StorageClient>, TableError>>>,
    ) -> Vec<Arc<dyn StorageClient>> {
        let mut out = Vec::new();
        for task in tasks {
            out.push(task.await.unwrap().unwrap());
        }
        out
    }
}

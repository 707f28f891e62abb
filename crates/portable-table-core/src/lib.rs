//! Core engine for portable table handles.
//!
//! This crate provides the foundational pieces for `portable-table`:
//!
//! - An immutable [`metadata::TableMetadata`] snapshot (schema, partition
//!   spec, sort order, properties, location, version) with value semantics
//!   (`metadata` module).
//! - A versioned metadata log with version-guard optimistic concurrency
//!   control, plus the operations interface used to refresh snapshots
//!   (`log` module).
//! - A [`handle::TableHandle`] that pairs a metadata snapshot with a
//!   per-instance, lazily opened storage client (`handle` and `client`
//!   modules).
//! - A wire-safe [`proxy::TableProxy`] that carries a handle's metadata,
//!   and never its storage client, across process boundaries through
//!   pluggable codecs (`proxy` module).
//! - Read-only metadata views (snapshots, history, manifests, ...) over the
//!   same physical table (`view` module).
//! - Transactions that layer pending metadata mutations over a base
//!   snapshot and can be shipped to workers before they commit
//!   (`transaction` module).
//!
//! The central contract: a handle's storage client is owned by exactly one
//! handle instance. Serialized copies never share the origin's client; each
//! copy opens its own on first use, and closing one copy never touches
//! another's.
#![deny(missing_docs)]
pub mod client;
pub mod handle;
pub mod log;
pub mod metadata;
pub mod proxy;
pub mod storage;
pub mod transaction;
pub mod view;

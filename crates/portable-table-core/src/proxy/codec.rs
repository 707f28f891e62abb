//! Codecs for moving proxies across process boundaries.
//!
//! Two unrelated serialization mechanisms share one exclusion rule: both
//! serde into [`TableProxy`]'s declared fields and nothing else. No
//! reflection, no generic field copy, and no path by which a storage client
//! could leak onto the wire. Decoding is all-or-nothing: a corrupt or
//! truncated payload produces [`CodecError::Deserialization`] and never a
//! partially constructed proxy.

use std::fmt;

use snafu::{Backtrace, prelude::*};

use crate::proxy::TableProxy;

/// Errors raised by proxy codecs.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CodecError {
    /// Encoding a proxy failed.
    #[snafu(display("{codec} codec failed to encode proxy: {msg}"))]
    Serialization {
        /// Name of the codec that failed.
        codec: &'static str,
        /// Description of the failure.
        msg: String,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// Decoding produced no valid proxy.
    #[snafu(display("{codec} codec failed to decode proxy: {msg}"))]
    Deserialization {
        /// Name of the codec that failed.
        codec: &'static str,
        /// Description of the failure.
        msg: String,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}

/// A serialization mechanism for [`TableProxy`] values.
pub trait ProxyCodec: fmt::Debug + Send + Sync {
    /// Stable name of this codec (for diagnostics and error messages).
    fn name(&self) -> &'static str;

    /// Encode a proxy to bytes.
    fn encode(&self, proxy: &TableProxy) -> Result<Vec<u8>, CodecError>;

    /// Decode a proxy from bytes, all-or-nothing.
    fn decode(&self, bytes: &[u8]) -> Result<TableProxy, CodecError>;
}

/// Human-inspectable JSON object-graph codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ProxyCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, proxy: &TableProxy) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(proxy).map_err(|e| CodecError::Serialization {
            codec: self.name(),
            msg: e.to_string(),
            backtrace: Backtrace::capture(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<TableProxy, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Deserialization {
            codec: self.name(),
            msg: e.to_string(),
            backtrace: Backtrace::capture(),
        })
    }
}

/// Compact binary codec (bincode, standard configuration).
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl ProxyCodec for BinaryCodec {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn encode(&self, proxy: &TableProxy) -> Result<Vec<u8>, CodecError> {
        bincode::serde::encode_to_vec(proxy, bincode::config::standard()).map_err(|e| {
            CodecError::Serialization {
                codec: self.name(),
                msg: e.to_string(),
                backtrace: Backtrace::capture(),
            }
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<TableProxy, CodecError> {
        let (proxy, consumed) =
            bincode::serde::decode_from_slice::<TableProxy, _>(bytes, bincode::config::standard())
                .map_err(|e| CodecError::Deserialization {
                    codec: self.name(),
                    msg: e.to_string(),
                    backtrace: Backtrace::capture(),
                })?;

        ensure!(
            consumed == bytes.len(),
            DeserializationSnafu {
                codec: self.name(),
                msg: format!(
                    "{} trailing bytes after proxy payload",
                    bytes.len() - consumed
                ),
            }
        );

        Ok(proxy)
    }
}

/// Every codec the crate ships, for exhaustive round-trip testing and for
/// callers that negotiate formats at runtime.
pub fn codecs() -> Vec<Box<dyn ProxyCodec>> {
    vec![Box::new(JsonCodec), Box::new(BinaryCodec)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{HandleKind, TableHandle};
    use crate::metadata::{
        LogicalDataType, LogicalField, LogicalSchema, PartitionSpec, SortOrder, TableMetadata,
    };
    use crate::view::MetadataViewType;
    use std::collections::BTreeMap;

    fn sample_proxy() -> TableProxy {
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
            BTreeMap::from([
                ("k1".to_string(), "v1".to_string()),
                ("k2".to_string(), "v2".to_string()),
            ]),
            "/tmp/tables/orders",
        );

        let handle = TableHandle::new(
            "orders.meta",
            HandleKind::MetadataView {
                view_type: MetadataViewType::Snapshots,
            },
            metadata,
        )
        .expect("valid handle");

        TableProxy::copy_of(&handle).expect("valid proxy")
    }

    #[test]
    fn every_codec_round_trips_the_proxy() {
        let proxy = sample_proxy();

        for codec in codecs() {
            let bytes = codec.encode(&proxy).unwrap();
            let decoded = codec.decode(&bytes).unwrap();
            assert_eq!(decoded, proxy, "codec {} broke round-trip", codec.name());
        }
    }

    #[test]
    fn json_rejects_corrupt_payloads() {
        let err = JsonCodec
            .decode(b"{\"name\": \"orders\", \"kind\"")
            .expect_err("expected Deserialization");
        assert!(matches!(err, CodecError::Deserialization { .. }));
    }

    #[test]
    fn binary_rejects_truncated_payloads() {
        let proxy = sample_proxy();
        let bytes = BinaryCodec.encode(&proxy).unwrap();

        let err = BinaryCodec
            .decode(&bytes[..bytes.len() / 2])
            .expect_err("expected Deserialization");
        assert!(matches!(err, CodecError::Deserialization { .. }));
    }

    #[test]
    fn binary_rejects_trailing_bytes() {
        let proxy = sample_proxy();
        let mut bytes = BinaryCodec.encode(&proxy).unwrap();
        bytes.extend_from_slice(b"junk");

        let err = BinaryCodec
            .decode(&bytes)
            .expect_err("expected Deserialization");
        assert!(
            matches!(err, CodecError::Deserialization { ref msg, .. } if msg.contains("trailing")),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn codecs_disagree_on_bytes_but_agree_on_values() {
        let proxy = sample_proxy();

        let json_bytes = JsonCodec.encode(&proxy).unwrap();
        let binary_bytes = BinaryCodec.encode(&proxy).unwrap();
        assert_ne!(json_bytes, binary_bytes);

        assert_eq!(
            JsonCodec.decode(&json_bytes).unwrap(),
            BinaryCodec.decode(&binary_bytes).unwrap()
        );
    }
}

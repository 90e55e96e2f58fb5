//! Handshake payload codec.
//!
//! The handshake is the data carried inside a
//! [`ControlOp::Handshake`](crate::frame::ControlOp::Handshake) frame: a
//! JSON object naming the protocol and version the sender speaks. Encoding
//! goes through `serde`; decoding inspects the parsed [`serde_json::Value`]
//! field by field so that a missing or wrong-typed field produces the exact
//! [`ProtoError`] variant naming it, rather than a generic parse error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtoError, Result};

/// Protocol name this crate implements.
pub const PROTOCOL_NAME: &str = "sideband";

/// Protocol version this crate implements.
pub const PROTOCOL_VERSION: &str = "1";

/// The payload carried by a handshake control frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakePayload {
    /// Protocol name the sender speaks.
    pub protocol: String,
    /// Protocol version the sender speaks.
    pub version: String,
    /// Opaque identifier of the sending peer, for logging and diagnostics
    /// only; never interpreted by the codec.
    #[serde(rename = "peerId")]
    pub peer_id: String,
    /// Capability names the sender advertises, passed through unchanged.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub caps: Option<Vec<String>>,
    /// Opaque peer metadata, passed through unchanged; unknown entries are
    /// never inspected or validated by this codec.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl HandshakePayload {
    /// Build the handshake payload this crate sends: its own protocol name
    /// and version, for the given peer identifier, with no capabilities or
    /// metadata.
    #[must_use]
    pub fn for_peer(peer_id: impl Into<String>) -> Self {
        Self {
            protocol: PROTOCOL_NAME.to_string(),
            version: PROTOCOL_VERSION.to_string(),
            peer_id: peer_id.into(),
            caps: None,
            metadata: None,
        }
    }

    /// Whether this payload's protocol and version match this crate's.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.protocol == PROTOCOL_NAME && self.version == PROTOCOL_VERSION
    }

    /// Encode to the JSON bytes carried as handshake frame data.
    ///
    /// # Panics
    ///
    /// Never: every field is either a plain `String` or already
    /// JSON-representable, which always serializes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode handshake frame data, validating protocol/version compatibility.
    ///
    /// `caps` and `metadata`, if present, are passed through unchanged;
    /// unknown entries within them are never inspected.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::HandshakeMalformed`] if `data` is not valid
    /// JSON or not a JSON object, [`ProtoError::HandshakeFieldMissing`] if a
    /// required field is absent or not a string, and
    /// [`ProtoError::UnsupportedVersion`] if the protocol/version do not
    /// match this crate's.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(data)
            .map_err(|err| ProtoError::HandshakeMalformed(err.to_string()))?;
        let Value::Object(object) = value else {
            return Err(ProtoError::HandshakeMalformed(
                "handshake payload must be a JSON object".to_string(),
            ));
        };

        let protocol = string_field(&object, "protocol")?;
        let version = string_field(&object, "version")?;
        let peer_id = string_field(&object, "peerId")?;
        let caps = match object.get("caps") {
            Some(Value::Array(items)) => {
                Some(items.iter().filter_map(|item| item.as_str().map(str::to_string)).collect())
            }
            _ => None,
        };
        let metadata = match object.get("metadata") {
            Some(Value::Object(entries)) => Some(
                entries
                    .iter()
                    .filter_map(|(key, value)| value.as_str().map(|value| (key.clone(), value.to_string())))
                    .collect(),
            ),
            _ => None,
        };

        let payload = Self { protocol, version, peer_id, caps, metadata };
        if !payload.is_supported() {
            return Err(ProtoError::UnsupportedVersion {
                protocol: payload.protocol,
                version: payload.version,
            });
        }

        Ok(payload)
    }
}

fn string_field(object: &serde_json::Map<String, Value>, field: &'static str) -> Result<String> {
    match object.get(field) {
        Some(Value::String(text)) => Ok(text.clone()),
        _ => Err(ProtoError::HandshakeFieldMissing(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_handshake_round_trips() {
        let payload = HandshakePayload::for_peer("peer-1");
        let encoded = payload.encode();
        let decoded = HandshakePayload::decode(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn encode_uses_camel_case_peer_id() {
        let payload = HandshakePayload::for_peer("peer-1");
        let encoded = String::from_utf8(payload.encode()).unwrap();
        assert!(encoded.contains("\"peerId\":\"peer-1\""));
        assert!(!encoded.contains("peer_id"));
    }

    #[test]
    fn caps_and_metadata_pass_through_unchanged() {
        let json = br#"{"protocol":"sideband","version":"1","peerId":"p1",
            "caps":["presence","relay"],"metadata":{"region":"eu","build":"unknown-field-ok"}}"#;
        let decoded = HandshakePayload::decode(json).unwrap();
        assert_eq!(decoded.caps, Some(vec!["presence".to_string(), "relay".to_string()]));
        assert_eq!(decoded.metadata.as_ref().unwrap().get("region"), Some(&"eu".to_string()));
    }

    #[test]
    fn absent_caps_and_metadata_decode_to_none() {
        let json = br#"{"protocol":"sideband","version":"1","peerId":"p1"}"#;
        let decoded = HandshakePayload::decode(json).unwrap();
        assert_eq!(decoded.caps, None);
        assert_eq!(decoded.metadata, None);
    }

    #[test]
    fn reject_malformed_json() {
        let err = HandshakePayload::decode(b"not json").unwrap_err();
        assert!(matches!(err, ProtoError::HandshakeMalformed(_)));
    }

    #[test]
    fn reject_non_object_json() {
        let err = HandshakePayload::decode(b"[1,2,3]").unwrap_err();
        assert!(matches!(err, ProtoError::HandshakeMalformed(_)));
    }

    #[test]
    fn reject_missing_field() {
        let err =
            HandshakePayload::decode(br#"{"protocol":"sideband","version":"1"}"#).unwrap_err();
        assert!(matches!(err, ProtoError::HandshakeFieldMissing("peerId")));
    }

    #[test]
    fn reject_wrong_protocol_name() {
        let json = br#"{"protocol":"other","version":"1","peerId":"p"}"#;
        let err = HandshakePayload::decode(json).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::UnsupportedVersion { ref protocol, .. } if protocol == "other"
        ));
    }

    /// Literal scenario: a peer advertising a future major version is
    /// rejected with the exact protocol/version pair it sent, not silently
    /// coerced to this crate's version.
    #[test]
    fn reject_future_version() {
        let json = br#"{"protocol":"sideband","version":"2","peerId":"p1"}"#;
        let err = HandshakePayload::decode(json).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::UnsupportedVersion { ref protocol, ref version }
                if protocol == "sideband" && version == "2"
        ));
    }
}

//! RPC envelope codec.
//!
//! An envelope is the JSON-text payload carried inside a
//! [`sideband_proto::Frame::Message`] body on an `rpc/` subject. It is a
//! tagged union over four variants, discriminated by a `t` field, the same
//! shape a duck-typed JSON RPC wire format takes: decoding inspects the
//! parsed value rather than relying on serde's untagged-enum heuristics, so
//! an unknown tag or a field of the wrong type produces a precise
//! [`EnvelopeError`] instead of a generic deserialization failure.
//!
//! The wire field names (`m`/`p`/`e`/`d`) are fixed by the protocol: any
//! peer implementing this version emits and accepts exactly this shape.
//! Optional fields are omitted entirely when absent, never serialized as
//! `null`.

use serde::Serialize;
use serde_json::{Map, Value};
use sideband_proto::FrameId;
use thiserror::Error;

/// Errors raised while decoding an envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The envelope body was not valid JSON.
    #[error("malformed envelope JSON: {0}")]
    Malformed(String),

    /// The envelope was valid JSON but not an object.
    #[error("envelope must be a JSON object")]
    NotAnObject,

    /// The `t` tag field was missing or not a string.
    #[error("envelope is missing its \"t\" tag field")]
    MissingTag,

    /// The `t` tag was a string, but not one of the four known values.
    #[error("unknown envelope tag {0:?}")]
    UnknownTag(String),

    /// A required field for the tagged variant was missing or wrong-typed.
    #[error("envelope tagged {tag:?} is missing required field {field:?}")]
    FieldMissing {
        /// The `t` tag of the envelope being decoded.
        tag: &'static str,
        /// Name of the missing or malformed field.
        field: &'static str,
    },

    /// The `cid` field was present but not a valid 32-character hex
    /// [`FrameId`].
    #[error("envelope correlation id {0:?} is not a valid frame id")]
    InvalidCid(String),
}

/// A decoded RPC envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// A request awaiting a response, correlated by `cid`.
    Request {
        /// Correlation id the response must echo back.
        cid: FrameId,
        /// Method or operation name (wire field `m`).
        method: String,
        /// Method parameters, opaque to this crate (wire field `p`).
        params: Option<Value>,
    },
    /// A successful response to a prior request.
    Success {
        /// Correlation id of the request this responds to.
        cid: FrameId,
        /// Result payload, opaque to this crate.
        result: Option<Value>,
    },
    /// An error response to a prior request.
    Error {
        /// Correlation id of the request this responds to.
        cid: FrameId,
        /// Numeric application error code.
        code: i64,
        /// Human-readable error message.
        message: String,
        /// Optional opaque error details.
        data: Option<Value>,
    },
    /// A one-way message with no correlation id and no expected response.
    Notification {
        /// Event name (wire field `e`).
        method: String,
        /// Event data, opaque to this crate (wire field `d`).
        params: Option<Value>,
    },
}

impl Envelope {
    /// The correlation id this envelope carries, if any.
    ///
    /// Only [`Envelope::Request`], [`Envelope::Success`] and
    /// [`Envelope::Error`] carry one; [`Envelope::Notification`] never does.
    #[must_use]
    pub const fn cid(&self) -> Option<FrameId> {
        match self {
            Self::Request { cid, .. } | Self::Success { cid, .. } | Self::Error { cid, .. } => {
                Some(*cid)
            }
            Self::Notification { .. } => None,
        }
    }

    /// Encode this envelope to its JSON text form.
    ///
    /// # Panics
    ///
    /// Never: every field either serializes infallibly or is already a
    /// [`Value`].
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let wire = match self {
            Self::Request { cid, method, params } => Wire::Request {
                t: "r",
                cid: cid.to_hex(),
                m: method.clone(),
                p: params.clone(),
            },
            Self::Success { cid, result } => {
                Wire::Success { t: "R", cid: cid.to_hex(), result: result.clone() }
            }
            Self::Error { cid, code, message, data } => Wire::Error {
                t: "E",
                cid: cid.to_hex(),
                code: *code,
                message: message.clone(),
                data: data.clone(),
            },
            Self::Notification { method, params } => {
                Wire::Notification { t: "N", e: method.clone(), d: params.clone() }
            }
        };
        serde_json::to_vec(&wire).unwrap_or_default()
    }

    /// Decode an envelope from its JSON text form.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvelopeError`] naming exactly which field was missing,
    /// wrong-typed, or which tag was unrecognized.
    pub fn decode(data: &[u8]) -> Result<Self, EnvelopeError> {
        let value: Value =
            serde_json::from_slice(data).map_err(|err| EnvelopeError::Malformed(err.to_string()))?;
        let Value::Object(object) = value else {
            return Err(EnvelopeError::NotAnObject);
        };

        let tag = match object.get("t") {
            Some(Value::String(tag)) => tag.as_str(),
            _ => return Err(EnvelopeError::MissingTag),
        };

        match tag {
            "r" => decode_request(&object),
            "R" => decode_success(&object),
            "E" => decode_error(&object),
            "N" => decode_notification(&object),
            other => Err(EnvelopeError::UnknownTag(other.to_string())),
        }
    }
}

fn cid_field(object: &Map<String, Value>, tag: &'static str) -> Result<FrameId, EnvelopeError> {
    match object.get("cid") {
        Some(Value::String(text)) => {
            FrameId::from_hex(text).map_err(|_| EnvelopeError::InvalidCid(text.clone()))
        }
        _ => Err(EnvelopeError::FieldMissing { tag, field: "cid" }),
    }
}

fn string_field(
    object: &Map<String, Value>,
    tag: &'static str,
    field: &'static str,
) -> Result<String, EnvelopeError> {
    match object.get(field) {
        Some(Value::String(text)) => Ok(text.clone()),
        _ => Err(EnvelopeError::FieldMissing { tag, field }),
    }
}

fn optional_field(object: &Map<String, Value>, field: &str) -> Option<Value> {
    object.get(field).cloned()
}

fn decode_request(object: &Map<String, Value>) -> Result<Envelope, EnvelopeError> {
    let cid = cid_field(object, "r")?;
    let method = string_field(object, "r", "m")?;
    let params = optional_field(object, "p");
    Ok(Envelope::Request { cid, method, params })
}

fn decode_success(object: &Map<String, Value>) -> Result<Envelope, EnvelopeError> {
    let cid = cid_field(object, "R")?;
    let result = optional_field(object, "result");
    Ok(Envelope::Success { cid, result })
}

fn decode_error(object: &Map<String, Value>) -> Result<Envelope, EnvelopeError> {
    let cid = cid_field(object, "E")?;
    let code = match object.get("code") {
        Some(Value::Number(number)) => {
            number.as_i64().ok_or(EnvelopeError::FieldMissing { tag: "E", field: "code" })?
        }
        _ => return Err(EnvelopeError::FieldMissing { tag: "E", field: "code" }),
    };
    let message = string_field(object, "E", "message")?;
    let data = optional_field(object, "data");
    Ok(Envelope::Error { cid, code, message, data })
}

fn decode_notification(object: &Map<String, Value>) -> Result<Envelope, EnvelopeError> {
    let method = string_field(object, "N", "e")?;
    let params = optional_field(object, "d");
    Ok(Envelope::Notification { method, params })
}

#[derive(Serialize)]
#[serde(untagged)]
enum Wire {
    Request {
        t: &'static str,
        cid: String,
        m: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        p: Option<Value>,
    },
    Success {
        t: &'static str,
        cid: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
    },
    Error {
        t: &'static str,
        cid: String,
        code: i64,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    Notification {
        t: &'static str,
        e: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        d: Option<Value>,
    },
}

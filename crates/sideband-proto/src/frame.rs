//! Frame encoding and decoding.
//!
//! A frame is a fixed 18-byte header (1-byte kind, 1 reserved flags byte,
//! 16-byte [`FrameId`]) followed by a variant-specific payload. Decoding
//! never allocates beyond copying the payload out of the input buffer, and
//! never panics: every length read is bounds-checked against the bytes
//! actually supplied before it is used as an index.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ProtoError, Result};
use crate::identity::{FrameId, Subject};

const HEADER_LEN: usize = 18;

const KIND_CONTROL: u8 = 0;
const KIND_MESSAGE: u8 = 1;
const KIND_ACK: u8 = 2;
const KIND_ERROR: u8 = 3;

/// Control-frame operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOp {
    /// Opens a connection; carries a [`crate::handshake::HandshakePayload`].
    Handshake,
    /// Liveness probe; carries no data.
    Ping,
    /// Reply to [`ControlOp::Ping`]; carries no data.
    Pong,
    /// Orderly shutdown notice; carries no data.
    Goodbye,
}

impl ControlOp {
    const HANDSHAKE: u8 = 0;
    const PING: u8 = 1;
    const PONG: u8 = 2;
    const GOODBYE: u8 = 3;

    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            Self::HANDSHAKE => Ok(Self::Handshake),
            Self::PING => Ok(Self::Ping),
            Self::PONG => Ok(Self::Pong),
            Self::GOODBYE => Ok(Self::Goodbye),
            other => Err(ProtoError::UnknownControlOp(other)),
        }
    }

    const fn to_byte(self) -> u8 {
        match self {
            Self::Handshake => Self::HANDSHAKE,
            Self::Ping => Self::PING,
            Self::Pong => Self::PONG,
            Self::Goodbye => Self::GOODBYE,
        }
    }

    /// Whether this operation forbids any payload data.
    const fn forbids_data(self) -> bool {
        matches!(self, Self::Ping | Self::Pong | Self::Goodbye)
    }
}

impl fmt::Display for ControlOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Handshake => "handshake",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Goodbye => "goodbye",
        };
        f.write_str(name)
    }
}

/// A decoded frame.
///
/// Every variant carries its own [`FrameId`]; there is no separate "header"
/// type exposed to callers; a decoded frame is immutable and owns its
/// payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Connection-lifecycle control frame.
    Control {
        /// This frame's identifier.
        id: FrameId,
        /// Which control operation this is.
        op: ControlOp,
        /// Opaque payload; non-empty only for [`ControlOp::Handshake`].
        data: Bytes,
    },
    /// Application message on a validated subject.
    Message {
        /// This frame's identifier.
        id: FrameId,
        /// Validated routing key.
        subject: Subject,
        /// Opaque application payload.
        body: Bytes,
    },
    /// Acknowledgement of a previously received frame.
    Ack {
        /// This frame's identifier.
        id: FrameId,
        /// The identifier of the frame being acknowledged.
        target: FrameId,
    },
    /// An application- or protocol-level error report.
    Error {
        /// This frame's identifier.
        id: FrameId,
        /// Numeric error code (`>= 2000` for application errors, one of the
        /// reserved codes in [`crate::error::ErrorCategory`] otherwise).
        code: u16,
        /// Human-readable message, UTF-8.
        message: String,
        /// Optional opaque details following the message, e.g. structured
        /// diagnostic data; empty when the sender attaches none.
        details: Bytes,
    },
}

impl Frame {
    /// This frame's identifier, regardless of variant.
    #[must_use]
    pub const fn id(&self) -> FrameId {
        match self {
            Self::Control { id, .. }
            | Self::Message { id, .. }
            | Self::Ack { id, .. }
            | Self::Error { id, .. } => *id,
        }
    }

    fn kind_byte(&self) -> u8 {
        match self {
            Self::Control { .. } => KIND_CONTROL,
            Self::Message { .. } => KIND_MESSAGE,
            Self::Ack { .. } => KIND_ACK,
            Self::Error { .. } => KIND_ERROR,
        }
    }

    /// Encode this frame to its wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::HandshakeDataMissing`] or
    /// [`ProtoError::ControlDataForbidden`] if this frame's `Control`
    /// payload violates the per-operation data invariant. These fields are
    /// publicly constructible, so encoding re-checks the same invariants
    /// `decode` enforces rather than trusting the caller.
    pub fn encode(&self) -> Result<Bytes> {
        if let Self::Control { op, data, .. } = self {
            if *op == ControlOp::Handshake && data.is_empty() {
                return Err(ProtoError::HandshakeDataMissing);
            }
            if op.forbids_data() && !data.is_empty() {
                return Err(ProtoError::ControlDataForbidden { op: *op, len: data.len() });
            }
        }

        let mut buf = BytesMut::with_capacity(HEADER_LEN + 32);
        buf.put_u8(self.kind_byte());
        buf.put_u8(0); // reserved flags
        buf.put_slice(self.id().as_bytes());

        match self {
            Self::Control { op, data, .. } => {
                buf.put_u8(op.to_byte());
                buf.put_slice(data);
            }
            Self::Message { subject, body, .. } => {
                let subject_bytes = subject.as_str().as_bytes();
                buf.put_u32_le(u32::try_from(subject_bytes.len()).unwrap_or(u32::MAX));
                buf.put_slice(subject_bytes);
                buf.put_slice(body);
            }
            Self::Ack { target, .. } => {
                buf.put_slice(target.as_bytes());
            }
            Self::Error { code, message, details, .. } => {
                buf.put_u16_le(*code);
                let message_bytes = message.as_bytes();
                buf.put_u32_le(u32::try_from(message_bytes.len()).unwrap_or(u32::MAX));
                buf.put_slice(message_bytes);
                buf.put_slice(details);
            }
        }

        Ok(buf.freeze())
    }

    /// Decode a frame from a byte buffer.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtoError`] describing precisely which structural
    /// invariant the buffer violates. The input is never trusted: every
    /// length prefix is checked against the bytes actually remaining before
    /// it is used to slice the buffer.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(ProtoError::FrameTooShort { needed: HEADER_LEN, actual: buf.len() });
        }

        let kind = buf[0];
        let flags = buf[1];
        if flags != 0 {
            return Err(ProtoError::ReservedFlagsSet(flags));
        }
        let id = FrameId::from_bytes(&buf[2..18])?;
        let payload = &buf[HEADER_LEN..];

        match kind {
            KIND_CONTROL => Self::decode_control(id, payload),
            KIND_MESSAGE => Self::decode_message(id, payload),
            KIND_ACK => Self::decode_ack(id, payload),
            KIND_ERROR => Self::decode_error(id, payload),
            other => Err(ProtoError::UnknownFrameKind(other)),
        }
    }

    fn decode_control(id: FrameId, payload: &[u8]) -> Result<Self> {
        let Some((&op_byte, data)) = payload.split_first() else {
            return Err(ProtoError::MissingControlOp);
        };
        let op = ControlOp::from_byte(op_byte)?;

        if op == ControlOp::Handshake && data.is_empty() {
            return Err(ProtoError::HandshakeDataMissing);
        }
        if op.forbids_data() && !data.is_empty() {
            return Err(ProtoError::ControlDataForbidden { op, len: data.len() });
        }

        Ok(Self::Control { id, op, data: Bytes::copy_from_slice(data) })
    }

    fn decode_message(id: FrameId, payload: &[u8]) -> Result<Self> {
        let mut cursor = payload;
        if cursor.remaining() < 4 {
            return Err(ProtoError::MissingSubjectLength);
        }
        let subject_len = cursor.get_u32_le();
        let subject_len = subject_len as usize;
        if subject_len > cursor.remaining() {
            return Err(ProtoError::SubjectLengthOverrun {
                declared: u32::try_from(subject_len).unwrap_or(u32::MAX),
                remaining: cursor.remaining(),
            });
        }

        let subject_bytes = &cursor[..subject_len];
        let subject_text = std::str::from_utf8(subject_bytes)
            .map_err(|_| ProtoError::InvalidUtf8 { field: "subject" })?;
        let subject = Subject::validate(subject_text)?;
        cursor.advance(subject_len);

        Ok(Self::Message { id, subject, body: Bytes::copy_from_slice(cursor) })
    }

    fn decode_ack(id: FrameId, payload: &[u8]) -> Result<Self> {
        if payload.len() != FrameId::LEN {
            return Err(ProtoError::AckPayloadWrongSize(payload.len()));
        }
        let target = FrameId::from_bytes(payload)?;
        Ok(Self::Ack { id, target })
    }

    fn decode_error(id: FrameId, payload: &[u8]) -> Result<Self> {
        let mut cursor = payload;
        if cursor.remaining() < 6 {
            return Err(ProtoError::ErrorHeaderTooShort(payload.len()));
        }
        let code = cursor.get_u16_le();
        let message_len = cursor.get_u32_le() as usize;
        if message_len > cursor.remaining() {
            return Err(ProtoError::ErrorMessageLengthOverrun {
                declared: u32::try_from(message_len).unwrap_or(u32::MAX),
                remaining: cursor.remaining(),
            });
        }

        let message_bytes = &cursor[..message_len];
        let message = std::str::from_utf8(message_bytes)
            .map_err(|_| ProtoError::InvalidUtf8 { field: "error message" })?
            .to_string();
        cursor.advance(message_len);

        Ok(Self::Error { id, code, message, details: Bytes::copy_from_slice(cursor) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handshake_frame() -> Frame {
        Frame::Control {
            id: FrameId::new(),
            op: ControlOp::Handshake,
            data: Bytes::from_static(b"{\"protocol\":\"sideband\"}"),
        }
    }

    #[test]
    fn control_frame_round_trips() {
        let frame = handshake_frame();
        let encoded = frame.encode().unwrap();
        assert_eq!(Frame::decode(&encoded).unwrap(), frame);
    }

    #[test]
    fn message_frame_round_trips() {
        let frame = Frame::Message {
            id: FrameId::new(),
            subject: Subject::validate("event/presence").unwrap(),
            body: Bytes::from_static(b"payload bytes"),
        };
        let encoded = frame.encode().unwrap();
        assert_eq!(Frame::decode(&encoded).unwrap(), frame);
    }

    #[test]
    fn ack_frame_round_trips() {
        let frame = Frame::Ack { id: FrameId::new(), target: FrameId::new() };
        let encoded = frame.encode().unwrap();
        assert_eq!(Frame::decode(&encoded).unwrap(), frame);
    }

    #[test]
    fn error_frame_round_trips() {
        let frame = Frame::Error {
            id: FrameId::new(),
            code: 2001,
            message: "boom".to_string(),
            details: Bytes::new(),
        };
        let encoded = frame.encode().unwrap();
        assert_eq!(Frame::decode(&encoded).unwrap(), frame);
    }

    #[test]
    fn error_frame_with_details_round_trips() {
        let frame = Frame::Error {
            id: FrameId::new(),
            code: 2001,
            message: "boom".to_string(),
            details: Bytes::from_static(b"{\"field\":\"subject\"}"),
        };
        let encoded = frame.encode().unwrap();
        assert_eq!(Frame::decode(&encoded).unwrap(), frame);
    }

    #[test]
    fn reject_truncated_header() {
        let frame = handshake_frame();
        let encoded = frame.encode().unwrap();
        let err = Frame::decode(&encoded[..10]).unwrap_err();
        assert!(matches!(err, ProtoError::FrameTooShort { .. }));
    }

    #[test]
    fn reject_nonzero_reserved_flags() {
        let frame = handshake_frame();
        let mut encoded = frame.encode().unwrap().to_vec();
        encoded[1] = 0x01;
        let err = Frame::decode(&encoded).unwrap_err();
        assert!(matches!(err, ProtoError::ReservedFlagsSet(0x01)));
    }

    #[test]
    fn reject_unknown_frame_kind() {
        let frame = handshake_frame();
        let mut encoded = frame.encode().unwrap().to_vec();
        encoded[0] = 0xFF;
        let err = Frame::decode(&encoded).unwrap_err();
        assert!(matches!(err, ProtoError::UnknownFrameKind(0xFF)));
    }

    #[test]
    fn encode_rejects_empty_handshake_data() {
        let frame = Frame::Control { id: FrameId::new(), op: ControlOp::Handshake, data: Bytes::new() };
        let err = frame.encode().unwrap_err();
        assert!(matches!(err, ProtoError::HandshakeDataMissing));
    }

    #[test]
    fn encode_rejects_data_on_ping() {
        let frame =
            Frame::Control { id: FrameId::new(), op: ControlOp::Ping, data: Bytes::from_static(b"x") };
        let err = frame.encode().unwrap_err();
        assert!(matches!(err, ProtoError::ControlDataForbidden { op: ControlOp::Ping, len: 1 }));
    }

    #[test]
    fn reject_empty_control_payload() {
        let mut buf = BytesMut::new();
        buf.put_u8(KIND_CONTROL);
        buf.put_u8(0);
        buf.put_slice(FrameId::new().as_bytes());
        let err = Frame::decode(&buf).unwrap_err();
        assert!(matches!(err, ProtoError::MissingControlOp));
    }

    #[test]
    fn reject_unknown_control_op() {
        let mut buf = BytesMut::new();
        buf.put_u8(KIND_CONTROL);
        buf.put_u8(0);
        buf.put_slice(FrameId::new().as_bytes());
        buf.put_u8(0xAB);
        let err = Frame::decode(&buf).unwrap_err();
        assert!(matches!(err, ProtoError::UnknownControlOp(0xAB)));
    }

    #[test]
    fn reject_empty_handshake_data() {
        let mut buf = BytesMut::new();
        buf.put_u8(KIND_CONTROL);
        buf.put_u8(0);
        buf.put_slice(FrameId::new().as_bytes());
        buf.put_u8(ControlOp::Handshake.to_byte());
        let err = Frame::decode(&buf).unwrap_err();
        assert!(matches!(err, ProtoError::HandshakeDataMissing));
    }

    #[test]
    fn reject_data_on_ping() {
        let mut buf = BytesMut::new();
        buf.put_u8(KIND_CONTROL);
        buf.put_u8(0);
        buf.put_slice(FrameId::new().as_bytes());
        buf.put_u8(ControlOp::Ping.to_byte());
        buf.put_u8(0x01);
        let err = Frame::decode(&buf).unwrap_err();
        assert!(matches!(err, ProtoError::ControlDataForbidden { op: ControlOp::Ping, len: 1 }));
    }

    #[test]
    fn ping_pong_goodbye_round_trip_with_no_data() {
        for op in [ControlOp::Ping, ControlOp::Pong, ControlOp::Goodbye] {
            let frame = Frame::Control { id: FrameId::new(), op, data: Bytes::new() };
            let encoded = frame.encode().unwrap();
            assert_eq!(Frame::decode(&encoded).unwrap(), frame);
        }
    }

    #[test]
    fn reject_missing_subject_length_prefix() {
        let mut buf = BytesMut::new();
        buf.put_u8(KIND_MESSAGE);
        buf.put_u8(0);
        buf.put_slice(FrameId::new().as_bytes());
        buf.put_u8(0x01);
        buf.put_u8(0x02);
        let err = Frame::decode(&buf).unwrap_err();
        assert!(matches!(err, ProtoError::MissingSubjectLength));
    }

    #[test]
    fn reject_subject_length_overrun() {
        let mut buf = BytesMut::new();
        buf.put_u8(KIND_MESSAGE);
        buf.put_u8(0);
        buf.put_slice(FrameId::new().as_bytes());
        buf.put_u32_le(100);
        buf.put_slice(b"short");
        let err = Frame::decode(&buf).unwrap_err();
        assert!(matches!(err, ProtoError::SubjectLengthOverrun { declared: 100, remaining: 5 }));
    }

    #[test]
    fn reject_invalid_subject_prefix_in_message_frame() {
        let mut buf = BytesMut::new();
        buf.put_u8(KIND_MESSAGE);
        buf.put_u8(0);
        buf.put_slice(FrameId::new().as_bytes());
        let subject = b"invalid/x";
        buf.put_u32_le(subject.len() as u32);
        buf.put_slice(subject);
        let err = Frame::decode(&buf).unwrap_err();
        assert!(matches!(err, ProtoError::InvalidSubject(_)));
    }

    #[test]
    fn reject_ack_wrong_size() {
        let mut buf = BytesMut::new();
        buf.put_u8(KIND_ACK);
        buf.put_u8(0);
        buf.put_slice(FrameId::new().as_bytes());
        buf.put_slice(&[0u8; 10]);
        let err = Frame::decode(&buf).unwrap_err();
        assert!(matches!(err, ProtoError::AckPayloadWrongSize(10)));
    }

    #[test]
    fn reject_error_header_too_short() {
        let mut buf = BytesMut::new();
        buf.put_u8(KIND_ERROR);
        buf.put_u8(0);
        buf.put_slice(FrameId::new().as_bytes());
        buf.put_slice(&[0u8; 3]);
        let err = Frame::decode(&buf).unwrap_err();
        assert!(matches!(err, ProtoError::ErrorHeaderTooShort(3)));
    }

    #[test]
    fn reject_error_message_length_overrun() {
        let mut buf = BytesMut::new();
        buf.put_u8(KIND_ERROR);
        buf.put_u8(0);
        buf.put_slice(FrameId::new().as_bytes());
        buf.put_u16_le(2000);
        buf.put_u32_le(50);
        buf.put_slice(b"short");
        let err = Frame::decode(&buf).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::ErrorMessageLengthOverrun { declared: 50, remaining: 5 }
        ));
    }

    /// Literal wire-format scenario: a handshake control frame whose kind,
    /// flags and op bytes are checked byte-exact, not just round-tripped.
    #[test]
    fn handshake_frame_has_expected_leading_bytes() {
        let id = FrameId::new();
        let frame = Frame::Control {
            id,
            op: ControlOp::Handshake,
            data: Bytes::from_static(b"{}"),
        };
        let encoded = frame.encode().unwrap();
        assert_eq!(encoded[0], KIND_CONTROL);
        assert_eq!(encoded[1], 0);
        assert_eq!(&encoded[2..18], id.as_bytes());
        assert_eq!(encoded[18], ControlOp::Handshake.to_byte());
        assert_eq!(&encoded[19..], b"{}");
    }
}

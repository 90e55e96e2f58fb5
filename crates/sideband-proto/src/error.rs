//! Error taxonomy for the wire codec, identity primitives and handshake.
//!
//! Every variant is fatal at connection scope: the transport driver above
//! this crate is expected to emit an [`ErrorFrame`](crate::Frame::Error)
//! carrying [`ProtoError::category`]'s numeric code and then close the
//! connection. This crate never retries or recovers a codec error itself.

use thiserror::Error;

/// The three reserved error ranges a decode failure is classified into.
///
/// Application errors (code `>= 2000`) are not represented here - they never
/// originate from this crate, only from [`Frame::Error`](crate::Frame::Error)
/// frames an application constructs itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A structurally valid frame that violates a protocol contract (bad
    /// subject, reserved prefix, etc).
    ProtocolViolation,
    /// A handshake whose `protocol`/`version` does not match this crate's.
    UnsupportedVersion,
    /// The buffer could not be parsed into a frame at all.
    InvalidFrame,
}

impl ErrorCategory {
    /// The numeric code to place in an outbound `ErrorFrame`.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::ProtocolViolation => 1000,
            Self::UnsupportedVersion => 1001,
            Self::InvalidFrame => 1002,
        }
    }
}

/// Errors raised by frame decoding, encoding, identity parsing and the
/// handshake payload codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// Buffer shorter than the 18-byte frame header.
    #[error("frame buffer too short: need at least {needed} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum number of bytes required.
        needed: usize,
        /// Number of bytes actually supplied.
        actual: usize,
    },

    /// The reserved flags byte was non-zero.
    #[error("reserved flags byte must be zero in v1, got {0:#04x}")]
    ReservedFlagsSet(u8),

    /// Frame kind discriminant was not one of the four known kinds.
    #[error("unknown frame kind discriminant {0}")]
    UnknownFrameKind(u8),

    /// Control payload did not include an operation byte.
    #[error("control frame is missing its operation byte")]
    MissingControlOp,

    /// Control operation code was not one of the four known operations.
    #[error("unknown control operation code {0}")]
    UnknownControlOp(u8),

    /// Handshake control frame had no data, or empty data.
    #[error("handshake control frame requires non-empty data")]
    HandshakeDataMissing,

    /// Ping/Pong control frame carried data, which is forbidden.
    #[error("{op} control frame must not carry data ({len} bytes present)")]
    ControlDataForbidden {
        /// The operation that forbids data.
        op: crate::frame::ControlOp,
        /// How many bytes of data were present.
        len: usize,
    },

    /// Message frame payload was too short to contain the 4-byte subject
    /// length prefix.
    #[error("message frame is missing its 4-byte subject length prefix")]
    MissingSubjectLength,

    /// Declared subject length ran past the end of the payload.
    #[error(
        "message subject length {declared} exceeds the {remaining} bytes remaining in the payload"
    )]
    SubjectLengthOverrun {
        /// Length declared by the wire prefix.
        declared: u32,
        /// Bytes actually remaining in the payload.
        remaining: usize,
    },

    /// Subject failed the routing-key validator (length, null byte, or
    /// reserved prefix).
    #[error(
        "invalid subject {0:?}: must be 1..=256 UTF-8 bytes, contain no null byte, and start \
         with one of rpc/, event/, stream/, app/"
    )]
    InvalidSubject(String),

    /// Ack payload was not exactly 16 bytes.
    #[error("ack frame payload must be exactly 16 bytes, got {0}")]
    AckPayloadWrongSize(usize),

    /// Error frame payload was shorter than its 6-byte header.
    #[error("error frame payload ({0} bytes) is shorter than the required 6-byte header")]
    ErrorHeaderTooShort(usize),

    /// Declared error-message length ran past the end of the payload.
    #[error(
        "error frame message length {declared} exceeds the {remaining} bytes remaining in the \
         payload"
    )]
    ErrorMessageLengthOverrun {
        /// Length declared by the wire prefix.
        declared: u32,
        /// Bytes actually remaining in the payload.
        remaining: usize,
    },

    /// A string field did not contain valid UTF-8.
    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 {
        /// Name of the field that failed to decode.
        field: &'static str,
    },

    /// A frame identifier was not exactly 16 bytes.
    #[error("frame identifier must be exactly 16 bytes, got {0}")]
    InvalidFrameIdLength(usize),

    /// A hex-encoded frame identifier did not match `[0-9a-f]{{32}}`.
    #[error("invalid frame id hex string: {0:?}")]
    InvalidFrameIdHex(String),

    /// Handshake payload was not a JSON object, or failed to parse as JSON.
    #[error("malformed handshake payload: {0}")]
    HandshakeMalformed(String),

    /// Handshake payload was missing a required field.
    #[error("handshake payload is missing required field {0:?}")]
    HandshakeFieldMissing(&'static str),

    /// Handshake `protocol`/`version` did not match this crate's.
    #[error(
        "unsupported handshake version: expected protocol \"sideband\" version \"1\", got \
         protocol {protocol:?} version {version:?}"
    )]
    UnsupportedVersion {
        /// Protocol name the peer sent.
        protocol: String,
        /// Version string the peer sent.
        version: String,
    },
}

impl ProtoError {
    /// Which reserved error range this failure belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSubject(_) => ErrorCategory::ProtocolViolation,
            Self::UnsupportedVersion { .. } => ErrorCategory::UnsupportedVersion,
            _ => ErrorCategory::InvalidFrame,
        }
    }

    /// The numeric code to place in an outbound `ErrorFrame` for this
    /// failure.
    #[must_use]
    pub const fn code(&self) -> u16 {
        self.category().code()
    }
}

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ProtoError>;

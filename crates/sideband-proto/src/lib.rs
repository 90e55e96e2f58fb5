//! Wire framing, identity primitives and handshake codec for the sideband
//! protocol.
//!
//! This crate owns everything needed to turn a byte stream into frames and
//! back: [`FrameId`] and [`Subject`] as validated value types, [`Frame`] as
//! the wire codec, and [`HandshakePayload`] as the payload carried by the
//! connection-opening control frame. It knows nothing about transports,
//! request/response correlation, or application semantics; those live in
//! `sideband-rpc` and above.
//!
//! # Layout
//!
//! - [`identity`]: [`FrameId`] and [`Subject`]
//! - [`frame`]: [`Frame`], [`frame::ControlOp`], and the wire codec
//! - [`handshake`]: [`HandshakePayload`]
//! - [`error`]: [`ProtoError`] and [`error::ErrorCategory`]

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod frame;
pub mod handshake;
pub mod identity;

pub use error::{ErrorCategory, ProtoError, Result};
pub use frame::{ControlOp, Frame};
pub use handshake::HandshakePayload;
pub use identity::{FrameId, Subject, MAX_SUBJECT_BYTES, SUBJECT_PREFIXES};

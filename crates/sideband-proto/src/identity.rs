//! Frame identifiers and subject validation.
//!
//! Both are value types: cheap to copy or clone, safe to share across
//! threads without synchronization, and carry no behavior beyond the
//! invariants documented on each constructor.

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{ProtoError, Result};

/// Opaque 128-bit frame identifier.
///
/// No bit has meaning; decoders must never interpret a `FrameId` beyond
/// equality and length. Generated fresh per emitted frame with
/// [`FrameId::new`]; receivers must not reuse one in an outbound frame
/// (see [`crate::Frame::Ack`], whose `target` references someone else's id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId([u8; Self::LEN]);

impl FrameId {
    /// Length in bytes of a frame identifier on the wire.
    pub const LEN: usize = 16;

    /// Generate a fresh identifier from a cryptographically secure entropy
    /// source, uniform across all 128 bits.
    #[must_use]
    pub fn new() -> Self {
        let mut bytes = [0u8; Self::LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parse an identifier from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::InvalidFrameIdLength`] unless `bytes.len() ==
    /// 16`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::LEN {
            return Err(ProtoError::InvalidFrameIdLength(bytes.len()));
        }
        let mut buf = [0u8; Self::LEN];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Borrow the raw 16 bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Render as 32 lowercase hex characters.
    #[must_use]
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 32-character lowercase hex string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::InvalidFrameIdHex`] unless the input matches
    /// `[0-9a-f]{32}` exactly (no uppercase, no separators, no surrounding
    /// whitespace).
    pub fn from_hex(text: &str) -> Result<Self> {
        let is_canonical_hex = text.len() == 32
            && text.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !is_canonical_hex {
            return Err(ProtoError::InvalidFrameIdHex(text.to_string()));
        }
        let decoded =
            hex::decode(text).map_err(|_| ProtoError::InvalidFrameIdHex(text.to_string()))?;
        Self::from_bytes(&decoded)
    }
}

impl Default for FrameId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// The four reserved subject prefixes. Closed for v1: adding a fifth is a
/// protocol-version change.
pub const SUBJECT_PREFIXES: [&str; 4] = ["rpc/", "event/", "stream/", "app/"];

/// Maximum subject length in UTF-8 bytes.
pub const MAX_SUBJECT_BYTES: usize = 256;

/// A validated routing key carried on [`crate::Frame::Message`].
///
/// Construction is the only way to obtain one, so a `Subject` in hand is
/// always known-valid: 1 to 256 UTF-8 bytes, no null byte, and beginning
/// with one of [`SUBJECT_PREFIXES`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subject(String);

impl Subject {
    /// Validate a candidate subject string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::InvalidSubject`] if the string is empty,
    /// exceeds 256 UTF-8 bytes, contains a null byte, or does not begin with
    /// one of the four reserved prefixes.
    pub fn validate(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let byte_len = text.len();
        let has_valid_prefix = SUBJECT_PREFIXES.iter().any(|prefix| text.starts_with(prefix));
        if byte_len == 0
            || byte_len > MAX_SUBJECT_BYTES
            || text.as_bytes().contains(&0)
            || !has_valid_prefix
        {
            return Err(ProtoError::InvalidSubject(text));
        }
        Ok(Self(text))
    }

    /// Borrow the validated subject as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Subject {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

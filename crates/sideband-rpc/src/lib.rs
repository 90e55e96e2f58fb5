//! RPC envelope codec and request/response correlation for the sideband
//! protocol.
//!
//! Builds on `sideband_proto`'s frames and identifiers with the layer above
//! them: [`Envelope`] is the JSON-text payload carried on `rpc/` subjects,
//! and [`CorrelationEngine`] tracks which outstanding request a response or
//! rejection belongs to.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod correlation;
pub mod envelope;

pub use correlation::{CompletionFailure, CorrelationEngine, CorrelationError, PendingHandle};
pub use envelope::{Envelope, EnvelopeError};

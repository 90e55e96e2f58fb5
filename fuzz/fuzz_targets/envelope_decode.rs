//! Fuzz target for the RPC envelope codec.
//!
//! # Invariants
//!
//! - `Envelope::decode` never panics on arbitrary bytes, valid UTF-8 or not.
//! - Any envelope that decodes successfully re-encodes to bytes that decode
//!   to an identical envelope.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sideband_rpc::Envelope;

fuzz_target!(|data: &[u8]| {
    if let Ok(envelope) = Envelope::decode(data) {
        let encoded = envelope.encode();
        let redecoded =
            Envelope::decode(&encoded).expect("an envelope we just encoded must decode");
        assert_eq!(redecoded, envelope);
    }
});

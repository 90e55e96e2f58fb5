//! Fuzz target for the frame wire codec.
//!
//! # Invariants
//!
//! - `Frame::decode` never panics on arbitrary bytes.
//! - Any frame that decodes successfully re-encodes to bytes that decode to
//!   an identical frame.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sideband_proto::Frame;

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = Frame::decode(data) {
        let encoded = frame.encode().expect("a successfully decoded frame satisfies its own invariants");
        let redecoded = Frame::decode(&encoded).expect("a frame we just encoded must decode");
        assert_eq!(redecoded, frame);
    }
});

//! Fuzz target for STUN message decoding
//!
//! The decoder must return Ok or Err for any datagram, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use probeip_stun::StunMessage;

fuzz_target!(|data: &[u8]| {
    if let Ok(msg) = StunMessage::decode(data) {
        // Whatever decoded must encode again
        let _ = msg.is_binding_response();
        let _ = msg.xor_mapped_address();
        let _ = msg.encode();
    }
});

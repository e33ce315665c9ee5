//! Fuzz target for decoding arbitrary response text.
//!
//! The decoder must never panic, and every frame it emits must carry data.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ssekit_core::{FrameDecoder, decode_payload};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let mut decoder = FrameDecoder::new();

    for frame in decoder.decode(&text) {
        assert!(!frame.event_type.is_empty());
        let _ = decode_payload(&frame.data);
    }
    assert!(decoder.cursor() <= text.len());
    assert!(text.is_char_boundary(decoder.cursor()));
});

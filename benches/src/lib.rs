//! Benchmarks for ssekit.
//!
//! This crate contains Criterion benchmarks for measuring:
//!
//! - **Decoder**: frame decoding throughput, in one pass and under fine-grained
//!   chunking
//! - **Backoff**: retry delay computation
//! - **Lifecycle**: end-to-end dispatch cost through the client with scripted
//!   collaborators
//!
//! ## Running Benchmarks
//!
//! Run all benchmarks:
//! ```bash
//! cargo bench --package ssekit-benches
//! ```
//!
//! Run specific benchmark:
//! ```bash
//! cargo bench --package ssekit-benches --bench decoder
//! cargo bench --package ssekit-benches --bench backoff
//! cargo bench --package ssekit-benches --bench lifecycle
//! ```
//!
//! Run with fewer samples for quick validation:
//! ```bash
//! cargo bench --package ssekit-benches -- --sample-size 10
//! ```

/// Build a stream body of `frames` frames, each with an id and a JSON payload
/// of roughly `payload_len` bytes.
#[must_use]
pub fn stream_body(frames: usize, payload_len: usize) -> String {
    let filler = "x".repeat(payload_len);
    let mut body = String::new();
    for i in 0..frames {
        body.push_str(&format!(
            "id: {i}\nevent: update\ndata: {{\"seq\":{i},\"text\":\"{filler}\"}}\n\n"
        ));
    }
    body
}

/// Split `body` into pieces of at most `size` bytes, respecting character
/// boundaries.
#[must_use]
pub fn chunks(body: &str, size: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    while start < body.len() {
        let mut end = (start + size.max(1)).min(body.len());
        while !body.is_char_boundary(end) {
            end += 1;
        }
        pieces.push(&body[start..end]);
        start = end;
    }
    pieces
}

//! Structure-aware fuzz target for chunked delivery.
//!
//! Decoding the cumulative text in arbitrary steps must yield exactly the
//! frames a single pass yields.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ssekit_core::FrameDecoder;

#[derive(Debug, Arbitrary)]
struct Input {
    lines: Vec<Line>,
    splits: Vec<u16>,
}

#[derive(Debug, Arbitrary)]
enum Line {
    Event(String),
    Data(String),
    Id(Option<String>),
    Retry(String),
    Comment(String),
    Unknown(String, String),
    Blank,
}

#[derive(Debug, Arbitrary, Clone, Copy)]
enum Terminator {
    Lf,
    CrLf,
    Cr,
}

impl Line {
    fn render(&self, out: &mut String) {
        match self {
            Line::Event(v) => out.push_str(&format!("event: {v}")),
            Line::Data(v) => out.push_str(&format!("data: {v}")),
            Line::Id(Some(v)) => out.push_str(&format!("id: {v}")),
            Line::Id(None) => out.push_str("id"),
            Line::Retry(v) => out.push_str(&format!("retry: {v}")),
            Line::Comment(v) => out.push_str(&format!(": {v}")),
            Line::Unknown(k, v) => out.push_str(&format!("{k}: {v}")),
            Line::Blank => {}
        }
    }
}

fn sanitize(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

fuzz_target!(|input: Input| {
    let mut body = String::new();
    for (i, line) in input.lines.iter().enumerate() {
        let mut rendered = String::new();
        line.render(&mut rendered);
        body.push_str(&sanitize(&rendered));
        body.push_str(match [Terminator::Lf, Terminator::CrLf, Terminator::Cr][i % 3] {
            Terminator::Lf => "\n",
            Terminator::CrLf => "\r\n",
            Terminator::Cr => "\r",
        });
    }

    let mut whole = FrameDecoder::new();
    let expected = whole.decode(&body);

    let mut cuts: Vec<usize> = input
        .splits
        .iter()
        .map(|s| usize::from(*s) % (body.len() + 1))
        .filter(|cut| body.is_char_boundary(*cut))
        .collect();
    cuts.sort_unstable();
    cuts.push(body.len());

    let mut chunked = FrameDecoder::new();
    let mut actual = Vec::new();
    let mut last_cursor = 0;
    for cut in cuts {
        actual.extend(chunked.decode(&body[..cut]));
        assert!(chunked.cursor() >= last_cursor);
        last_cursor = chunked.cursor();
    }

    assert_eq!(actual, expected);
    assert_eq!(chunked.last_event_id(), whole.last_event_id());
    assert_eq!(chunked.reconnect_interval(), whole.reconnect_interval());
});

//! Incremental UTF-8 accumulation of a response body.

/// Accumulates body chunks into text.
///
/// A multi-byte sequence split across chunks is held back until it
/// completes. Invalid sequences become U+FFFD.
#[derive(Debug, Default, Clone)]
pub struct Utf8Body {
    text: String,
    pending: Vec<u8>,
    received: usize,
}

impl Utf8Body {
    /// Create an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk.
    pub fn push(&mut self, chunk: &[u8]) {
        self.received += chunk.len();
        self.pending.extend_from_slice(chunk);

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    self.text
                        .push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(invalid) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + invalid);
                        }
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Text decoded so far.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Total bytes received, including any held back.
    #[must_use]
    pub fn received(&self) -> usize {
        self.received
    }
}

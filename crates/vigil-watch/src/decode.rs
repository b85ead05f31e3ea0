//! Incremental decoding of the raw output stream.
//!
//! A read can end in the middle of a multi-byte character. The decoder
//! buffers the trailing partial character until the rest arrives, so a
//! character is never split across two emitted chunks. Invalid byte
//! sequences become U+FFFD and the stream continues.

use crate::ansi::AnsiFilter;

/// Streaming UTF-8 decoder with partial-character carry.
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Decode as much of the accumulated bytes as possible.
    pub fn feed(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        let mut offset = 0;

        loop {
            match std::str::from_utf8(&self.pending[offset..]) {
                Ok(s) => {
                    out.push_str(s);
                    offset = self.pending.len();
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if let Ok(s) = std::str::from_utf8(&self.pending[offset..offset + valid]) {
                        out.push_str(s);
                    }
                    offset += valid;
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            offset += bad;
                        }
                        // Incomplete trailing character: keep the bytes
                        // for the next feed.
                        None => break,
                    }
                }
            }
        }

        self.pending.drain(..offset);
        out
    }

    /// Bytes held back waiting for the rest of a character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Default for Utf8Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Full decode pipeline for one session: UTF-8 then ANSI stripping.
pub struct StreamDecoder {
    utf8: Utf8Decoder,
    ansi: AnsiFilter,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            utf8: Utf8Decoder::new(),
            ansi: AnsiFilter::new(),
        }
    }

    /// Turn raw bytes into clean text. May return an empty string while
    /// waiting for the rest of a character or escape sequence.
    pub fn feed(&mut self, bytes: &[u8]) -> String {
        let text = self.utf8.feed(bytes);
        if text.is_empty() {
            return text;
        }
        self.ansi.feed(&text)
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

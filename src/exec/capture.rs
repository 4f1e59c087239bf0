// src/exec/capture.rs

//! Bounded prefix capture of a command's output, for the outcome log line.

/// Marker appended to a summary that was cut short.
pub const TRUNCATION_MARKER: &str = "...";

/// Keeps the first few bytes of everything a command writes.
///
/// Only enough bytes to render `limit` characters are stored, so a command
/// producing gigabytes of output costs a few hundred bytes here.
#[derive(Debug, Clone)]
pub struct OutputCapture {
    prefix: Vec<u8>,
    limit: usize,
    byte_cap: usize,
    overflowed: bool,
}

impl OutputCapture {
    /// `limit` is in characters; a UTF-8 character is at most 4 bytes.
    pub fn new(limit: usize) -> Self {
        let byte_cap = limit.saturating_mul(4);
        Self {
            prefix: Vec::with_capacity(byte_cap.min(4096)),
            limit,
            byte_cap,
            overflowed: false,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        let room = self.byte_cap - self.prefix.len();
        if chunk.len() > room {
            self.overflowed = true;
        }
        let take = chunk.len().min(room);
        self.prefix.extend_from_slice(&chunk[..take]);
    }

    /// First `limit` characters of the output, with [`TRUNCATION_MARKER`]
    /// appended when anything was left out.
    pub fn summary(&self) -> String {
        let text = String::from_utf8_lossy(&self.prefix);
        if self.overflowed {
            let head: String = text.chars().take(self.limit).collect();
            format!("{head}{TRUNCATION_MARKER}")
        } else {
            ellipsis(&text, self.limit)
        }
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
pub fn ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}{TRUNCATION_MARKER}", &text[..idx]),
        None => text.to_string(),
    }
}

use log::{debug, warn};

use crate::error::DecodeError;

/// Longest partial line kept while waiting for its terminator.
pub const MAX_PENDING: usize = 64 * 1024;

/// Reassembles `\n`-terminated text lines from arbitrarily split byte chunks.
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
    /// Length of the prefix of `pending` that ends with the last `\n` seen.
    terminated: usize,
    /// Set after an overlong line was dropped; bytes are skipped up to its terminator.
    discarding: bool,
}

impl LineFramer {
    /// Creates an empty framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends received bytes.
    ///
    /// When the unterminated tail grows past [`MAX_PENDING`] it is dropped, since the device is
    /// evidently not sending lines. The rest of that line is skipped as well once it arrives, so
    /// no fragment of it is ever taken for a line of its own.
    pub fn push(&mut self, mut bytes: &[u8]) {
        if self.discarding {
            match bytes.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.discarding = false;
                    bytes = &bytes[end + 1..];
                }
                None => return,
            }
        }

        let start = self.pending.len();
        self.pending.extend_from_slice(bytes);
        if let Some(last) = bytes.iter().rposition(|&b| b == b'\n') {
            self.terminated = start + last + 1;
        }

        let tail = self.pending.len() - self.terminated;
        if tail > MAX_PENDING {
            warn!("Dropping {} bytes received without a line terminator", tail);
            self.pending.truncate(self.terminated);
            self.discarding = true;
        }
    }

    /// Takes the next complete line, decoded and trimmed.
    ///
    /// Invalid UTF-8 is dropped from the line rather than reported.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.pending[..self.terminated]
            .iter()
            .position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=end).collect();
        self.terminated -= end + 1;
        let (text, dropped) = decode_lossy(&raw[..end]);
        if dropped > 0 {
            debug!("{}", DecodeError::InvalidEncoding(dropped));
        }
        Some(text.trim().to_owned())
    }

    /// Discards everything buffered, including a partial line.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.terminated = 0;
        self.discarding = false;
    }

    /// Number of bytes waiting for a terminator.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Decodes UTF-8, skipping invalid sequences. Returns the text and the number of bytes skipped.
fn decode_lossy(bytes: &[u8]) -> (String, usize) {
    let mut text = String::with_capacity(bytes.len());
    let mut dropped = 0;
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                text.push_str(valid);
                return (text, dropped);
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                let skip = e.error_len().unwrap_or(after.len());
                dropped += skip;
                rest = &after[skip..];
            }
        }
    }
}

//! Response buffer
//!
//! Accumulates the decoded text of a raw stream response. Chunks arrive at
//! arbitrary byte boundaries, so a UTF-8 sequence cut in half by the network
//! is held back until the rest of it arrives.

/// Decoded response text with a running character count
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    text: String,
    chars: usize,
    /// Trailing bytes of an incomplete UTF-8 sequence (at most 3)
    pending: Vec<u8>,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk and append it.
    ///
    /// Invalid sequences become U+FFFD. An incomplete sequence at the end of
    /// the chunk is kept for the next call.
    pub fn push_bytes(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut input = bytes.as_slice();
        loop {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    self.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    // Prefix already validated by from_utf8
                    self.push_str(std::str::from_utf8(valid).unwrap_or_default());

                    match e.error_len() {
                        Some(len) => {
                            self.push_str("\u{FFFD}");
                            input = &rest[len..];
                        }
                        None => {
                            self.pending = rest.to_vec();
                            break;
                        }
                    }
                }
            }
        }
    }

    fn push_str(&mut self, s: &str) {
        self.chars += s.chars().count();
        self.text.push_str(s);
    }

    /// Decoded text received so far
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in decoded characters
    pub fn char_len(&self) -> usize {
        self.chars
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_chunks_concatenate() {
        let mut buf = ResponseBuffer::new();
        buf.push_bytes(b"ICY 200 OK\r\n");
        buf.push_bytes(b"icy-name: Test FM\r\n");
        assert_eq!(buf.as_str(), "ICY 200 OK\r\nicy-name: Test FM\r\n");
        assert_eq!(buf.char_len(), buf.as_str().len());
    }

    #[test]
    fn new_buffer_is_empty() {
        let buf = ResponseBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.char_len(), 0);
    }

    #[test]
    fn split_multibyte_sequence_is_reassembled() {
        let bytes = "Motörhead".as_bytes();
        // 'ö' is two bytes starting at index 3
        let mut buf = ResponseBuffer::new();
        buf.push_bytes(&bytes[..4]);
        assert_eq!(buf.as_str(), "Mot");
        buf.push_bytes(&bytes[4..]);
        assert_eq!(buf.as_str(), "Motörhead");
        assert_eq!(buf.char_len(), 9);
    }

    #[test]
    fn four_byte_sequence_split_three_ways() {
        let bytes = "🎵".as_bytes();
        let mut buf = ResponseBuffer::new();
        buf.push_bytes(&bytes[..1]);
        buf.push_bytes(&bytes[1..3]);
        assert!(buf.is_empty());
        buf.push_bytes(&bytes[3..]);
        assert_eq!(buf.as_str(), "🎵");
        assert_eq!(buf.char_len(), 1);
    }

    #[test]
    fn invalid_bytes_become_replacement_chars() {
        let mut buf = ResponseBuffer::new();
        buf.push_bytes(&[b'a', 0xFF, b'b', 0xFE, b'c']);
        assert_eq!(buf.as_str(), "a\u{FFFD}b\u{FFFD}c");
        assert_eq!(buf.char_len(), 5);
    }

    #[test]
    fn char_len_counts_characters_not_bytes() {
        let mut buf = ResponseBuffer::new();
        buf.push_bytes("ééé".as_bytes());
        assert_eq!(buf.as_str().len(), 6);
        assert_eq!(buf.char_len(), 3);
    }
}

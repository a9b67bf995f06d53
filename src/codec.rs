//! Text pipes over the raw byte stream.
//!
//! Outgoing: a line gets exactly one `\n` and is encoded as UTF-8.
//! Incoming: bytes are decoded incrementally, so a multi-byte character
//! split across two reads comes out whole on the second read.

/// Line terminator appended to every outgoing message.
pub const LINE_TERMINATOR: char = '\n';

/// Frame a line for the wire: `line` followed by a single terminator.
///
/// No trimming, no escaping. A line that already ends in `\n` gets a second
/// one; the caller owns the content.
pub fn frame_line(line: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(line.len() + 1);
    bytes.extend_from_slice(line.as_bytes());
    bytes.push(LINE_TERMINATOR as u8);
    bytes
}

/// Incremental UTF-8 decoder for the read side.
///
/// Invalid sequences become U+FFFD. Incomplete trailing sequences (at most
/// three bytes) are held until the next chunk.
#[derive(Debug, Default)]
pub struct TextDecoder {
    pending: Vec<u8>,
}

impl TextDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning all complete characters.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::new();
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    out.push_str(s);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    // Prefix up to valid_up_to() is valid UTF-8
                    out.push_str(std::str::from_utf8(&rest[..valid]).unwrap_or_default());
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &rest[valid + bad..];
                        }
                        None => {
                            // Incomplete sequence at the end: keep for next chunk
                            rest = &rest[valid..];
                            break;
                        }
                    }
                }
            }
        }

        self.pending = rest.to_vec();
        out
    }

    /// Bytes held back waiting for the rest of a character.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_appends_one_newline() {
        assert_eq!(frame_line("A"), b"A\n");
        assert_eq!(frame_line(""), b"\n");
    }

    #[test]
    fn frame_does_not_collapse_existing_newline() {
        assert_eq!(frame_line("LED ON\n"), b"LED ON\n\n");
    }

    #[test]
    fn frame_encodes_utf8() {
        assert_eq!(frame_line("é"), vec![0xC3, 0xA9, b'\n']);
    }

    #[test]
    fn decoder_passes_ascii_through() {
        let mut dec = TextDecoder::new();
        assert_eq!(dec.decode(b"OK\r\n"), "OK\r\n");
        assert_eq!(dec.pending(), 0);
    }

    #[test]
    fn decoder_joins_split_character() {
        let mut dec = TextDecoder::new();
        // "€" is E2 82 AC
        assert_eq!(dec.decode(&[b'x', 0xE2, 0x82]), "x");
        assert_eq!(dec.pending(), 2);
        assert_eq!(dec.decode(&[0xAC, b'y']), "€y");
        assert_eq!(dec.pending(), 0);
    }

    #[test]
    fn decoder_replaces_invalid_bytes() {
        let mut dec = TextDecoder::new();
        assert_eq!(dec.decode(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
    }
}

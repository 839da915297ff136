//! Accumulated session output and marker detection
//!
//! Markers are matched against the whole accumulated buffer, never a single
//! chunk, so a marker split across chunk boundaries is still found.

/// Append-only record of everything the terminal produced
#[derive(Debug, Default, Clone)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
    chunks: usize,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk, returning the offset at which it starts
    pub fn push(&mut self, chunk: &[u8]) -> usize {
        let start = self.bytes.len();
        self.bytes.extend_from_slice(chunk);
        self.chunks += 1;
        start
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of chunks appended so far
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether `needle` occurs anywhere in the buffer
    pub fn contains(&self, needle: &[u8]) -> bool {
        find(&self.bytes, needle)
    }

    /// Whether a match of `needle` ends at or after `offset`
    ///
    /// Only the bytes that could take part in such a match are scanned.
    pub fn contains_since(&self, needle: &[u8], offset: usize) -> bool {
        let from = offset.saturating_sub(needle.len().saturating_sub(1));
        find(&self.bytes[from.min(self.bytes.len())..], needle)
    }

    /// Decode as text; invalid UTF-8 is replaced
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn into_text(self) -> String {
        match String::from_utf8(self.bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

/// A literal watched for in the output; reports its first appearance once
#[derive(Debug, Clone)]
pub struct Marker {
    needle: Vec<u8>,
    seen: bool,
}

impl Marker {
    /// An empty literal never matches
    pub fn new(literal: &str) -> Self {
        Self {
            needle: literal.as_bytes().to_vec(),
            seen: false,
        }
    }

    /// Check the buffer after a chunk starting at `offset` was appended.
    ///
    /// Returns true only on the call where the marker first becomes present.
    pub fn observe(&mut self, buffer: &OutputBuffer, offset: usize) -> bool {
        if self.seen {
            return false;
        }
        self.seen = buffer.contains_since(&self.needle, offset);
        self.seen
    }

    pub fn seen(&self) -> bool {
        self.seen
    }
}

/// Incremental lossy UTF-8 decoding for streamed chunks
///
/// An incomplete sequence at the end of a chunk is held back until the next
/// chunk completes it, so split multibyte characters decode intact.
#[derive(Debug, Default)]
pub struct TextDecoder {
    pending: Vec<u8>,
}

impl TextDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode everything in `chunk` that is complete so far
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut text = String::new();
        let mut rest = &self.pending[..];

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    // valid_up_to guarantees this prefix is UTF-8
                    text.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Incomplete sequence at the end: wait for more bytes
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = rest.to_vec();
        text
    }

    /// Flush a trailing incomplete sequence as replacement characters
    pub fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_concatenates_in_order() {
        let mut buffer = OutputBuffer::new();
        assert_eq!(buffer.push(b"ab"), 0);
        assert_eq!(buffer.push(b""), 2);
        assert_eq!(buffer.push(b"cd"), 2);
        assert_eq!(buffer.as_bytes(), b"abcd");
        assert_eq!(buffer.chunk_count(), 3);
    }

    #[test]
    fn test_marker_split_across_chunks() {
        let mut buffer = OutputBuffer::new();
        let mut marker = Marker::new("Complete!");

        let offset = buffer.push(b"...Com");
        assert!(!marker.observe(&buffer, offset));
        let offset = buffer.push(b"ple");
        assert!(!marker.observe(&buffer, offset));
        let offset = buffer.push(b"te!\n");
        assert!(marker.observe(&buffer, offset));
        assert!(marker.seen());

        // Reported once only
        let offset = buffer.push(b"Complete!");
        assert!(!marker.observe(&buffer, offset));
    }

    #[test]
    fn test_marker_in_single_chunk() {
        let mut buffer = OutputBuffer::new();
        let mut marker = Marker::new("Complete!");
        let offset = buffer.push(b"hi\nComplete!\n");
        assert!(marker.observe(&buffer, offset));
    }

    #[test]
    fn test_incremental_scan_agrees_with_full_scan() {
        let chunks: &[&[u8]] = &[b"C", b"o", b"mp", b"", b"lete", b"!"];
        let mut buffer = OutputBuffer::new();
        for chunk in chunks {
            let offset = buffer.push(chunk);
            assert_eq!(
                buffer.contains_since(b"Complete!", offset),
                buffer.contains(b"Complete!")
            );
        }
        assert!(buffer.contains(b"Complete!"));
    }

    #[test]
    fn test_empty_marker_never_matches() {
        let mut buffer = OutputBuffer::new();
        let mut marker = Marker::new("");
        let offset = buffer.push(b"anything");
        assert!(!marker.observe(&buffer, offset));
    }

    #[test]
    fn test_multibyte_split_decodes_intact() {
        let mut buffer = OutputBuffer::new();
        let check = "✓".as_bytes();
        buffer.push(&check[..1]);
        buffer.push(&check[1..]);
        assert_eq!(buffer.into_text(), "✓");
    }

    #[test]
    fn test_decoder_holds_back_split_character() {
        let check = "✓".as_bytes();
        let mut decoder = TextDecoder::new();
        assert_eq!(decoder.push(b"ok "), "ok ");
        assert_eq!(decoder.push(&check[..1]), "");
        assert_eq!(decoder.push(&check[1..2]), "");
        assert_eq!(decoder.push(&[check[2], b'!']), "✓!");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_decoder_replaces_invalid_bytes() {
        let mut decoder = TextDecoder::new();
        assert_eq!(decoder.push(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_decoder_flushes_truncated_tail() {
        let mut decoder = TextDecoder::new();
        assert_eq!(decoder.push(&"✓".as_bytes()[..2]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }
}

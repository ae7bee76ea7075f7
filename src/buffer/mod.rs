//! Buffer management for process output

mod filter;

pub use filter::OutputFilter;

use crate::pattern::Matcher;
use crate::result::MatchResult;
use bytes::BytesMut;

/// Initial capacity of the accumulator
const INITIAL_CAPACITY: usize = 8192;

/// Accumulates process output until a match consumes it.
///
/// Only the unconsumed tail is kept: a successful match removes everything up
/// to and including the matched bytes, so trimmed output is never scanned
/// again and a later match can only see newer data.
#[derive(Debug)]
pub struct OutputBuffer {
    buffer: BytesMut,
    closed: bool,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBuffer {
    /// Create an empty, open buffer
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY),
            closed: false,
        }
    }

    /// Append data to the buffer
    pub fn append(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Find the first match in the unconsumed output and consume it.
    ///
    /// Returns `None` and leaves the buffer untouched when there is no match.
    pub fn take_match(&mut self, matcher: &dyn Matcher) -> Option<MatchResult> {
        let m = matcher.find(&self.buffer)?;
        let consumed = self.buffer.split_to(m.end);

        Some(MatchResult {
            before: String::from_utf8_lossy(&consumed[..m.start]).into_owned(),
            matched: String::from_utf8_lossy(&consumed[m.start..]).into_owned(),
            captures: m.captures,
        })
    }

    /// Unconsumed output
    #[cfg(test)]
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Unconsumed output as text (lossy UTF-8 conversion)
    pub fn pending_lossy(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }

    /// Mark the stream as finished; no more data will be appended.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Whether the producing process has gone away
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of unconsumed bytes
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether there is no unconsumed output
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;

    fn matcher(pattern: &str) -> Box<dyn Matcher> {
        Pattern::exact(pattern).to_matcher().unwrap()
    }

    #[test]
    fn test_new_buffer() {
        let buffer = OutputBuffer::new();
        assert_eq!(buffer.len(), 0);
        assert!(buffer.is_empty());
        assert!(!buffer.is_closed());
    }

    #[test]
    fn test_multiple_appends() {
        let mut buffer = OutputBuffer::new();
        buffer.append(b"Hello ");
        buffer.append(b"World");
        assert_eq!(buffer.pending(), b"Hello World");
    }

    #[test]
    fn test_take_match_consumes_prefix() {
        let mut buffer = OutputBuffer::new();
        buffer.append(b"echo hi\nhi\n##\nrest");

        let result = buffer.take_match(matcher("##\n").as_ref()).unwrap();
        assert_eq!(result.before, "echo hi\nhi\n");
        assert_eq!(result.matched, "##\n");
        assert_eq!(result.consumed(), "echo hi\nhi\n##\n");
        assert_eq!(buffer.pending(), b"rest");
    }

    #[test]
    fn test_take_match_first_occurrence() {
        let mut buffer = OutputBuffer::new();
        buffer.append(b"a\n##\nb\n##\n");

        let first = buffer.take_match(matcher("##\n").as_ref()).unwrap();
        assert_eq!(first.before, "a\n");

        let second = buffer.take_match(matcher("##\n").as_ref()).unwrap();
        assert_eq!(second.before, "b\n");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_no_match_leaves_buffer() {
        let mut buffer = OutputBuffer::new();
        buffer.append(b"partial #");

        assert!(buffer.take_match(matcher("##\n").as_ref()).is_none());
        assert_eq!(buffer.pending(), b"partial #");

        // The rest of the pattern arrives later.
        buffer.append(b"#\n");
        let result = buffer.take_match(matcher("##\n").as_ref()).unwrap();
        assert_eq!(result.before, "partial ");
    }

    #[test]
    fn test_consumed_bytes_not_rescanned() {
        let mut buffer = OutputBuffer::new();
        buffer.append(b"token");
        buffer.take_match(matcher("token").as_ref()).unwrap();

        assert!(buffer.take_match(matcher("token").as_ref()).is_none());
    }

    #[test]
    fn test_close_keeps_pending() {
        let mut buffer = OutputBuffer::new();
        buffer.append(b"last words");
        buffer.close();

        assert!(buffer.is_closed());
        assert_eq!(buffer.pending_lossy(), "last words");
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let mut buffer = OutputBuffer::new();
        buffer.append(&[0xFF, b'#', b'#']);

        let result = buffer.take_match(matcher("##").as_ref()).unwrap();
        assert_eq!(result.before, "\u{FFFD}");
        assert_eq!(result.matched, "##");
    }
}

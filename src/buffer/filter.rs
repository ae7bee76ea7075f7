//! Terminal output cleanup applied before bytes reach the buffer.
//!
//! A PTY line discipline rewrites `\n` as `\r\n`, and interactive shells
//! sprinkle escape sequences (bracketed paste toggles, window titles) around
//! their prompts. Both are removed here so that prompts and command output can
//! be matched as plain text. Reads from the PTY split the stream at arbitrary
//! points, so the filter keeps its state between calls.

const ESC: u8 = 0x1b;
const BEL: u8 = 0x07;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EscapeState {
    Ground,
    /// Saw ESC
    Escape,
    /// Inside `ESC [` until a final byte
    Csi,
    /// Inside `ESC ]` (or `ESC P`) until BEL or `ESC \`
    Osc,
    /// Saw ESC inside an OSC string
    OscEscape,
    /// `ESC (` / `ESC )` waiting for the designator byte
    Charset,
}

/// Stateful filter for raw PTY output.
#[derive(Debug, Clone)]
pub struct OutputFilter {
    strip_ansi: bool,
    normalize_newlines: bool,
    state: EscapeState,
    pending_cr: bool,
}

impl OutputFilter {
    /// Create a filter.
    ///
    /// * `strip_ansi` - drop ANSI escape sequences
    /// * `normalize_newlines` - turn `\r\n` (and `\r\r\n`) into `\n`
    pub fn new(strip_ansi: bool, normalize_newlines: bool) -> Self {
        Self {
            strip_ansi,
            normalize_newlines,
            state: EscapeState::Ground,
            pending_cr: false,
        }
    }

    /// Filter one chunk of output.
    ///
    /// A trailing `\r` is held back until the next byte shows whether it
    /// belongs to a line ending.
    pub fn filter(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        for &byte in data {
            if self.strip_ansi && self.consume_escape(byte) {
                continue;
            }
            self.emit(byte, &mut out);
        }
        out
    }

    /// Flush held-back state at end of stream.
    pub fn finish(&mut self) -> Vec<u8> {
        self.state = EscapeState::Ground;
        if std::mem::take(&mut self.pending_cr) {
            vec![b'\r']
        } else {
            Vec::new()
        }
    }

    /// Returns `true` if `byte` belongs to an escape sequence.
    fn consume_escape(&mut self, byte: u8) -> bool {
        self.state = match self.state {
            EscapeState::Ground => {
                if byte != ESC {
                    return false;
                }
                EscapeState::Escape
            }
            EscapeState::Escape => match byte {
                b'[' => EscapeState::Csi,
                b']' | b'P' => EscapeState::Osc,
                b'(' | b')' => EscapeState::Charset,
                _ => EscapeState::Ground,
            },
            EscapeState::Csi => {
                if (0x40..=0x7e).contains(&byte) {
                    EscapeState::Ground
                } else {
                    EscapeState::Csi
                }
            }
            EscapeState::Osc => match byte {
                BEL => EscapeState::Ground,
                ESC => EscapeState::OscEscape,
                _ => EscapeState::Osc,
            },
            EscapeState::OscEscape => match byte {
                b'\\' => EscapeState::Ground,
                ESC => EscapeState::OscEscape,
                _ => EscapeState::Osc,
            },
            EscapeState::Charset => EscapeState::Ground,
        };
        true
    }

    fn emit(&mut self, byte: u8, out: &mut Vec<u8>) {
        if !self.normalize_newlines {
            out.push(byte);
            return;
        }

        match byte {
            b'\r' => {
                // Collapse "\r\r\n" to "\n": keep only one pending CR.
                self.pending_cr = true;
            }
            b'\n' => {
                self.pending_cr = false;
                out.push(b'\n');
            }
            _ => {
                if std::mem::take(&mut self.pending_cr) {
                    out.push(b'\r');
                }
                out.push(byte);
            }
        }
    }
}

impl Default for OutputFilter {
    fn default() -> Self {
        Self::new(true, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run(filter: &mut OutputFilter, chunks: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(filter.filter(chunk));
        }
        out.extend(filter.finish());
        out
    }

    #[test]
    fn test_crlf_normalized() {
        let mut filter = OutputFilter::default();
        assert_eq!(run(&mut filter, &[b"foobar\r\n##\r\n"]), b"foobar\n##\n");
    }

    #[test]
    fn test_crlf_split_across_reads() {
        let mut filter = OutputFilter::default();
        assert_eq!(filter.filter(b"foobar\r"), b"foobar");
        assert_eq!(filter.filter(b"\n##"), b"\n##");
    }

    #[test]
    fn test_double_cr_collapsed() {
        let mut filter = OutputFilter::default();
        assert_eq!(run(&mut filter, &[b"x\r\r\n"]), b"x\n");
    }

    #[test]
    fn test_lone_cr_kept() {
        let mut filter = OutputFilter::default();
        assert_eq!(run(&mut filter, &[b"50%\r", b"100%"]), b"50%\r100%");
    }

    #[test]
    fn test_trailing_cr_flushed_at_end() {
        let mut filter = OutputFilter::default();
        assert_eq!(filter.filter(b"abc\r"), b"abc");
        assert_eq!(filter.finish(), b"\r");
        assert!(filter.finish().is_empty());
    }

    #[test]
    fn test_normalization_disabled() {
        let mut filter = OutputFilter::new(false, false);
        assert_eq!(run(&mut filter, &[b"a\r\n\x1b[1mb"]), b"a\r\n\x1b[1mb");
    }

    #[test]
    fn test_strip_csi() {
        let mut filter = OutputFilter::new(true, false);
        assert_eq!(
            run(&mut filter, &[b"Hello \x1b[31mred\x1b[0m world"]),
            b"Hello red world"
        );
    }

    #[test]
    fn test_strip_bracketed_paste_around_prompt() {
        let mut filter = OutputFilter::default();
        let raw: &[u8] = b"echo hi\r\n\x1b[?2004l\rhi\r\n\x1b[?2004h##\r\n";
        assert_eq!(run(&mut filter, &[raw]), b"echo hi\n\rhi\n##\n");
    }

    #[test]
    fn test_strip_csi_split_across_reads() {
        let mut filter = OutputFilter::default();
        assert_eq!(run(&mut filter, &[b"a\x1b", b"[3", b"1mb"]), b"ab");
    }

    #[test]
    fn test_strip_osc_bel_and_st() {
        let mut filter = OutputFilter::default();
        assert_eq!(
            run(&mut filter, &[b"x\x1b]0;title\x07y\x1b]2;t\x1b", b"\\z"]),
            b"xyz"
        );
    }

    #[test]
    fn test_strip_charset_and_two_byte() {
        let mut filter = OutputFilter::default();
        assert_eq!(run(&mut filter, &[b"\x1b(Bab\x1b=c"]), b"abc");
    }

    fn split_points() -> impl Strategy<Value = (Vec<u8>, Vec<usize>)> {
        let alphabet = prop::sample::select(vec![
            b'a', b'#', b'\r', b'\n', ESC, b'[', b']', b'm', b'?', b'2', BEL, b'\\', b'(',
        ]);
        prop::collection::vec(alphabet, 0..64).prop_flat_map(|data| {
            let len = data.len();
            (Just(data), prop::collection::vec(0..=len, 0..6))
        })
    }

    proptest! {
        #[test]
        fn prop_chunking_does_not_change_output((data, mut cuts) in split_points()) {
            let mut whole = OutputFilter::default();
            let expected = run(&mut whole, &[data.as_slice()]);

            cuts.sort_unstable();
            let mut chunks = Vec::new();
            let mut start = 0;
            for cut in cuts {
                chunks.push(&data[start..cut]);
                start = cut;
            }
            chunks.push(&data[start..]);

            let mut split = OutputFilter::default();
            prop_assert_eq!(run(&mut split, &chunks), expected);
        }

        #[test]
        fn prop_no_crlf_survives(data in prop::collection::vec(any::<u8>(), 0..128)) {
            let mut filter = OutputFilter::default();
            let out = run(&mut filter, &[data.as_slice()]);
            prop_assert!(!out.windows(2).any(|w| w == b"\r\n"));
        }
    }
}

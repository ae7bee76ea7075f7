//! Pattern matcher implementations

use crate::result::PatternError;
use regex::bytes::Regex;

/// Location of a match inside the unconsumed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Start position of the match
    pub start: usize,
    /// End position of the match (exclusive)
    pub end: usize,
    /// Captured groups (for regex)
    pub captures: Vec<String>,
}

/// Trait for pattern matching.
///
/// Implementations must report the earliest match in `buffer`, so that a
/// prompt is detected at its first occurrence rather than after later output.
pub trait Matcher: Send + Sync {
    /// Find the first match in the buffer
    fn find(&self, buffer: &[u8]) -> Option<Match>;
}

/// Literal byte-string matcher using the Boyer-Moore-Horspool algorithm
pub struct ExactMatcher {
    pattern: Vec<u8>,
    bad_char_table: [usize; 256],
}

impl ExactMatcher {
    /// Create a new exact matcher
    pub fn new(pattern: impl Into<Vec<u8>>) -> Result<Self, PatternError> {
        let pattern = pattern.into();

        if pattern.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        let last = pattern.len() - 1;
        let mut bad_char_table = [pattern.len(); 256];
        for (i, &byte) in pattern[..last].iter().enumerate() {
            bad_char_table[byte as usize] = last - i;
        }

        Ok(Self {
            pattern,
            bad_char_table,
        })
    }
}

impl Matcher for ExactMatcher {
    fn find(&self, buffer: &[u8]) -> Option<Match> {
        let len = self.pattern.len();
        let mut pos = 0;

        while pos + len <= buffer.len() {
            let window = &buffer[pos..pos + len];
            if window == self.pattern.as_slice() {
                return Some(Match {
                    start: pos,
                    end: pos + len,
                    captures: vec![],
                });
            }
            pos += self.bad_char_table[window[len - 1] as usize];
        }

        None
    }
}

/// Regular expression matcher over raw bytes.
///
/// Works on output that is not valid UTF-8; captures are converted lossily.
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    /// Wrap an already compiled regex
    pub fn new(regex: Regex) -> Self {
        Self { regex }
    }

    /// Compile a regex matcher from source
    #[cfg(test)]
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self::new(Regex::new(pattern)?))
    }
}

impl Matcher for RegexMatcher {
    fn find(&self, buffer: &[u8]) -> Option<Match> {
        let captures = self.regex.captures(buffer)?;
        let full_match = captures.get(0)?;

        let capture_strings = captures
            .iter()
            .map(|group| {
                group
                    .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
                    .unwrap_or_default()
            })
            .collect();

        Some(Match {
            start: full_match.start(),
            end: full_match.end(),
            captures: capture_strings,
        })
    }
}

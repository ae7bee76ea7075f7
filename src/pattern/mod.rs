//! Pattern matching for expect operations

mod matcher;

pub(crate) use matcher::Matcher;

use crate::result::PatternError;
use regex::bytes::Regex;

/// Pattern types for matching process output.
///
/// Literal matching is the core of prompt detection; regular expressions are
/// an alternate matcher behind the same internal matcher contract and do not change
/// how the output buffer is scanned or trimmed.
///
/// # Examples
///
/// ```
/// use shellexpect::Pattern;
///
/// // Literal prompt (fastest)
/// let p1 = Pattern::exact("##\n");
///
/// // Regular expression
/// let p2 = Pattern::regex(r"\$ $").unwrap();
///
/// // Strings convert to literal patterns
/// let p3: Pattern = "password: ".into();
/// ```
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Literal match.
    ///
    /// Uses the Boyer-Moore-Horspool algorithm; the first occurrence in the
    /// unconsumed output wins.
    Exact(String),

    /// Regular expression match over raw bytes.
    ///
    /// The matched text and all capture groups are returned in the
    /// `MatchResult`.
    Regex(Regex),
}

impl Pattern {
    /// Create a literal pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use shellexpect::Pattern;
    ///
    /// let pattern = Pattern::exact("$ ");
    /// let pattern2 = Pattern::exact(String::from(">>> "));
    /// ```
    pub fn exact(s: impl Into<String>) -> Self {
        Pattern::Exact(s.into())
    }

    /// Create a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidRegex`] if the pattern does not compile.
    ///
    /// # Examples
    ///
    /// ```
    /// use shellexpect::Pattern;
    ///
    /// let pattern = Pattern::regex(r"(\w+)@(\w+)\.(\w+)").unwrap();
    /// let pattern2 = Pattern::regex(r"(?i)password:").unwrap();
    /// ```
    pub fn regex(pattern: &str) -> Result<Self, PatternError> {
        Ok(Pattern::Regex(Regex::new(pattern)?))
    }

    /// Convert pattern to a matcher implementation
    pub(crate) fn to_matcher(&self) -> Result<Box<dyn Matcher>, PatternError> {
        use matcher::{ExactMatcher, RegexMatcher};

        match self {
            Pattern::Exact(s) => Ok(Box::new(ExactMatcher::new(s.as_bytes())?)),
            Pattern::Regex(r) => Ok(Box::new(RegexMatcher::new(r.clone()))),
        }
    }

    /// Human readable form, used in log events.
    pub(crate) fn describe(&self) -> String {
        match self {
            Pattern::Exact(s) => format!("{s:?}"),
            Pattern::Regex(r) => format!("/{}/", r.as_str()),
        }
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Pattern::exact(s)
    }
}

impl From<String> for Pattern {
    fn from(s: String) -> Self {
        Pattern::Exact(s)
    }
}

impl From<&String> for Pattern {
    fn from(s: &String) -> Self {
        Pattern::exact(s.as_str())
    }
}

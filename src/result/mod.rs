//! Result types for expect operations

mod error;

pub use error::{ExpectError, PatternError};

/// Result of a successful pattern match.
///
/// A match consumes everything from the start of the retained output up to
/// and including the matched text; `before` and `matched` together are that
/// consumed region.
///
/// # Examples
///
/// ```no_run
/// use shellexpect::{Expect, Pattern};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let process = Expect::builder("sh").spawn()?;
/// process.send_line("uptime").await?;
///
/// let result = process.expect(Pattern::exact("$ ")).await?;
/// println!("Before prompt: {}", result.before);
/// println!("Prompt: {}", result.matched);
/// # Ok(())
/// # }
/// ```
///
/// # Regex Captures
///
/// ```no_run
/// use shellexpect::{Expect, Pattern};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let process = Expect::builder("echo").arg("user@example.com").spawn()?;
/// let pattern = Pattern::regex(r"(\w+)@(\w+)\.(\w+)")?;
/// let result = process.expect(pattern).await?;
///
/// // captures[0] is the full match
/// println!("User: {}", result.captures[1]);
/// println!("Domain: {}", result.captures[2]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Output that arrived before the match.
    ///
    /// For a prompt pattern this is the output of the last command.
    pub before: String,

    /// The matched text.
    pub matched: String,

    /// Captured groups (regex patterns only).
    ///
    /// `captures[0]` is the whole match; optional groups that did not
    /// participate are empty strings.
    pub captures: Vec<String>,
}

impl MatchResult {
    /// Everything the match consumed: `before` followed by `matched`.
    pub fn consumed(&self) -> String {
        let mut text = String::with_capacity(self.before.len() + self.matched.len());
        text.push_str(&self.before);
        text.push_str(&self.matched);
        text
    }
}

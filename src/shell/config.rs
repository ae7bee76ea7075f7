//! Shell dialect and framing configuration

use std::time::Duration;

/// How the echo of a submitted command shows up in its output.
///
/// A terminal with echo enabled reflects the command line back before the
/// command's own output. Programs such as `stty -echo`, or a container
/// runtime that echoes on its own, change this during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoMode {
    /// Drop the first line only if it is the command itself.
    #[default]
    Detect,
    /// Always drop the first line.
    Echoed,
    /// Never drop a line; the terminal does not echo.
    Silent,
}

/// Configuration for a [`ShellSession`](crate::ShellSession).
///
/// # Defaults
///
/// - Prompt variable: none (the caller sets the prompt, e.g. via `PS1=...`
///   in the process environment)
/// - Line terminator: `"\n"`
/// - Echo: [`EchoMode::Detect`]
/// - Timeouts: the wrapped process's default timeout
///
/// # Examples
///
/// ```
/// use shellexpect::{EchoMode, ShellConfig};
/// use std::time::Duration;
///
/// let config = ShellConfig::zsh("##\n")
///     .echo_mode(EchoMode::Silent)
///     .command_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.prompt_variable_name(), Some("PROMPT"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub(crate) sentinel: String,
    pub(crate) prompt_variable: Option<String>,
    pub(crate) line_terminator: String,
    pub(crate) echo: EchoMode,
    pub(crate) init_timeout: Option<Duration>,
    pub(crate) command_timeout: Option<Duration>,
}

impl ShellConfig {
    /// Frame commands with `sentinel`; the prompt is set up by the caller.
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
            prompt_variable: None,
            line_terminator: "\n".to_string(),
            echo: EchoMode::default(),
            init_timeout: None,
            command_timeout: None,
        }
    }

    /// POSIX shells (`sh`, `bash`, `dash`): `init()` assigns the sentinel to `PS1`.
    pub fn posix(sentinel: impl Into<String>) -> Self {
        Self::new(sentinel).prompt_variable("PS1")
    }

    /// zsh: `init()` assigns the sentinel to `PROMPT`.
    pub fn zsh(sentinel: impl Into<String>) -> Self {
        Self::new(sentinel).prompt_variable("PROMPT")
    }

    /// Have `init()` assign the sentinel to `variable`.
    pub fn prompt_variable(mut self, variable: impl Into<String>) -> Self {
        self.prompt_variable = Some(variable.into());
        self
    }

    /// Bytes appended to every command line (default `"\n"`).
    pub fn line_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.line_terminator = terminator.into();
        self
    }

    /// Set how the command echo is removed.
    pub fn echo_mode(mut self, echo: EchoMode) -> Self {
        self.echo = echo;
        self
    }

    /// Timeout for the first prompt during `init()`.
    pub fn init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = Some(timeout);
        self
    }

    /// Timeout for each `run()`.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Set both the init and the command timeout.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.init_timeout(timeout).command_timeout(timeout)
    }

    /// The prompt string that marks the end of each command.
    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// The variable `init()` assigns the sentinel to, if any.
    pub fn prompt_variable_name(&self) -> Option<&str> {
        self.prompt_variable.as_deref()
    }

    /// The current echo mode.
    pub fn echo(&self) -> EchoMode {
        self.echo
    }

    /// Fill unset timeouts from the process default.
    pub(crate) fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout.get_or_insert(timeout);
        self.command_timeout.get_or_insert(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShellConfig::new("##\n");
        assert_eq!(config.sentinel(), "##\n");
        assert_eq!(config.prompt_variable_name(), None);
        assert_eq!(config.line_terminator, "\n");
        assert_eq!(config.echo(), EchoMode::Detect);
        assert_eq!(config.init_timeout, None);
    }

    #[test]
    fn test_presets() {
        assert_eq!(ShellConfig::posix("$ ").prompt_variable_name(), Some("PS1"));
        assert_eq!(ShellConfig::zsh("$ ").prompt_variable_name(), Some("PROMPT"));
    }

    #[test]
    fn test_default_timeout_does_not_override() {
        let config = ShellConfig::new("##\n")
            .command_timeout(Duration::from_secs(2))
            .with_default_timeout(Duration::from_secs(30));

        assert_eq!(config.init_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.command_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_timeout_sets_both() {
        let config = ShellConfig::new("##\n")
            .line_terminator("\r")
            .timeout(Duration::from_millis(500));
        assert_eq!(config.init_timeout, Some(Duration::from_millis(500)));
        assert_eq!(config.command_timeout, Some(Duration::from_millis(500)));
        assert_eq!(config.line_terminator, "\r");
    }
}

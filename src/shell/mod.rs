//! Command/response sessions with an interactive shell

mod config;
mod output;

pub use config::{EchoMode, ShellConfig};

use crate::pattern::Pattern;
use crate::process::Expect;
use crate::result::ExpectError;
use std::fmt;
use std::time::Duration;

/// Lifecycle of a [`ShellSession`].
///
/// `Uninitialized → Ready → (Busy ↔ Ready)* → Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// `init()` has not succeeded yet.
    Uninitialized,
    /// The shell is at its prompt and accepts a command.
    Ready,
    /// A command was submitted and its prompt has not been seen.
    Busy,
    /// The process exited or the session was closed.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Ready => "ready",
            SessionState::Busy => "busy",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Runs commands in an interactive shell and returns their output lines.
///
/// The shell's prompt is set to a caller-chosen sentinel, so every command
/// is framed by the prompt that follows it. The session borrows nothing: it
/// owns its [`Expect`] and gives it back through
/// [`into_inner`](ShellSession::into_inner).
///
/// # Examples
///
/// ```no_run
/// use shellexpect::{Expect, ShellSession};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut process = Expect::with_env(
///     "bash",
///     ["--noprofile", "--norc"],
///     ["PS1=##\n", "TESTVAR=foobar"],
/// );
/// process.start()?;
///
/// let mut shell = ShellSession::new(process, "##\n");
/// shell.init().await?;
///
/// let lines = shell.run("echo $TESTVAR").await?;
/// assert_eq!(lines, vec!["foobar"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ShellSession {
    process: Expect,
    config: ShellConfig,
    state: SessionState,
    /// Command whose prompt is still outstanding.
    pending: Option<String>,
}

impl ShellSession {
    /// Wrap `process`, whose prompt is already set to `sentinel`.
    pub fn new(process: Expect, sentinel: impl Into<String>) -> Self {
        Self::with_config(process, ShellConfig::new(sentinel))
    }

    /// Wrap `process` with a full configuration.
    ///
    /// Timeouts left unset in `config` default to the process timeout.
    pub fn with_config(process: Expect, config: ShellConfig) -> Self {
        let config = config.with_default_timeout(process.timeout());
        Self {
            process,
            config,
            state: SessionState::Uninitialized,
            pending: None,
        }
    }

    fn sentinel(&self) -> Pattern {
        Pattern::exact(self.config.sentinel.as_str())
    }

    fn init_timeout(&self) -> Duration {
        self.config.init_timeout.unwrap_or_else(|| self.process.timeout())
    }

    fn command_timeout(&self) -> Duration {
        self.config
            .command_timeout
            .unwrap_or_else(|| self.process.timeout())
    }

    /// Wait for the first prompt, setting it up first if configured to.
    ///
    /// Output before the prompt (banners, messages from startup files) is
    /// discarded.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the session is uninitialized; otherwise
    /// `InitError` wrapping the cause. If the process exited the session is
    /// closed, after a timeout it stays uninitialized.
    pub async fn init(&mut self) -> Result<(), ExpectError> {
        if self.state != SessionState::Uninitialized {
            return Err(ExpectError::InvalidState {
                operation: "init",
                state: self.state,
            });
        }

        match self.init_prompt().await {
            Ok(()) => {
                tracing::debug!(program = %self.process.program(), "shell ready");
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                if e.is_process_exited() {
                    self.state = SessionState::Closed;
                }
                Err(ExpectError::InitError(Box::new(e)))
            }
        }
    }

    async fn init_prompt(&self) -> Result<(), ExpectError> {
        if let Some(variable) = &self.config.prompt_variable {
            let mut line = output::prompt_assignment(variable, &self.config.sentinel);
            line.push_str(&self.config.line_terminator);
            self.process
                .send(line.as_bytes())
                .await
                .map_err(|e| self.closed_or(e))?;
        }

        self.process
            .wait_for(self.sentinel(), self.init_timeout())
            .await?;
        Ok(())
    }

    /// Run `command` and return the lines it printed.
    ///
    /// The echoed command line is removed according to the configured
    /// [`EchoMode`], and the sentinel is never part of the result.
    ///
    /// # Errors
    ///
    /// - `InvalidState` before `init()` or while a timed-out command is
    ///   outstanding (see [`resume`](ShellSession::resume))
    /// - `InvalidCommand` if `command` contains a line break
    /// - `CommandTimeout` if the prompt does not return in time; the session
    ///   stays busy
    /// - `ProcessExited` if the shell is gone; the session is closed
    pub async fn run(&mut self, command: &str) -> Result<Vec<String>, ExpectError> {
        match self.state {
            SessionState::Ready => {}
            SessionState::Closed => {
                return Err(ExpectError::ProcessExited {
                    partial: self.process.pending_output(),
                })
            }
            state => {
                return Err(ExpectError::InvalidState {
                    operation: "run",
                    state,
                })
            }
        }

        if command.contains(['\n', '\r']) {
            return Err(ExpectError::InvalidCommand(command.to_string()));
        }

        let mut line = String::with_capacity(command.len() + self.config.line_terminator.len());
        line.push_str(command);
        line.push_str(&self.config.line_terminator);

        self.state = SessionState::Busy;
        self.pending = Some(command.to_string());
        tracing::debug!(command, "running command");

        if let Err(e) = self.process.send(line.as_bytes()).await {
            let e = self.closed_or(e);
            if e.is_process_exited() {
                self.state = SessionState::Closed;
            } else {
                self.state = SessionState::Ready;
            }
            self.pending = None;
            return Err(e);
        }

        let timeout = self.command_timeout();
        self.collect(timeout).await
    }

    /// Keep waiting for the prompt after a [`CommandTimeout`].
    ///
    /// Returns the lines of the outstanding command the way `run` would
    /// have.
    ///
    /// [`CommandTimeout`]: ExpectError::CommandTimeout
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the session is busy; otherwise as for `run`.
    pub async fn resume(&mut self, timeout: Duration) -> Result<Vec<String>, ExpectError> {
        if self.state != SessionState::Busy {
            return Err(ExpectError::InvalidState {
                operation: "resume",
                state: self.state,
            });
        }
        self.collect(timeout).await
    }

    async fn collect(&mut self, timeout: Duration) -> Result<Vec<String>, ExpectError> {
        let command = self.pending.clone().unwrap_or_default();

        match self.process.wait_for(self.sentinel(), timeout).await {
            Ok(result) => {
                let lines = output::command_lines(&result.before, &command, self.config.echo);
                tracing::debug!(command = %command, lines = lines.len(), "command finished");
                self.state = SessionState::Ready;
                self.pending = None;
                Ok(lines)
            }
            Err(ExpectError::Timeout { duration }) => {
                tracing::debug!(command = %command, ?duration, "command timed out");
                Err(ExpectError::CommandTimeout { command, duration })
            }
            Err(e) => {
                if e.is_process_exited() {
                    self.state = SessionState::Closed;
                    self.pending = None;
                }
                Err(e)
            }
        }
    }

    /// A write that failed because the terminal closed means the shell is
    /// gone.
    fn closed_or(&self, error: ExpectError) -> ExpectError {
        match error {
            ExpectError::IoError(e)
                if self.process.is_closed() && e.kind() == std::io::ErrorKind::BrokenPipe =>
            {
                ExpectError::ProcessExited {
                    partial: self.process.pending_output(),
                }
            }
            other => other,
        }
    }

    /// Stop the shell and close the session.
    pub fn close(&mut self) -> Result<(), ExpectError> {
        self.state = SessionState::Closed;
        self.pending = None;
        match self.process.stop() {
            Ok(()) | Err(ExpectError::NotStarted) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The session configuration.
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Change how command echo is removed, e.g. after `stty -echo`.
    pub fn set_echo_mode(&mut self, echo: EchoMode) {
        self.config.echo = echo;
    }

    /// The underlying process.
    pub fn process(&self) -> &Expect {
        &self.process
    }

    /// The underlying process, mutably.
    ///
    /// Reading from or writing to it directly can desynchronize the prompt
    /// framing.
    pub fn process_mut(&mut self) -> &mut Expect {
        &mut self.process
    }

    /// Give back the process.
    pub fn into_inner(self) -> Expect {
        self.process
    }
}

//! Error types for shellexpect

use crate::shell::SessionState;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while driving a process or a shell session.
///
/// Every operation surfaces failures to its immediate caller; nothing is
/// retried internally.
///
/// # Examples
///
/// ```no_run
/// use shellexpect::{Expect, ExpectError, Pattern};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let process = Expect::builder("sh").spawn()?;
///
/// match process.wait_for(Pattern::exact("done"), Duration::from_secs(5)).await {
///     Ok(result) => println!("Matched: {}", result.matched),
///     Err(ExpectError::Timeout { duration }) => {
///         eprintln!("Nothing after {:?}, buffer kept for the next wait", duration);
///     }
///     Err(ExpectError::ProcessExited { partial }) => {
///         eprintln!("Process exited, last output: {partial}");
///     }
///     Err(e) => return Err(e.into()),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum ExpectError {
    /// Process spawning error.
    ///
    /// Returned by `start()` when the command cannot be launched (missing
    /// binary, permission denied, ...).
    #[error("Failed to spawn process: {0}")]
    SpawnError(String),

    /// PTY error.
    ///
    /// Returned when the pseudo-terminal cannot be allocated or manipulated.
    #[error("PTY error: {0}")]
    PtyError(String),

    /// Environment entry that is not of the form `KEY=VALUE`.
    #[error("Invalid environment entry {0:?} (expected KEY=VALUE)")]
    InvalidEnv(String),

    /// `start()` was called on a process that was already started.
    #[error("Process has already been started")]
    AlreadyStarted,

    /// An operation that needs a running process was called before `start()`.
    #[error("Process has not been started")]
    NotStarted,

    /// I/O error.
    ///
    /// Writing to a terminal whose process has exited reports
    /// [`std::io::ErrorKind::BrokenPipe`].
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Timeout waiting for pattern.
    ///
    /// The unconsumed output is left in place, so waiting again sees the
    /// same pending data plus anything that arrived since.
    #[error("Timeout waiting for pattern (after {duration:?})")]
    Timeout {
        /// Duration that was waited before timeout
        duration: Duration,
    },

    /// The child process terminated before the pattern was seen.
    #[error("Process has exited")]
    ProcessExited {
        /// Output received but not consumed when the process exited
        partial: String,
    },

    /// The shell never showed the sentinel prompt during `init()`.
    #[error("Shell did not become ready: {0}")]
    InitError(#[source] Box<ExpectError>),

    /// The sentinel prompt did not come back after a command.
    #[error("Command {command:?} did not complete within {duration:?}")]
    CommandTimeout {
        /// The command line that was sent
        command: String,
        /// Duration that was waited
        duration: Duration,
    },

    /// A shell session operation was called in the wrong state.
    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        /// The operation that was attempted
        operation: &'static str,
        /// The state the session was in
        state: SessionState,
    },

    /// A command line containing a line break.
    #[error("Command must be a single line: {0:?}")]
    InvalidCommand(String),

    /// Invalid pattern.
    #[error("Invalid pattern: {0}")]
    PatternError(#[from] PatternError),
}

impl ExpectError {
    /// Returns `true` if this error means the child process is gone.
    pub fn is_process_exited(&self) -> bool {
        match self {
            ExpectError::ProcessExited { .. } => true,
            ExpectError::InitError(inner) => inner.is_process_exited(),
            _ => false,
        }
    }
}

/// Errors related to pattern creation.
#[derive(Error, Debug)]
pub enum PatternError {
    /// Invalid regex pattern.
    ///
    /// Returned when `Pattern::regex()` is called with invalid regex syntax.
    #[error("Invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// Empty pattern.
    ///
    /// An empty literal would match before any output arrives.
    #[error("Pattern cannot be empty")]
    EmptyPattern,
}

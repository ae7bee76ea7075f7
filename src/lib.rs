//! shellexpect: drive interactive shells over a pseudo-terminal
//!
//! shellexpect automates interactive programs in the spirit of the Unix
//! `expect` utility. A child process runs on a pseudo-terminal; the library
//! sends it input and waits, asynchronously, for expected output to appear.
//! On top of that, a [`ShellSession`] turns an interactive shell into a
//! "run one command, get its output lines" interface by setting the shell
//! prompt to a known sentinel string.
//!
//! # Features
//!
//! - **PTY processes**: spawn with extra `KEY=VALUE` environment entries
//! - **Async/await**: waits are tokio futures with timeouts
//! - **Pattern matching**: literal strings (Boyer-Moore-Horspool) or regex
//! - **Terminal cleanup**: `\r\n` normalization and ANSI escape stripping
//! - **Debug mode**: every byte read and written echoed to stderr
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use shellexpect::{Expect, ShellSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut process = Expect::with_env(
//!         "bash",
//!         ["--noprofile", "--norc"],
//!         ["PS1=##\n", "TESTVAR=foobar"],
//!     );
//!     process.start()?;
//!
//!     let mut shell = ShellSession::new(process, "##\n");
//!     shell.init().await?;
//!
//!     for line in shell.run("echo $TESTVAR").await? {
//!         println!("{line}");
//!     }
//!
//!     shell.close()?;
//!     Ok(())
//! }
//! ```
//!
//! # Low-level use
//!
//! Without a shell session, [`Expect`] is a plain send/wait primitive:
//!
//! ```rust,no_run
//! use shellexpect::{Expect, Pattern};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let process = Expect::builder("python3")
//!     .arg("-i")
//!     .timeout(Duration::from_secs(10))
//!     .spawn()?;
//!
//! process.expect(">>> ").await?;
//! process.send_line("print(6 * 7)").await?;
//!
//! let result = process.expect(Pattern::regex(r"(\d+)\n")?).await?;
//! assert_eq!(result.captures[1], "42");
//! # Ok(())
//! # }
//! ```
//!
//! # Sending Control Characters
//!
//! ```rust,no_run
//! # async fn example(process: &shellexpect::Expect) -> Result<(), shellexpect::ExpectError> {
//! // Ctrl-C
//! process.send(&[0x03]).await?;
//!
//! // Ctrl-D
//! process.send(&[0x04]).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod buffer;
mod pattern;
mod process;
mod result;
mod shell;
mod traffic;
mod waiter;

// Public API exports
pub use buffer::OutputFilter;
pub use pattern::Pattern;
pub use process::{Expect, ExpectBuilder};
pub use result::{ExpectError, MatchResult, PatternError};
pub use shell::{EchoMode, SessionState, ShellConfig, ShellSession};

// Re-export commonly used types
pub use portable_pty::ExitStatus;

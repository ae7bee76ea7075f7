//! Process builder for configuration

use super::Expect;
use crate::result::ExpectError;
use portable_pty::PtySize;
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for expect operations (in seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default PTY rows
const DEFAULT_PTY_ROWS: u16 = 24;

/// Default PTY columns
const DEFAULT_PTY_COLS: u16 = 80;

/// Everything needed to launch one process; fixed once the process starts.
#[derive(Debug, Clone)]
pub(crate) struct ProcessConfig {
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
    pub(crate) env: Vec<String>,
    pub(crate) cwd: Option<PathBuf>,
    pub(crate) timeout: Duration,
    pub(crate) pty_size: PtySize,
    pub(crate) strip_ansi: bool,
    pub(crate) normalize_newlines: bool,
    pub(crate) debug: bool,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            pty_size: PtySize {
                rows: DEFAULT_PTY_ROWS,
                cols: DEFAULT_PTY_COLS,
                pixel_width: 0,
                pixel_height: 0,
            },
            strip_ansi: true,
            normalize_newlines: true,
            debug: false,
        }
    }
}

/// Builder for configuring and spawning processes.
///
/// # Defaults
///
/// - Timeout: 30 seconds
/// - PTY size: 24 rows × 80 columns
/// - ANSI stripping: enabled
/// - Newline normalization (`\r\n` → `\n`): enabled
/// - Working directory: the caller's current directory
/// - Debug traffic logging: disabled
///
/// # Examples
///
/// ```no_run
/// use shellexpect::Expect;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let process = Expect::builder("bash")
///     .args(["--noprofile", "--norc"])
///     .env("PS1=##\n")
///     .env("TESTVAR=foobar")
///     .timeout(Duration::from_secs(10))
///     .spawn()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ExpectBuilder {
    config: ProcessConfig,
}

impl ExpectBuilder {
    /// Create a builder for `program` with default configuration.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            config: ProcessConfig {
                program: program.into(),
                ..ProcessConfig::default()
            },
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.config.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an environment entry of the form `KEY=VALUE`.
    ///
    /// Entries override variables inherited from the caller. The format is
    /// checked by `start()`, which fails with `ExpectError::InvalidEnv` on an
    /// entry without `=`.
    pub fn env(mut self, entry: impl Into<String>) -> Self {
        self.config.env.push(entry.into());
        self
    }

    /// Add several `KEY=VALUE` environment entries.
    pub fn envs<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.env.extend(entries.into_iter().map(Into::into));
        self
    }

    /// Set the working directory of the child.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cwd = Some(dir.into());
        self
    }

    /// Set the default timeout used by `Expect::expect()` and by shell
    /// sessions wrapping this process.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set PTY (terminal) size.
    ///
    /// # Arguments
    ///
    /// * `rows` - Number of rows (default: 24)
    /// * `cols` - Number of columns (default: 80)
    pub fn pty_size(mut self, rows: u16, cols: u16) -> Self {
        self.config.pty_size = PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        self
    }

    /// Enable or disable ANSI escape sequence stripping (default: enabled).
    pub fn strip_ansi(mut self, strip: bool) -> Self {
        self.config.strip_ansi = strip;
        self
    }

    /// Enable or disable `\r\n` → `\n` normalization (default: enabled).
    ///
    /// With normalization off, a prompt ending in `\n` has to be given as
    /// `\r\n` to match what the terminal emits.
    pub fn normalize_newlines(mut self, normalize: bool) -> Self {
        self.config.normalize_newlines = normalize;
        self
    }

    /// Echo all traffic to standard error (default: disabled).
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build the process without starting it.
    pub fn build(self) -> Expect {
        Expect::from_config(self.config)
    }

    /// Build and start the process.
    ///
    /// # Errors
    ///
    /// See [`Expect::start`].
    pub fn spawn(self) -> Result<Expect, ExpectError> {
        let mut process = self.build();
        process.start()?;
        Ok(process)
    }
}

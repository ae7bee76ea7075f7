//! Process management for PTY-based automation

mod builder;
mod spawn;

pub use builder::ExpectBuilder;

use crate::buffer::OutputFilter;
use crate::pattern::Pattern;
use crate::result::{ExpectError, MatchResult};
use crate::traffic::TrafficLog;
use crate::waiter::{spawn_reader, PatternWaiter};
use builder::ProcessConfig;
use portable_pty::{native_pty_system, Child, ChildKiller, ExitStatus, MasterPty, PtySize};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// A process running on a pseudo-terminal.
///
/// An `Expect` is configured first and started once. After `start()` a
/// background thread drains everything the process writes into an output
/// buffer; callers send input with [`send`](Expect::send) and wait for output
/// with [`wait_for`](Expect::wait_for).
///
/// # Examples
///
/// ```no_run
/// use shellexpect::{Expect, Pattern};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut process = Expect::with_env("sh", ["-i"], ["PS1=$ ", "TESTVAR=foobar"]);
/// process.start()?;
///
/// process.expect(Pattern::exact("$ ")).await?;
/// process.send_line("echo $TESTVAR").await?;
/// let result = process.wait_for("foobar", Duration::from_secs(5)).await?;
/// println!("Matched: {}", result.matched);
/// # Ok(())
/// # }
/// ```
pub struct Expect {
    config: ProcessConfig,
    traffic: TrafficLog,
    state: ProcessState,
}

enum ProcessState {
    Idle,
    Running(Box<Process>),
    Stopped(Arc<PatternWaiter>),
}

struct Process {
    master: Mutex<Box<dyn MasterPty + Send>>,
    child: Option<Box<dyn Child + Send + Sync>>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    waiter: Arc<PatternWaiter>,
    pid: Option<u32>,
}

impl Process {
    /// Kill the child unless it has already exited.
    ///
    /// The hangup is sent right away. Escalating to `SIGKILL` for a child that
    /// ignores it, and reaping the child, polls for a while, so inside a tokio
    /// runtime that part runs on the blocking pool.
    fn kill(&mut self) {
        let Some(mut child) = self.child.take() else {
            // The exit status was taken by `wait()`; signal by pid instead.
            if let Err(e) = self.killer.kill() {
                tracing::debug!(pid = ?self.pid, error = %e, "kill failed");
            }
            return;
        };

        if let Ok(Some(_)) = child.try_wait() {
            return;
        }

        if let Err(e) = self.killer.kill() {
            tracing::debug!(pid = ?self.pid, error = %e, "hangup failed");
        }

        let pid = self.pid;
        let mut escalate = move || {
            if let Err(e) = child.kill() {
                tracing::debug!(?pid, error = %e, "kill failed");
            }
            let _ = child.wait();
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(escalate);
            }
            Err(_) => escalate(),
        }
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        self.kill();
    }
}

impl Expect {
    /// Configure a process with the inherited environment.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ExpectBuilder::new(program).args(args).build()
    }

    /// Configure a process with extra `KEY=VALUE` environment entries.
    ///
    /// The entries override or extend the inherited environment.
    pub fn with_env<I, S, E, V>(program: impl Into<String>, args: I, env: E) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        E: IntoIterator<Item = V>,
        V: Into<String>,
    {
        ExpectBuilder::new(program).args(args).envs(env).build()
    }

    /// Create a builder for `program`.
    pub fn builder(program: impl Into<String>) -> ExpectBuilder {
        ExpectBuilder::new(program)
    }

    pub(crate) fn from_config(config: ProcessConfig) -> Self {
        Self {
            traffic: TrafficLog::new(config.debug),
            config,
            state: ProcessState::Idle,
        }
    }

    /// Allocate a PTY, spawn the process on it and start draining its output.
    ///
    /// # Errors
    ///
    /// - `AlreadyStarted` if called more than once
    /// - `InvalidEnv` if an environment entry is not `KEY=VALUE`
    /// - `PtyError` if the pseudo-terminal cannot be allocated
    /// - `SpawnError` if the program cannot be launched
    pub fn start(&mut self) -> Result<(), ExpectError> {
        if !matches!(self.state, ProcessState::Idle) {
            return Err(ExpectError::AlreadyStarted);
        }

        let cmd = spawn::command_builder(&self.config)?;

        let pty_pair = native_pty_system()
            .openpty(self.config.pty_size)
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;

        let child = pty_pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| ExpectError::SpawnError(format!("{}: {e}", self.config.program)))?;

        // The child holds its own copy; keeping ours open would hide EOF.
        drop(pty_pair.slave);

        let reader = pty_pair
            .master
            .try_clone_reader()
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;
        let writer = pty_pair
            .master
            .take_writer()
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;

        let pid = child.process_id();
        let killer = child.clone_killer();
        let waiter = Arc::new(PatternWaiter::new());

        let process = Process {
            master: Mutex::new(pty_pair.master),
            child: Some(child),
            killer,
            writer: Arc::new(Mutex::new(writer)),
            waiter: Arc::clone(&waiter),
            pid,
        };

        let filter = OutputFilter::new(self.config.strip_ansi, self.config.normalize_newlines);
        if let Err(e) = spawn_reader(reader, waiter, filter, self.traffic.clone()) {
            drop(process);
            return Err(ExpectError::SpawnError(format!("reader thread: {e}")));
        }

        tracing::debug!(
            program = %self.config.program,
            args = ?self.config.args,
            pid = ?pid,
            "spawned process"
        );

        self.state = ProcessState::Running(Box::new(process));
        Ok(())
    }

    fn waiter(&self) -> Result<&Arc<PatternWaiter>, ExpectError> {
        match &self.state {
            ProcessState::Idle => Err(ExpectError::NotStarted),
            ProcessState::Running(process) => Ok(&process.waiter),
            ProcessState::Stopped(waiter) => Ok(waiter),
        }
    }

    fn process_mut(&mut self) -> Result<&mut Process, ExpectError> {
        match &mut self.state {
            ProcessState::Idle => Err(ExpectError::NotStarted),
            ProcessState::Running(process) => Ok(process.as_mut()),
            ProcessState::Stopped(waiter) => Err(ExpectError::ProcessExited {
                partial: waiter.pending_output(),
            }),
        }
    }

    /// Send raw bytes to the process.
    ///
    /// # Errors
    ///
    /// `IoError` with kind `BrokenPipe` once the terminal is closed or the
    /// process has exited; `NotStarted` before `start()`.
    pub async fn send(&self, data: &[u8]) -> Result<(), ExpectError> {
        let writer = match &self.state {
            ProcessState::Idle => return Err(ExpectError::NotStarted),
            ProcessState::Running(process) if !process.waiter.is_closed() => {
                Arc::clone(&process.writer)
            }
            _ => {
                return Err(ExpectError::IoError(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "terminal is closed",
                )))
            }
        };

        self.traffic.write(data);
        let data = data.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
            writer.write_all(&data)?;
            writer.flush()
        })
        .await
        .map_err(|e| ExpectError::IoError(io::Error::other(e)))??;

        Ok(())
    }

    /// Send a line to the process (appends `\n`).
    pub async fn send_line(&self, line: &str) -> Result<(), ExpectError> {
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.send(&data).await
    }

    /// Wait until `pattern` appears in the unconsumed output.
    ///
    /// On success everything up to and including the first occurrence is
    /// consumed and returned. On timeout nothing is consumed, so a later call
    /// can still find the pattern. If the process exits first the error
    /// carries whatever output was pending.
    ///
    /// # Errors
    ///
    /// `Timeout`, `ProcessExited`, `NotStarted`, or `PatternError` for an
    /// empty literal.
    pub async fn wait_for(
        &self,
        pattern: impl Into<Pattern>,
        timeout: Duration,
    ) -> Result<MatchResult, ExpectError> {
        let pattern = pattern.into();
        let matcher = pattern.to_matcher()?;
        let waiter = self.waiter()?;

        let result = waiter.wait_for(matcher.as_ref(), timeout).await;
        match &result {
            Ok(m) => tracing::trace!(
                pattern = %pattern.describe(),
                consumed = m.before.len() + m.matched.len(),
                "pattern matched"
            ),
            Err(e) => tracing::debug!(pattern = %pattern.describe(), error = %e, "wait failed"),
        }
        result
    }

    /// Wait for `pattern` using the configured default timeout.
    pub async fn expect(&self, pattern: impl Into<Pattern>) -> Result<MatchResult, ExpectError> {
        self.wait_for(pattern, self.config.timeout).await
    }

    /// Turn traffic logging to standard error on or off.
    ///
    /// Takes effect immediately, also for a process that is already running.
    pub fn set_debug(&self, debug: bool) {
        self.traffic.set_enabled(debug);
    }

    /// Whether traffic logging is on.
    pub fn is_debug(&self) -> bool {
        self.traffic.is_enabled()
    }

    /// The default timeout for [`expect`](Expect::expect).
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// The program this process runs.
    pub fn program(&self) -> &str {
        &self.config.program
    }

    /// Whether the output stream has ended (process exited or stopped).
    ///
    /// Returns `false` before `start()`.
    pub fn is_closed(&self) -> bool {
        self.waiter().map(|w| w.is_closed()).unwrap_or(false)
    }

    /// Output received but not yet consumed by a match.
    pub fn pending_output(&self) -> String {
        self.waiter()
            .map(|w| w.pending_output())
            .unwrap_or_default()
    }

    /// Process id of the child, if the platform reports one.
    pub fn pid(&self) -> Option<u32> {
        match &self.state {
            ProcessState::Running(process) => process.pid,
            _ => None,
        }
    }

    /// Check if the process is still alive.
    ///
    /// # Errors
    ///
    /// `NotStarted` before `start()`; `ProcessExited` after `stop()` or after
    /// the exit status was collected with [`wait`](Expect::wait).
    pub fn is_alive(&mut self) -> Result<bool, ExpectError> {
        let process = self.process_mut()?;
        match &mut process.child {
            Some(child) => spawn::is_alive(child),
            None => Err(ExpectError::ProcessExited {
                partial: process.waiter.pending_output(),
            }),
        }
    }

    /// Wait for the process to exit and return its exit status.
    ///
    /// The child handle is consumed; later calls fail with `ProcessExited`.
    pub async fn wait(&mut self) -> Result<ExitStatus, ExpectError> {
        let process = self.process_mut()?;
        let mut child = process
            .child
            .take()
            .ok_or_else(|| ExpectError::ProcessExited {
                partial: process.waiter.pending_output(),
            })?;

        let status = tokio::task::spawn_blocking(move || child.wait())
            .await
            .map_err(|e| ExpectError::IoError(io::Error::other(e)))??;

        Ok(status)
    }

    /// Change the terminal size seen by the process.
    pub fn resize(&mut self, rows: u16, cols: u16) -> Result<(), ExpectError> {
        let process = self.process_mut()?;
        process
            .master
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| ExpectError::PtyError(e.to_string()))
    }

    /// Kill the process and close its terminal.
    ///
    /// Pending and later waits fail with `ProcessExited`; unconsumed output
    /// stays readable through [`pending_output`](Expect::pending_output).
    /// Stopping twice, or stopping a process that already exited, is not an
    /// error.
    pub fn stop(&mut self) -> Result<(), ExpectError> {
        match std::mem::replace(&mut self.state, ProcessState::Idle) {
            ProcessState::Idle => Err(ExpectError::NotStarted),
            ProcessState::Running(process) => {
                let waiter = Arc::clone(&process.waiter);
                // Dropping kills the child and closes the master.
                drop(process);
                waiter.close();
                tracing::debug!(program = %self.config.program, "stopped process");
                self.state = ProcessState::Stopped(waiter);
                Ok(())
            }
            stopped @ ProcessState::Stopped(_) => {
                self.state = stopped;
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for Expect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            ProcessState::Idle => "idle",
            ProcessState::Running(_) => "running",
            ProcessState::Stopped(_) => "stopped",
        };
        f.debug_struct("Expect")
            .field("program", &self.config.program)
            .field("args", &self.config.args)
            .field("pid", &self.pid())
            .field("state", &state)
            .finish()
    }
}

//! Process spawning utilities

use super::builder::ProcessConfig;
use crate::result::ExpectError;
use portable_pty::{Child, CommandBuilder};

/// Split a `KEY=VALUE` environment entry.
///
/// Only the first `=` separates; the value may contain more of them or be
/// empty.
pub(crate) fn parse_env_entry(entry: &str) -> Result<(&str, &str), ExpectError> {
    match entry.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(ExpectError::InvalidEnv(entry.to_string())),
    }
}

/// Translate a process configuration into a PTY command.
///
/// The child inherits the caller's environment with the configured entries
/// applied on top, and starts in the configured directory (the caller's
/// current directory by default).
pub(crate) fn command_builder(config: &ProcessConfig) -> Result<CommandBuilder, ExpectError> {
    if config.program.is_empty() {
        return Err(ExpectError::SpawnError("Empty command".to_string()));
    }

    let mut cmd = CommandBuilder::new(&config.program);
    cmd.args(&config.args);

    for entry in &config.env {
        let (key, value) = parse_env_entry(entry)?;
        cmd.env(key, value);
    }

    match &config.cwd {
        Some(dir) => cmd.cwd(dir),
        None => {
            if let Ok(dir) = std::env::current_dir() {
                cmd.cwd(dir);
            }
        }
    }

    Ok(cmd)
}

/// Check if a child process is still alive
pub(crate) fn is_alive(child: &mut Box<dyn Child + Send + Sync>) -> Result<bool, ExpectError> {
    match child.try_wait() {
        Ok(Some(_)) => Ok(false),
        Ok(None) => Ok(true),
        Err(e) => Err(ExpectError::IoError(e)),
    }
}

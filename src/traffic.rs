//! Debug logging of everything written to and read from the terminal

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Traffic logger shared by the caller side and the reader thread.
///
/// Byte counts always go to `tracing` at trace level under the
/// `shellexpect::traffic` target. When debug mode is on, the data itself is
/// also written to standard error, one line per read or write, so a stuck
/// session can be diagnosed without a subscriber installed.
#[derive(Debug, Clone)]
pub(crate) struct TrafficLog {
    enabled: Arc<AtomicBool>,
}

impl TrafficLog {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Record bytes read from the process.
    pub(crate) fn read(&self, data: &[u8]) {
        self.record("read", data);
    }

    /// Record bytes written to the process.
    pub(crate) fn write(&self, data: &[u8]) {
        self.record("write", data);
    }

    fn record(&self, direction: &'static str, data: &[u8]) {
        tracing::trace!(target: "shellexpect::traffic", direction, bytes = data.len());

        if self.is_enabled() {
            let line = format_traffic(direction, data);
            let _ = io::stderr().lock().write_all(line.as_bytes());
        }
    }
}

/// Format one traffic line.
///
/// UTF-8 data is printed as an escaped string, anything else as a byte list.
pub(crate) fn format_traffic(direction: &str, data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(text) => format!("{direction}: {text:?}\n"),
        Err(_) => format!("{direction}(bytes): {data:?}\n"),
    }
}

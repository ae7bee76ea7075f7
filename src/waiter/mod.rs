//! Waiting for patterns in output produced by a background reader

mod reader;

pub(crate) use reader::spawn_reader;

use crate::buffer::OutputBuffer;
use crate::pattern::Matcher;
use crate::result::{ExpectError, MatchResult};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Shared state between the reader thread and callers waiting for output.
///
/// The reader is the only writer that appends; waiters only trim what they
/// match. The mutex is held for a single append or a single scan, never
/// across an `.await`.
#[derive(Debug, Default)]
pub(crate) struct PatternWaiter {
    buffer: Mutex<OutputBuffer>,
    notify: Notify,
}

impl PatternWaiter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, OutputBuffer> {
        // A panicking waiter cannot leave the buffer half-trimmed
        // (`split_to` is a single step), so the data is still usable.
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append filtered output and wake every waiter.
    pub(crate) fn append(&self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.lock().append(data);
        self.notify.notify_waiters();
    }

    /// Mark end of stream and wake every waiter.
    pub(crate) fn close(&self) {
        self.lock().close();
        self.notify.notify_waiters();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.lock().is_closed()
    }

    pub(crate) fn pending_output(&self) -> String {
        self.lock().pending_lossy()
    }

    /// Wait until `matcher` finds a match in the unconsumed output.
    ///
    /// Output already buffered is matched before end of stream is reported,
    /// so a prompt printed just before the process exited is still found.
    /// A timeout too large to be represented as a deadline never expires.
    pub(crate) async fn wait_for(
        &self,
        matcher: &dyn Matcher,
        timeout: Duration,
    ) -> Result<MatchResult, ExpectError> {
        let deadline = Instant::now().checked_add(timeout);

        loop {
            // Register for wake-ups before scanning so an append that lands
            // between the scan and the await is not lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut buffer = self.lock();
                if let Some(result) = buffer.take_match(matcher) {
                    return Ok(result);
                }
                if buffer.is_closed() {
                    return Err(ExpectError::ProcessExited {
                        partial: buffer.pending_lossy(),
                    });
                }
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return Err(ExpectError::Timeout { duration: timeout });
                    }
                }
                None => notified.await,
            }
        }
    }
}

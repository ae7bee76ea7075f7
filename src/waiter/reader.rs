//! Background thread draining the PTY master into the output buffer

use super::PatternWaiter;
use crate::buffer::OutputFilter;
use crate::traffic::TrafficLog;
use std::io::{self, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Size of a single read from the PTY master
const READ_CHUNK_SIZE: usize = 4096;

/// Start draining `reader` into `waiter` until end of stream.
///
/// On Linux the master reports `EIO` once every slave descriptor is closed;
/// that and any other read error end the stream the same way as EOF.
pub(crate) fn spawn_reader(
    mut reader: Box<dyn Read + Send>,
    waiter: Arc<PatternWaiter>,
    mut filter: OutputFilter,
    traffic: TrafficLog,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("shellexpect-reader".to_string())
        .spawn(move || {
            let mut chunk = [0u8; READ_CHUNK_SIZE];
            loop {
                match reader.read(&mut chunk) {
                    Ok(0) => {
                        tracing::debug!("pty reached end of stream");
                        break;
                    }
                    Ok(n) => {
                        traffic.read(&chunk[..n]);
                        waiter.append(&filter.filter(&chunk[..n]));
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        tracing::debug!(error = %e, "pty read ended");
                        break;
                    }
                }
            }

            waiter.append(&filter.finish());
            waiter.close();
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;
    use std::io::Cursor;
    use std::time::Duration;

    /// Hands out its data a few bytes per read, like a slow terminal.
    struct Trickle {
        data: Cursor<Vec<u8>>,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.step);
            self.data.read(&mut buf[..n])
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from_raw_os_error(5))
        }
    }

    #[tokio::test]
    async fn test_reader_filters_and_closes() {
        let waiter = Arc::new(PatternWaiter::new());
        let reader = Trickle {
            data: Cursor::new(b"echo $X\r\nfoobar\r\n##\r\ntail\r".to_vec()),
            step: 3,
        };

        let handle = spawn_reader(
            Box::new(reader),
            Arc::clone(&waiter),
            OutputFilter::default(),
            TrafficLog::new(false),
        )
        .unwrap();

        let matcher = Pattern::exact("##\n").to_matcher().unwrap();
        let result = waiter
            .wait_for(matcher.as_ref(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(result.before, "echo $X\nfoobar\n");

        handle.join().unwrap();
        assert!(waiter.is_closed());
        // The dangling carriage return is flushed at end of stream.
        assert_eq!(waiter.pending_output(), "tail\r");
    }

    #[tokio::test]
    async fn test_read_error_closes_stream() {
        let waiter = Arc::new(PatternWaiter::new());
        let handle = spawn_reader(
            Box::new(Broken),
            Arc::clone(&waiter),
            OutputFilter::default(),
            TrafficLog::new(false),
        )
        .unwrap();

        handle.join().unwrap();
        assert!(waiter.is_closed());
    }
}

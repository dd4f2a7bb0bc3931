//! PTY channel abstraction for interactive sessions.

use std::time::Duration;

use log::{Level, debug, log};
use regex::Regex;
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result};
use crate::transport::ShellHandle;

/// Deadline used when `timeout` runs past what the clock can represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `timeout` from now, saturating instead of overflowing.
pub fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}

/// Output of a successful pattern read.
#[derive(Debug, Clone)]
pub struct ReadMatch {
    /// Everything collected during the read, ANSI-stripped.
    pub output: String,

    /// The trimmed prompt line the pattern matched on.
    pub prompt: String,
}

/// High-level PTY channel for interactive device sessions.
///
/// This wraps the shell byte queues and provides pattern-based read
/// operations with deadlines.
///
/// A channel is single-flight: one write-then-read cycle at a time. It does
/// not queue or lock; the `&mut self` receivers make overlapping cycles
/// impossible from safe code.
pub struct PtyChannel {
    /// Underlying shell queues.
    shell: ShellHandle,

    /// Buffer for accumulating output of the current read.
    buffer: PatternBuffer,

    /// Level used for wire-level logging.
    wire_level: Level,
}

impl PtyChannel {
    /// Create a new PTY channel over an open shell.
    pub fn new(shell: ShellHandle, wire_level: Level) -> Self {
        Self {
            shell,
            buffer: PatternBuffer::new(),
            wire_level,
        }
    }

    /// Write a line (text followed by a newline).
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        log!(self.wire_level, "write: {:?}", line);
        self.shell.send(format!("{}\n", line))
    }

    /// Write a line without logging its content.
    pub fn write_hidden_line(&mut self, line: &str) -> Result<()> {
        log!(self.wire_level, "write: <hidden>");
        self.shell.send(format!("{}\n", line))
    }

    /// Drop any output that arrived before the next command is written.
    pub fn discard_pending(&mut self) -> usize {
        let mut discarded = 0;
        while let Some(chunk) = self.shell.try_recv() {
            discarded += chunk.len();
        }
        if discarded > 0 {
            log!(self.wire_level, "discarded {} stale bytes", discarded);
        }
        discarded
    }

    /// Read until `pattern` matches the accumulated output.
    ///
    /// Each chunk is ANSI-stripped and appended, then the whole buffer is
    /// tested. Fails with [`ChannelError::PatternTimeout`] if nothing matches
    /// before `timeout` elapses.
    pub async fn read_until(&mut self, pattern: &Regex, timeout: Duration) -> Result<ReadMatch> {
        self.buffer.clear();
        let deadline = deadline_after(timeout);

        loop {
            let chunk = match tokio::time::timeout_at(deadline, self.shell.recv()).await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => return Err(ChannelError::Closed.into()),
                Err(_) => {
                    let received = self.buffer.take();
                    debug!(
                        "read timeout ({:?}) looking for {:?}, buffer: {:?}",
                        timeout,
                        pattern.as_str(),
                        received
                    );
                    return Err(ChannelError::PatternTimeout {
                        pattern: pattern.as_str().to_string(),
                        timeout,
                        received,
                    }
                    .into());
                }
            };

            self.buffer.extend(&chunk);
            log!(
                self.wire_level,
                "read {} bytes, buffer: {:?}",
                chunk.len(),
                self.buffer.as_str()
            );

            if let Some(prompt) = self.buffer.find_prompt(pattern) {
                log!(self.wire_level, "matched {:?} on {:?}", pattern.as_str(), prompt);
                return Ok(ReadMatch {
                    output: self.buffer.take(),
                    prompt,
                });
            }
        }
    }

    /// Collect whatever arrives during `window`, unconditionally.
    pub async fn read_for(&mut self, window: Duration) -> Result<String> {
        self.buffer.clear();
        let deadline = deadline_after(window);

        loop {
            match tokio::time::timeout_at(deadline, self.shell.recv()).await {
                Ok(Some(chunk)) => self.buffer.extend(&chunk),
                Ok(None) if self.buffer.is_empty() => return Err(ChannelError::Closed.into()),
                Ok(None) | Err(_) => break,
            }
        }

        log!(self.wire_level, "drained {:?}", self.buffer.as_str());
        Ok(self.buffer.take())
    }

    /// Whether the shell is still writable.
    pub fn is_open(&self) -> bool {
        self.shell.is_open()
    }

    /// Close the underlying shell.
    pub async fn close(&mut self) {
        self.shell.close().await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use tokio::sync::mpsc;

    use super::*;
    use crate::channel::DEFAULT_PROMPT;

    fn channel() -> (PtyChannel, mpsc::UnboundedSender<Bytes>, mpsc::UnboundedReceiver<Bytes>) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        (
            PtyChannel::new(ShellHandle::new(in_rx, out_tx), Level::Trace),
            in_tx,
            out_rx,
        )
    }

    #[tokio::test]
    async fn test_read_until_matches_across_chunks() {
        let (mut pty, device, _writes) = channel();
        device.send(Bytes::from("configure terminal\r\n")).unwrap();
        device.send(Bytes::from("router(con")).unwrap();
        device.send(Bytes::from("fig)#")).unwrap();

        let m = pty
            .read_until(&DEFAULT_PROMPT, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(m.output, "configure terminal\r\nrouter(config)#");
        assert_eq!(m.prompt, "router(config)#");
    }

    #[tokio::test]
    async fn test_read_until_timeout_then_reusable() {
        let (mut pty, device, _writes) = channel();
        device.send(Bytes::from("Building configuration...")).unwrap();

        let err = pty
            .read_until(&DEFAULT_PROMPT, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(err.is_read_timeout());
        match err {
            crate::Error::Channel(ChannelError::PatternTimeout { received, .. }) => {
                assert_eq!(received, "Building configuration...");
            }
            other => panic!("unexpected error: {other}"),
        }

        device.send(Bytes::from("\r\nrouter#")).unwrap();
        let m = pty
            .read_until(&DEFAULT_PROMPT, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(m.prompt, "router#");
    }

    #[tokio::test]
    async fn test_read_until_with_unbounded_timeout() {
        let (mut pty, device, _writes) = channel();
        device.send(Bytes::from("\r\nrouter#")).unwrap();

        let m = pty.read_until(&DEFAULT_PROMPT, Duration::MAX).await.unwrap();
        assert_eq!(m.prompt, "router#");
        assert!(deadline_after(Duration::MAX) > Instant::now());
    }

    #[tokio::test]
    async fn test_read_until_closed_shell() {
        let (mut pty, device, _writes) = channel();
        drop(device);
        let err = pty
            .read_until(&DEFAULT_PROMPT, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Channel(ChannelError::Closed)));
    }

    #[tokio::test]
    async fn test_read_for_collects_window() {
        let (mut pty, device, _writes) = channel();
        device.send(Bytes::from("\r\nrouter>")).unwrap();
        let output = pty.read_for(Duration::from_millis(50)).await.unwrap();
        assert_eq!(output, "\r\nrouter>");
    }

    #[tokio::test]
    async fn test_write_line_and_discard() {
        let (mut pty, device, mut writes) = channel();
        device.send(Bytes::from("stale banner\r\n")).unwrap();
        tokio::task::yield_now().await;

        assert_eq!(pty.discard_pending(), 14);
        pty.write_line("show version").unwrap();
        assert_eq!(writes.recv().await.unwrap(), Bytes::from("show version\n"));
    }
}

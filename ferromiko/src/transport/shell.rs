//! Duplex byte channel over an interactive SSH shell.
//!
//! The russh `Channel` is owned by a pump task. Bytes the device sends are
//! forwarded, in arrival order, into an unbounded queue that the session
//! drains; bytes the session writes are queued the other way and written to
//! the channel by the same task. Dropping the write side closes the channel.

use std::time::Duration;

use bytes::Bytes;
use log::{debug, trace, warn};
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{ChannelError, Result};

/// How long `close()` waits for the pump task to send EOF and exit.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Handle to an open interactive shell.
#[derive(Debug)]
pub struct ShellHandle {
    /// Bytes received from the device.
    incoming: mpsc::UnboundedReceiver<Bytes>,

    /// Bytes to write to the device (None once closed).
    outgoing: Option<mpsc::UnboundedSender<Bytes>>,

    /// Pump task owning the SSH channel, if any.
    pump: Option<JoinHandle<()>>,
}

impl ShellHandle {
    /// Build a handle from raw queues.
    ///
    /// `incoming` yields device output, `outgoing` accepts writes. Useful for
    /// driving a session from something other than SSH.
    pub fn new(
        incoming: mpsc::UnboundedReceiver<Bytes>,
        outgoing: mpsc::UnboundedSender<Bytes>,
    ) -> Self {
        Self {
            incoming,
            outgoing: Some(outgoing),
            pump: None,
        }
    }

    /// Spawn a pump task around an SSH channel with a shell already requested.
    pub fn spawn(channel: Channel<Msg>) -> Self {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let pump = tokio::spawn(pump(channel, out_rx, in_tx));

        Self {
            incoming: in_rx,
            outgoing: Some(out_tx),
            pump: Some(pump),
        }
    }

    /// Queue bytes for writing to the device.
    pub fn send(&self, data: impl Into<Bytes>) -> Result<()> {
        let outgoing = self.outgoing.as_ref().ok_or(ChannelError::Closed)?;
        outgoing
            .send(data.into())
            .map_err(|_| ChannelError::Closed.into())
    }

    /// Wait for the next chunk of device output.
    ///
    /// Returns `None` once the shell has closed and all output was consumed.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.incoming.recv().await
    }

    /// Take a chunk that already arrived, without waiting.
    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.incoming.try_recv().ok()
    }

    /// Whether the write side is still open.
    pub fn is_open(&self) -> bool {
        self.outgoing.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Close the shell and wait briefly for the pump to finish.
    pub async fn close(&mut self) {
        self.outgoing.take();
        if let Some(pump) = self.pump.take() {
            if tokio::time::timeout(CLOSE_GRACE, pump).await.is_err() {
                warn!("shell pump did not exit within {:?}", CLOSE_GRACE);
            }
        }
    }
}

/// Move bytes between the SSH channel and the session queues.
async fn pump(
    mut channel: Channel<Msg>,
    mut outgoing: mpsc::UnboundedReceiver<Bytes>,
    incoming: mpsc::UnboundedSender<Bytes>,
) {
    loop {
        tokio::select! {
            msg = channel.wait() => match msg {
                Some(ChannelMsg::Data { data }) | Some(ChannelMsg::ExtendedData { data, .. }) => {
                    if incoming.send(Bytes::copy_from_slice(&data)).is_err() {
                        break;
                    }
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    debug!("shell channel closed by peer");
                    return;
                }
                Some(other) => trace!("ignoring channel message: {:?}", other),
            },
            data = outgoing.recv() => match data {
                Some(data) => {
                    if let Err(e) = channel.data(&data[..]).await {
                        warn!("shell write failed: {}", e);
                        return;
                    }
                }
                None => break,
            },
        }
    }

    let _ = channel.eof().await;
    let _ = channel.close().await;
}

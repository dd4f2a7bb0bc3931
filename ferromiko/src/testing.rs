//! Scripted mock device for driving sessions without a network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::driver::{DeviceDescriptor, Session};
use crate::error::Result;
use crate::platform::VendorProfile;
use crate::transport::ShellHandle;

/// Device side of a mock shell.
pub(crate) struct MockDevice {
    writes: Arc<Mutex<Vec<String>>>,
    to_session: mpsc::UnboundedSender<Bytes>,
    closed: Arc<AtomicBool>,
}

impl MockDevice {
    /// Every line the session wrote, without line terminators.
    pub(crate) fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    /// Send output to the session unprompted.
    pub(crate) fn emit(&self, text: &str) {
        self.to_session.send(Bytes::from(text.to_string())).unwrap();
    }

    /// Whether the session closed its write side.
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Spawn a mock device that answers each written line with `respond`.
pub(crate) fn mock_device<F>(mut respond: F) -> (ShellHandle, MockDevice)
where
    F: FnMut(&str) -> Option<String> + Send + 'static,
{
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Bytes>();
    let writes = Arc::new(Mutex::new(Vec::new()));
    let closed = Arc::new(AtomicBool::new(false));

    let device = MockDevice {
        writes: Arc::clone(&writes),
        to_session: in_tx.clone(),
        closed: Arc::clone(&closed),
    };

    tokio::spawn(async move {
        let mut pending = String::new();
        while let Some(data) = out_rx.recv().await {
            pending.push_str(&String::from_utf8_lossy(&data));
            while let Some(end) = pending.find('\n') {
                let raw: String = pending.drain(..=end).collect();
                let line = raw.trim_end_matches('\n').trim_end_matches('\r');
                writes.lock().unwrap().push(line.to_string());

                if let Some(reply) = respond(line) {
                    if in_tx.send(Bytes::from(reply)).is_err() {
                        return;
                    }
                }
            }
        }
        closed.store(true, Ordering::SeqCst);
    });

    (ShellHandle::new(in_rx, out_tx), device)
}

/// Echo each line followed by a fixed prompt.
pub(crate) fn respond_with_prompt(
    prompt: &'static str,
) -> impl FnMut(&str) -> Option<String> + Send + 'static {
    move |line| Some(format!("{}\r\n{}", line, prompt))
}

pub(crate) fn descriptor(device_type: &str) -> DeviceDescriptor {
    DeviceDescriptor::builder("192.0.2.1")
        .username("admin")
        .password("pw")
        .device_type(device_type)
        .read_timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

pub(crate) fn descriptor_with_secret(device_type: &str, secret: &str) -> DeviceDescriptor {
    DeviceDescriptor::builder("192.0.2.1")
        .username("admin")
        .password("pw")
        .secret(secret)
        .device_type(device_type)
        .read_timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

/// Run session setup (preparation and prompt discovery) over a mock shell.
pub(crate) async fn open_session(
    descriptor: DeviceDescriptor,
    profile: VendorProfile,
    shell: ShellHandle,
) -> Result<Session> {
    let mut session = Session::new(descriptor, profile);
    session.open(shell).await?;
    Ok(session)
}

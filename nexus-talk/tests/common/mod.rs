//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nexus_talk::{LineSource, Message, MessageSink, Transport};
use parking_lot::Mutex;

pub const POLL: Duration = Duration::from_millis(20);
pub const DEADLINE: Duration = Duration::from_secs(10);

// =============================================================================
// Transports
// =============================================================================

/// In-memory datagram link. Sends to a vanished peer are dropped, like UDP.
pub struct MemoryTransport {
    tx: Sender<Vec<u8>>,
    rx: Mutex<Receiver<Vec<u8>>>,
    poll: Duration,
}

impl MemoryTransport {
    /// Two transports wired to each other.
    pub fn pair(poll: Duration) -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel();
        let (b_tx, a_rx) = mpsc::channel();
        (
            Self { tx: a_tx, rx: Mutex::new(a_rx), poll },
            Self { tx: b_tx, rx: Mutex::new(b_rx), poll },
        )
    }
}

impl Transport for MemoryTransport {
    fn send(&self, payload: &[u8]) -> io::Result<()> {
        let _ = self.tx.send(payload.to_vec());
        Ok(())
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        match self.rx.lock().recv_timeout(self.poll) {
            Ok(datagram) => {
                let len = datagram.len().min(buf.len());
                buf[..len].copy_from_slice(&datagram[..len]);
                Ok(Some(len))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(self.poll);
                Ok(None)
            }
        }
    }
}

/// Every send fails. Receives time out.
pub struct FailingTransport {
    pub poll: Duration,
}

impl Transport for FailingTransport {
    fn send(&self, _payload: &[u8]) -> io::Result<()> {
        Err(io::Error::other("network unreachable"))
    }

    fn recv(&self, _buf: &mut [u8]) -> io::Result<Option<usize>> {
        thread::sleep(self.poll);
        Ok(None)
    }
}

// =============================================================================
// Input and output
// =============================================================================

/// Lines fed from the test thread. Blocks like a terminal until a line
/// arrives; end of input once the sender is dropped.
pub struct ChannelSource {
    rx: Receiver<String>,
}

impl ChannelSource {
    pub fn new() -> (Sender<String>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }
}

impl LineSource for ChannelSource {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.rx.recv().ok())
    }
}

/// Records delivered message text.
#[derive(Clone, Default)]
pub struct CaptureSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CaptureSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }
}

impl MessageSink for CaptureSink {
    fn deliver(&mut self, message: &Message) -> io::Result<()> {
        self.lines.lock().push(message.as_str().to_owned());
        Ok(())
    }
}

// =============================================================================
// Waiting
// =============================================================================

/// Spins until `cond` holds. Panics after [`DEADLINE`].
pub fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + DEADLINE;
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Joins `handle`, panicking if it does not finish within [`DEADLINE`].
pub fn join_within<T>(what: &str, handle: JoinHandle<T>) -> T {
    wait_until(what, || handle.is_finished());
    handle.join().expect("pipeline thread panicked")
}

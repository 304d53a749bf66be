//! The four pipeline workers.
//!
//! ```text
//!  LineSource ──► input_reader ──► [send queue] ──► transmitter ──► Transport
//!                                                                      │
//!  MessageSink ◄── printer ◄── [recv queue] ◄── receiver ◄─────────────┘
//! ```
//!
//! Each worker runs on its own thread and returns how many messages it
//! handled. A worker that fails triggers [`Cause::Fault`] before returning,
//! so no other worker is left waiting on a queue nobody will close.

use core::fmt;
use std::thread;
use std::time::Duration;

use crossbeam_utils::Backoff;
use nexus_channel::{BlockingQueue, Full};
use tracing::{debug, info, warn};

use crate::error::{Result, TalkError};
use crate::io::{LineSource, MessageSink};
use crate::message::Message;
use crate::shutdown::{Cause, Shutdown};
use crate::transport::Transport;

/// Pause between put attempts once spinning has not freed a node.
const FULL_PARK: Duration = Duration::from_millis(1);

/// Identifies a worker in logs, errors and shutdown causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Worker {
    /// Reads local lines into the send queue.
    InputReader,
    /// Sends queued messages to the peer.
    Transmitter,
    /// Receives datagrams into the receive queue.
    Receiver,
    /// Writes received messages to the sink.
    Printer,
}

impl Worker {
    /// All workers, in spawn order.
    pub const ALL: [Worker; 4] = [
        Worker::InputReader,
        Worker::Transmitter,
        Worker::Receiver,
        Worker::Printer,
    ];

    /// Name given to the worker's OS thread.
    pub fn thread_name(self) -> &'static str {
        match self {
            Worker::InputReader => "input-reader",
            Worker::Transmitter => "transmitter",
            Worker::Receiver => "receiver",
            Worker::Printer => "printer",
        }
    }
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Worker::InputReader => "input reader",
            Worker::Transmitter => "transmitter",
            Worker::Receiver => "receiver",
            Worker::Printer => "printer",
        })
    }
}

/// Worker lifecycle: `Running → Draining → Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Moving messages.
    Running,
    /// Shutdown observed or queue closed; finishing what is in hand.
    Draining,
    /// Returned.
    Terminated,
}

/// Logs lifecycle transitions for one worker.
struct Tracker {
    worker: Worker,
    state: Lifecycle,
}

impl Tracker {
    fn start(worker: Worker) -> Self {
        info!(%worker, state = ?Lifecycle::Running, "worker started");
        Self {
            worker,
            state: Lifecycle::Running,
        }
    }

    fn advance(&mut self, to: Lifecycle) {
        if self.state == to {
            return;
        }
        info!(worker = %self.worker, from = ?self.state, to = ?to, "worker state");
        self.state = to;
    }

    /// Moves to `Draining` the first time shutdown is seen.
    fn observe(&mut self, shutdown: &Shutdown) {
        if self.state == Lifecycle::Running && shutdown.is_triggered() {
            self.advance(Lifecycle::Draining);
        }
    }
}

/// Triggers a fault shutdown if the worker unwinds.
struct FaultOnPanic<'a> {
    worker: Worker,
    shutdown: &'a Shutdown,
}

impl Drop for FaultOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.shutdown.trigger(Cause::Fault(self.worker));
        }
    }
}

/// Runs `body` with lifecycle logging and fault propagation.
fn supervise<F>(worker: Worker, shutdown: &Shutdown, body: F) -> Result<u64>
where
    F: FnOnce(&mut Tracker) -> Result<u64>,
{
    let _guard = FaultOnPanic { worker, shutdown };
    let mut tracker = Tracker::start(worker);

    let result = body(&mut tracker);
    if let Err(err) = &result {
        warn!(%worker, error = %err, "worker failed");
        shutdown.trigger(Cause::Fault(worker));
    }

    tracker.advance(Lifecycle::Draining);
    tracker.advance(Lifecycle::Terminated);
    result
}

/// Closes a queue when its only producer exits, whichever way it exits.
struct CloseOnExit<'a>(&'a BlockingQueue<Message>);

impl Drop for CloseOnExit<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Puts `message`, backing off while the arena is out of nodes.
///
/// Returns `false` if shutdown was triggered while the arena was still full,
/// in which case the message is dropped and a warning logged.
fn put_with_backoff(
    worker: Worker,
    queue: &BlockingQueue<Message>,
    shutdown: &Shutdown,
    message: Message,
) -> bool {
    let backoff = Backoff::new();
    let mut message = message;
    let mut warned = false;
    while let Err(Full(back)) = queue.put(message) {
        if shutdown.is_triggered() {
            warn!(%worker, bytes = back.len(), "arena full at shutdown, message dropped");
            return false;
        }
        if !warned {
            warn!(%worker, "arena full, backing off");
            warned = true;
        }
        if backoff.is_completed() {
            thread::sleep(FULL_PARK);
        } else {
            backoff.snooze();
        }
        message = back;
    }
    true
}

// ============================================================================
// Workers
// ============================================================================

/// Reads lines from `source` into `queue` until the sentinel, end of input,
/// or shutdown.
///
/// The sentinel (and end of input, which stands in for it) is queued so the
/// peer shuts down too, then shutdown is triggered with
/// [`Cause::LocalSentinel`] or [`Cause::InputClosed`]. A line read after
/// shutdown was triggered elsewhere is discarded.
///
/// Returns the number of lines queued, not counting the sentinel.
///
/// # Errors
///
/// [`TalkError::Input`] if reading fails.
pub fn input_reader<S: LineSource>(
    mut source: S,
    queue: &BlockingQueue<Message>,
    shutdown: &Shutdown,
) -> Result<u64> {
    const WORKER: Worker = Worker::InputReader;

    supervise(WORKER, shutdown, |tracker| {
        let mut queued = 0;
        while !shutdown.is_triggered() {
            let line = source.next_line().map_err(TalkError::Input)?;

            if shutdown.is_triggered() {
                debug!(worker = %WORKER, "discarding line read after shutdown");
                break;
            }

            let (message, cause) = match line {
                None => (Message::sentinel(), Cause::InputClosed),
                Some(line) => {
                    let message = Message::from(line);
                    if !message.is_sentinel() {
                        let bytes = message.len();
                        if !put_with_backoff(WORKER, queue, shutdown, message) {
                            break;
                        }
                        queued += 1;
                        debug!(worker = %WORKER, bytes, "line queued");
                        continue;
                    }
                    (message, Cause::LocalSentinel)
                }
            };

            tracker.advance(Lifecycle::Draining);
            put_with_backoff(WORKER, queue, shutdown, message);
            queue.close();
            shutdown.trigger(cause);
            break;
        }
        tracker.observe(shutdown);
        Ok(queued)
    })
}

/// Sends every message taken from `queue` through `transport` until the
/// queue is closed and drained.
///
/// Returns the number of messages sent, not counting a forwarded sentinel.
///
/// # Errors
///
/// [`TalkError::Transport`] if a send fails.
pub fn transmitter<X>(
    transport: &X,
    queue: &BlockingQueue<Message>,
    shutdown: &Shutdown,
) -> Result<u64>
where
    X: Transport + ?Sized,
{
    const WORKER: Worker = Worker::Transmitter;

    supervise(WORKER, shutdown, |tracker| {
        let mut sent = 0;
        while let Some(message) = queue.take() {
            tracker.observe(shutdown);
            transport.send(message.as_bytes()).map_err(TalkError::Transport)?;
            if message.is_sentinel() {
                debug!(worker = %WORKER, "sentinel forwarded");
            } else {
                sent += 1;
                debug!(worker = %WORKER, bytes = message.len(), "message sent");
            }
        }
        Ok(sent)
    })
}

/// Polls `transport` and queues each received message until the peer's
/// sentinel arrives or shutdown is observed.
///
/// Each poll waits at most the transport's read timeout, so shutdown is
/// noticed within one poll interval. The receiver is the only producer on
/// `queue` and closes it on every exit path, after its last put, so a
/// datagram in hand when shutdown is triggered still reaches the printer.
///
/// Returns the number of messages queued.
///
/// # Errors
///
/// [`TalkError::Transport`] if a receive fails.
pub fn receiver<X>(
    transport: &X,
    queue: &BlockingQueue<Message>,
    shutdown: &Shutdown,
    max_datagram: usize,
) -> Result<u64>
where
    X: Transport + ?Sized,
{
    const WORKER: Worker = Worker::Receiver;

    supervise(WORKER, shutdown, |tracker| {
        let _close = CloseOnExit(queue);
        let mut buf = vec![0u8; max_datagram];
        let mut received = 0;
        loop {
            if shutdown.is_triggered() {
                tracker.observe(shutdown);
                break;
            }

            let Some(len) = transport.recv(&mut buf).map_err(TalkError::Transport)? else {
                continue;
            };

            let message = Message::from_datagram(&buf[..len]);
            if message.is_sentinel() {
                tracker.advance(Lifecycle::Draining);
                shutdown.trigger(Cause::RemoteSentinel);
                break;
            }

            if put_with_backoff(WORKER, queue, shutdown, message) {
                received += 1;
                debug!(worker = %WORKER, bytes = len, "message queued");
            }
        }
        Ok(received)
    })
}

/// Delivers every message taken from `queue` to `sink` until the queue is
/// closed and drained.
///
/// Returns the number of messages delivered.
///
/// # Errors
///
/// [`TalkError::Output`] if the sink fails.
pub fn printer<K: MessageSink>(
    mut sink: K,
    queue: &BlockingQueue<Message>,
    shutdown: &Shutdown,
) -> Result<u64> {
    const WORKER: Worker = Worker::Printer;

    supervise(WORKER, shutdown, |tracker| {
        let mut printed = 0;
        while let Some(message) = queue.take() {
            tracker.observe(shutdown);
            sink.deliver(&message).map_err(TalkError::Output)?;
            printed += 1;
        }
        Ok(printed)
    })
}

//! Wires the arena, both queues, the shutdown coordinator and the four
//! workers together, then waits for the session to end.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nexus_arena::SharedArena;
use nexus_channel::BlockingQueue;
use tracing::{info, warn};

use crate::config::TalkConfig;
use crate::error::{Result, TalkError};
use crate::io::{LineSource, MessageSink};
use crate::shutdown::{Cause, Shutdown};
use crate::transport::Transport;
use crate::worker::{self, Worker};

/// Outcome of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Why the session ended.
    pub cause: Option<Cause>,
    /// Lines queued by the input reader. `None` if the reader was detached.
    pub lines_read: Option<u64>,
    /// Messages sent to the peer, sentinel excluded.
    pub messages_sent: u64,
    /// Messages received from the peer, sentinel excluded.
    pub messages_received: u64,
    /// Messages written to the sink.
    pub messages_printed: u64,
}

impl PipelineReport {
    /// Returns `true` if the input reader was still blocked on a read when
    /// the session ended and was left behind.
    pub fn reader_detached(&self) -> bool {
        self.lines_read.is_none()
    }
}

/// Runs one endpoint to completion.
///
/// Spawns the input reader, transmitter, receiver and printer on named
/// threads and joins them. A reader still blocked on a terminal read after
/// the other three have finished is detached rather than joined; it holds no
/// lock and will exit on its next loop iteration, or with the process.
///
/// # Errors
///
/// - [`TalkError::Config`] / [`TalkError::Arena`] if the pipeline cannot be
///   built.
/// - [`TalkError::Spawn`] if a worker thread cannot be started.
/// - The error of the first worker that failed, if any did.
pub fn run<S, X, K>(config: &TalkConfig, source: S, transport: X, sink: K) -> Result<PipelineReport>
where
    S: LineSource + 'static,
    X: Transport + 'static,
    K: MessageSink + 'static,
{
    config.validate()?;

    let arena = SharedArena::with_capacity(config.heads, config.nodes);
    let send_queue = Arc::new(BlockingQueue::new(&arena)?);
    let recv_queue = Arc::new(BlockingQueue::new(&arena)?);
    let shutdown = Arc::new(Shutdown::new(send_queue, recv_queue));
    let transport = Arc::new(transport);

    info!(
        local_port = config.local_port,
        remote_host = %config.remote_host,
        remote_port = config.remote_port,
        heads = config.heads,
        nodes = config.nodes,
        "pipeline starting"
    );

    let reader = spawn(Worker::InputReader, &shutdown, {
        let shutdown = Arc::clone(&shutdown);
        move || worker::input_reader(source, shutdown.send_queue(), &shutdown)
    })?;

    let transmitter = spawn(Worker::Transmitter, &shutdown, {
        let shutdown = Arc::clone(&shutdown);
        let transport = Arc::clone(&transport);
        move || worker::transmitter(&*transport, shutdown.send_queue(), &shutdown)
    })?;

    let receiver = spawn(Worker::Receiver, &shutdown, {
        let shutdown = Arc::clone(&shutdown);
        let transport = Arc::clone(&transport);
        let max_datagram = config.max_datagram;
        move || worker::receiver(&*transport, shutdown.recv_queue(), &shutdown, max_datagram)
    })?;

    let printer = spawn(Worker::Printer, &shutdown, {
        let shutdown = Arc::clone(&shutdown);
        move || worker::printer(sink, shutdown.recv_queue(), &shutdown)
    })?;

    let sent = join(Worker::Transmitter, transmitter, &shutdown);
    let received = join(Worker::Receiver, receiver, &shutdown);
    let printed = join(Worker::Printer, printer, &shutdown);

    // The reader usually finishes on its own (sentinel, end of input, or the
    // next line after shutdown). Give it one poll interval, then detach.
    let read = if wait_finished(&reader, config.poll_interval) {
        Some(join(Worker::InputReader, reader, &shutdown))
    } else {
        warn!("input reader still blocked on read, detaching");
        None
    };

    debug_assert!(shutdown.is_complete());
    let cause = shutdown.cause();

    let mut errors = Vec::new();
    let report = PipelineReport {
        cause,
        lines_read: read.map(|r| settle(Worker::InputReader, r, &mut errors)),
        messages_sent: settle(Worker::Transmitter, sent, &mut errors),
        messages_received: settle(Worker::Receiver, received, &mut errors),
        messages_printed: settle(Worker::Printer, printed, &mut errors),
    };

    if let Some(err) = first_error(cause, errors) {
        return Err(err);
    }

    info!(?report, "pipeline finished");
    Ok(report)
}

/// Spawns `body` on a named thread. On failure, shuts down whatever is
/// already running.
fn spawn<F>(worker: Worker, shutdown: &Shutdown, body: F) -> Result<JoinHandle<Result<u64>>>
where
    F: FnOnce() -> Result<u64> + Send + 'static,
{
    thread::Builder::new()
        .name(worker.thread_name().to_owned())
        .spawn(body)
        .map_err(|source| {
            shutdown.trigger(Cause::Fault(worker));
            TalkError::Spawn { worker, source }
        })
}

fn join(worker: Worker, handle: JoinHandle<Result<u64>>, shutdown: &Shutdown) -> Result<u64> {
    handle.join().unwrap_or_else(|_| {
        shutdown.trigger(Cause::Fault(worker));
        Err(TalkError::WorkerPanicked { worker })
    })
}

fn wait_finished<T>(handle: &JoinHandle<T>, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
    true
}

fn settle(worker: Worker, result: Result<u64>, errors: &mut Vec<(Worker, TalkError)>) -> u64 {
    result.unwrap_or_else(|err| {
        errors.push((worker, err));
        0
    })
}

/// Picks the error of the worker that triggered the fault shutdown, or the
/// first one collected. The rest are logged.
fn first_error(cause: Option<Cause>, mut errors: Vec<(Worker, TalkError)>) -> Option<TalkError> {
    if errors.is_empty() {
        return None;
    }

    let idx = match cause {
        Some(Cause::Fault(first)) => errors.iter().position(|(w, _)| *w == first).unwrap_or(0),
        _ => 0,
    };
    let (_, err) = errors.remove(idx);
    for (worker, other) in &errors {
        warn!(%worker, error = %other, "secondary worker error");
    }
    Some(err)
}

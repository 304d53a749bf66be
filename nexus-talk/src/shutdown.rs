//! Shutdown coordination across the four workers.
//!
//! One atomic flag, observed at the top of every worker loop, plus the two
//! queues. Triggering sets the flag and closes the send queue, waking the
//! transmitter. The receive queue is closed by the receiver itself once it
//! observes the flag, within one poll interval and after its last put, so
//! nothing the receiver already holds is lost.

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_utils::CachePadded;
use nexus_channel::BlockingQueue;
use parking_lot::Mutex;
use tracing::info;

use crate::message::Message;
use crate::worker::Worker;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    /// The local user typed the sentinel.
    LocalSentinel,
    /// The peer sent the sentinel.
    RemoteSentinel,
    /// Local input reached end of file.
    InputClosed,
    /// A worker failed.
    Fault(Worker),
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cause::LocalSentinel => write!(f, "local sentinel"),
            Cause::RemoteSentinel => write!(f, "remote sentinel"),
            Cause::InputClosed => write!(f, "input closed"),
            Cause::Fault(worker) => write!(f, "{worker} fault"),
        }
    }
}

/// Shared shutdown state for one endpoint.
pub struct Shutdown {
    triggered: CachePadded<AtomicBool>,
    cause: Mutex<Option<Cause>>,
    send_queue: Arc<BlockingQueue<Message>>,
    recv_queue: Arc<BlockingQueue<Message>>,
}

impl Shutdown {
    /// Creates an untriggered coordinator over the two pipeline queues.
    pub fn new(
        send_queue: Arc<BlockingQueue<Message>>,
        recv_queue: Arc<BlockingQueue<Message>>,
    ) -> Self {
        Self {
            triggered: CachePadded::new(AtomicBool::new(false)),
            cause: Mutex::new(None),
            send_queue,
            recv_queue,
        }
    }

    /// Sets the flag and closes the send queue.
    ///
    /// The first cause recorded wins. Returns `true` for the call that
    /// recorded it. Safe to call any number of times from any thread.
    pub fn trigger(&self, cause: Cause) -> bool {
        let first = {
            let mut slot = self.cause.lock();
            if slot.is_none() {
                *slot = Some(cause);
                true
            } else {
                false
            }
        };

        self.triggered.store(true, Ordering::Release);
        self.send_queue.close();

        if first {
            info!(%cause, "shutdown triggered");
        }
        first
    }

    /// Returns `true` once any worker has triggered shutdown.
    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Returns the first recorded cause.
    pub fn cause(&self) -> Option<Cause> {
        *self.cause.lock()
    }

    /// Returns `true` once the flag is set and both queues are closed.
    ///
    /// The receive queue closes when the receiver exits, so this may lag
    /// [`is_triggered`](Self::is_triggered) by up to one poll interval.
    pub fn is_complete(&self) -> bool {
        self.is_triggered() && self.send_queue.is_closed() && self.recv_queue.is_closed()
    }

    /// The local-input → transport queue.
    pub fn send_queue(&self) -> &Arc<BlockingQueue<Message>> {
        &self.send_queue
    }

    /// The transport → output queue.
    pub fn recv_queue(&self) -> &Arc<BlockingQueue<Message>> {
        &self.recv_queue
    }
}

impl fmt::Debug for Shutdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shutdown")
            .field("triggered", &self.is_triggered())
            .field("cause", &self.cause())
            .finish_non_exhaustive()
    }
}

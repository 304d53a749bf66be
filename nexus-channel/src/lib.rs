//! A blocking FIFO queue over a cursor list in a shared, fixed-capacity arena.
//!
//! Every queue owns one [`List`] whose nodes come from a [`SharedArena`].
//! Several queues may draw from the same arena, so one busy queue can hold
//! nodes that an idle one is not using.
//!
//! ```text
//! put()  ──► [ mutex: closed, List ] ──► take()
//!                     │                    ▲
//!                     │ notify_one         │ wait while empty && !closed
//!                     └──── not_empty ─────┘
//! ```
//!
//! # Semantics
//!
//! - [`put`](BlockingQueue::put) never blocks and fails only when the arena
//!   has no free node. The item is handed back as [`Full`] and the caller
//!   decides how to back off. Closing does not refuse items: anything put
//!   after [`close`](BlockingQueue::close) is still delivered to `take`.
//! - [`take`](BlockingQueue::take) is the only blocking operation. It waits
//!   while the queue is empty and open, and returns `None` once the queue is
//!   closed and drained.
//! - [`close`](BlockingQueue::close) wakes **every** waiter. Items already
//!   queued are still delivered.
//!
//! # Example
//!
//! ```
//! use nexus_arena::SharedArena;
//! use nexus_channel::BlockingQueue;
//!
//! let arena = SharedArena::with_capacity(2, 16);
//! let queue = BlockingQueue::new(&arena).unwrap();
//!
//! queue.put("a").unwrap();
//! queue.put("b").unwrap();
//! queue.close();
//!
//! assert_eq!(queue.take(), Some("a"));
//! assert_eq!(queue.take(), Some("b"));
//! assert_eq!(queue.take(), None);
//! ```
//!
//! # Sharing Between Threads
//!
//! The queue is `Sync`; share it with an `Arc`. Any number of threads may put
//! and take. Each item is delivered to exactly one taker.
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use nexus_arena::SharedArena;
//! use nexus_channel::BlockingQueue;
//!
//! let arena = SharedArena::new();
//! let queue = Arc::new(BlockingQueue::new(&arena).unwrap());
//!
//! let consumer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         let mut sum = 0;
//!         while let Some(v) = queue.take() {
//!             sum += v;
//!         }
//!         sum
//!     })
//! };
//!
//! for i in 1..=10 {
//!     queue.put(i).unwrap();
//! }
//! queue.close();
//!
//! assert_eq!(consumer.join().unwrap(), 55);
//! ```
//!
//! # Lock Order
//!
//! Every operation takes the queue lock first and the arena lock second.
//! Nothing in this crate ever holds two queue locks at once.

#![warn(missing_docs)]

use core::fmt;
use std::time::{Duration, Instant};

use nexus_arena::{List, SharedArena};
pub use nexus_arena::{ArenaError, Full};
use parking_lot::{Condvar, Mutex};
use tracing::trace;

struct State<T> {
    // `None` only while the queue is being dropped.
    list: Option<List<T>>,
    closed: bool,
}

impl<T> State<T> {
    #[inline]
    fn list(&self) -> &List<T> {
        self.list.as_ref().expect("queue list is live until drop")
    }

    #[inline]
    fn list_mut(&mut self) -> &mut List<T> {
        self.list.as_mut().expect("queue list is live until drop")
    }
}

/// A multi-producer, multi-consumer blocking FIFO queue.
///
/// Capacity is not a property of the queue: it is the number of free nodes in
/// the arena the queue was created from.
pub struct BlockingQueue<T> {
    arena: SharedArena<T>,
    state: Mutex<State<T>>,
    not_empty: Condvar,
}

impl<T> BlockingQueue<T> {
    /// Creates an open, empty queue whose list lives in `arena`.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::HeadsExhausted`] if the arena has no free header.
    pub fn new(arena: &SharedArena<T>) -> Result<Self, ArenaError> {
        let list = List::new(&mut arena.lock())?;

        Ok(Self {
            arena: arena.clone(),
            state: Mutex::new(State {
                list: Some(list),
                closed: false,
            }),
            not_empty: Condvar::new(),
        })
    }

    /// Appends `item` and wakes one waiting taker. Never blocks.
    ///
    /// A closed queue still accepts items; they are delivered before `take`
    /// reports the end of the queue.
    ///
    /// # Errors
    ///
    /// `Err(Full(item))` if the arena has no free node.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_arena::SharedArena;
    /// use nexus_channel::{BlockingQueue, Full};
    ///
    /// let arena = SharedArena::with_capacity(1, 1);
    /// let queue = BlockingQueue::new(&arena).unwrap();
    ///
    /// queue.put(1).unwrap();
    /// assert_eq!(queue.put(2), Err(Full(2)));
    ///
    /// queue.close();
    /// assert_eq!(queue.take(), Some(1));
    /// queue.put(3).unwrap();
    /// assert_eq!(queue.take(), Some(3));
    /// assert_eq!(queue.take(), None);
    /// ```
    pub fn put(&self, item: T) -> Result<(), Full<T>> {
        let mut state = self.state.lock();
        state.list_mut().append(&mut self.arena.lock(), item)?;
        drop(state);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes the oldest item, waiting while the queue is empty and open.
    ///
    /// Returns `None` once the queue is closed and every queued item has been
    /// taken.
    pub fn take(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = self.pop_front(&mut state) {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Removes the oldest item without waiting.
    ///
    /// # Errors
    ///
    /// - `Err(TakeError::Empty)` if the queue is empty but open.
    /// - `Err(TakeError::Closed)` if the queue is closed and drained.
    pub fn try_take(&self) -> Result<T, TakeError> {
        let mut state = self.state.lock();
        match self.pop_front(&mut state) {
            Some(item) => Ok(item),
            None if state.closed => Err(TakeError::Closed),
            None => Err(TakeError::Empty),
        }
    }

    /// Removes the oldest item, waiting at most `timeout` for one to arrive.
    ///
    /// # Errors
    ///
    /// - `Err(TakeError::Empty)` if nothing arrived before the deadline.
    /// - `Err(TakeError::Closed)` if the queue is closed and drained.
    pub fn take_timeout(&self, timeout: Duration) -> Result<T, TakeError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(item) = self.pop_front(&mut state) {
                return Ok(item);
            }
            if state.closed {
                return Err(TakeError::Closed);
            }
            if self.not_empty.wait_until(&mut state, deadline).timed_out() {
                let closed = state.closed;
                return self.pop_front(&mut state).ok_or(if closed {
                    TakeError::Closed
                } else {
                    TakeError::Empty
                });
            }
        }
    }

    /// Closes the queue and wakes every waiting taker.
    ///
    /// Returns `true` if this call closed the queue, `false` if it was
    /// already closed. Items still queued remain available to `take`.
    pub fn close(&self) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        let pending = state.list().count(&self.arena.lock());
        drop(state);

        self.not_empty.notify_all();
        trace!(pending, "queue closed");
        true
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Returns the number of queued items.
    pub fn len(&self) -> usize {
        let state = self.state.lock();
        state.list().count(&self.arena.lock())
    }

    /// Returns `true` if no items are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the arena this queue draws its nodes from.
    #[inline]
    pub fn arena(&self) -> &SharedArena<T> {
        &self.arena
    }

    /// Pops the head. Caller holds the queue lock.
    fn pop_front(&self, state: &mut State<T>) -> Option<T> {
        let mut arena = self.arena.lock();
        let list = state.list_mut();
        list.first(&mut arena)?;
        list.remove(&mut arena)
    }
}

impl<T> Drop for BlockingQueue<T> {
    fn drop(&mut self) {
        // Undelivered items are dropped; header and nodes go back to the arena.
        if let Some(list) = self.state.get_mut().list.take() {
            list.free(&mut self.arena.lock());
        }
    }
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingQueue")
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error returned by [`BlockingQueue::try_take`] and
/// [`BlockingQueue::take_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeError {
    /// The queue is empty but still open.
    ///
    /// An item may arrive later.
    Empty,

    /// The queue is closed and no items remain.
    Closed,
}

impl TakeError {
    /// Returns `true` if this error is the `Empty` variant.
    pub fn is_empty(&self) -> bool {
        matches!(self, TakeError::Empty)
    }

    /// Returns `true` if this error is the `Closed` variant.
    pub fn is_closed(&self) -> bool {
        matches!(self, TakeError::Closed)
    }
}

impl fmt::Display for TakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TakeError::Empty => write!(f, "queue empty"),
            TakeError::Closed => write!(f, "queue closed"),
        }
    }
}

impl std::error::Error for TakeError {}

//! Thread-safe arena handle.
//!
//! Several lists may live in one arena and be driven from different threads.
//! [`SharedArena`] serializes every pool acquire/release behind one
//! `parking_lot` mutex. Callers that also hold a lock of their own (a queue
//! lock, say) must always take that lock first and the arena lock second.

use core::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::Arena;

/// Cloneable handle to an [`Arena`] shared between threads.
///
/// # Example
///
/// ```
/// use nexus_arena::{List, SharedArena};
///
/// let shared: SharedArena<u64> = SharedArena::with_capacity(4, 16);
/// let other = shared.clone();
///
/// let handle = std::thread::spawn(move || {
///     let mut arena = other.lock();
///     let mut list = List::new(&mut arena).unwrap();
///     list.append(&mut arena, 7).unwrap();
///     list.free(&mut arena);
/// });
/// handle.join().unwrap();
///
/// assert_eq!(shared.lock().live_heads(), 0);
/// ```
pub struct SharedArena<T> {
    inner: Arc<Mutex<Arena<T>>>,
}

impl<T> SharedArena<T> {
    /// Creates a shared arena with the default capacities.
    pub fn new() -> Self {
        Self::from_arena(Arena::new())
    }

    /// Creates a shared arena with exactly `heads` headers and `nodes` nodes.
    ///
    /// # Panics
    ///
    /// Panics if either capacity is 0 or does not fit a `u32` index.
    pub fn with_capacity(heads: usize, nodes: usize) -> Self {
        Self::from_arena(Arena::with_capacity(heads, nodes))
    }

    /// Wraps an existing arena.
    pub fn from_arena(arena: Arena<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(arena)),
        }
    }

    /// Locks the arena for exclusive use by the current thread.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, Arena<T>> {
        self.inner.lock()
    }

    /// Returns `true` if both handles refer to the same arena.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for SharedArena<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SharedArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(arena) => f.debug_tuple("SharedArena").field(&*arena).finish(),
            None => f.write_str("SharedArena(<locked>)"),
        }
    }
}

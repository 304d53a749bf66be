//! The arena: one header pool and one node pool shared by every list.
//!
//! Lists never own memory. A [`List`](crate::List) is a handle to a header
//! record; its nodes are records in the node pool. Capacity is shared: one
//! list may hold every node if the others are empty.
//!
//! # Critical Invariant: Same Arena Instance
//!
//! A list must always be used with the arena that created it. Handles carry
//! the id of their arena and mixing arenas trips a debug assertion.

use core::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::{Full, Index, Pool};

/// Default number of list headers (the classic list-module limit).
pub const DEFAULT_HEADS: usize = 10;

/// Default number of list nodes shared across all lists.
pub const DEFAULT_NODES: usize = 100;

static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(0);

/// Position of a list cursor.
///
/// A cursor that is off the chain always remembers which side it fell off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cursor {
    At(u32),
    BeforeStart,
    AfterEnd,
}

/// Header record: the structural state of one list.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Header {
    pub(crate) first: u32,
    pub(crate) last: u32,
    pub(crate) cursor: Cursor,
    pub(crate) count: usize,
}

impl Header {
    pub(crate) const EMPTY: Self = Self {
        first: u32::NONE,
        last: u32::NONE,
        cursor: Cursor::AfterEnd,
        count: 0,
    };
}

/// Node record: one payload plus its links.
#[derive(Debug)]
pub(crate) struct Node<T> {
    pub(crate) item: T,
    pub(crate) prev: u32,
    pub(crate) next: u32,
}

/// Fixed-capacity backing store for lists.
///
/// Both pools are allocated once, here; no list operation allocates.
///
/// # Example
///
/// ```
/// use nexus_arena::{Arena, List};
///
/// let mut arena: Arena<&str> = Arena::with_capacity(2, 8);
/// let mut list = List::new(&mut arena).unwrap();
///
/// list.append(&mut arena, "a").unwrap();
/// assert_eq!(arena.live_nodes(), 1);
/// assert_eq!(arena.live_heads(), 1);
///
/// list.free(&mut arena);
/// assert_eq!(arena.live_nodes(), 0);
/// assert_eq!(arena.live_heads(), 0);
/// ```
pub struct Arena<T> {
    id: u32,
    pub(crate) heads: Pool<Header>,
    pub(crate) nodes: Pool<Node<T>>,
}

impl<T> Arena<T> {
    /// Creates an arena with [`DEFAULT_HEADS`] headers and [`DEFAULT_NODES`] nodes.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HEADS, DEFAULT_NODES)
    }

    /// Creates an arena with exactly `heads` list headers and `nodes` list nodes.
    ///
    /// # Panics
    ///
    /// Panics if either capacity is 0 or does not fit a `u32` index.
    pub fn with_capacity(heads: usize, nodes: usize) -> Self {
        Self {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            heads: Pool::with_capacity(heads),
            nodes: Pool::with_capacity(nodes),
        }
    }

    /// Returns the fixed number of list headers.
    #[inline]
    pub fn head_capacity(&self) -> usize {
        self.heads.capacity()
    }

    /// Returns the fixed number of list nodes.
    #[inline]
    pub fn node_capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Returns the number of lists currently alive.
    #[inline]
    pub fn live_heads(&self) -> usize {
        self.heads.len()
    }

    /// Returns the number of nodes currently linked into some list.
    #[inline]
    pub fn live_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn id(&self) -> u32 {
        self.id
    }

    // ========================================================================
    // Record access
    // ========================================================================

    #[inline]
    pub(crate) fn header(&self, idx: u32) -> Header {
        *self.heads.get(idx).expect("list header released")
    }

    #[inline]
    pub(crate) fn store_header(&mut self, idx: u32, header: Header) {
        *self.heads.get_mut(idx).expect("list header released") = header;
    }

    #[inline]
    pub(crate) fn node(&self, idx: u32) -> &Node<T> {
        self.nodes.get(idx).expect("linked node is live")
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, idx: u32) -> &mut Node<T> {
        self.nodes.get_mut(idx).expect("linked node is live")
    }

    /// Acquires an unlinked node holding `item`.
    #[inline]
    pub(crate) fn alloc_node(&mut self, item: T) -> Result<u32, Full<T>> {
        self.nodes
            .acquire(Node {
                item,
                prev: u32::NONE,
                next: u32::NONE,
            })
            .map_err(|Full(node)| Full(node.item))
    }

    /// Returns an unlinked node to the pool and hands back its item.
    #[inline]
    pub(crate) fn free_node(&mut self, idx: u32) -> T {
        self.nodes.release(idx).expect("linked node is live").item
    }

    // ========================================================================
    // Link operations (relink only, no alloc/dealloc)
    // ========================================================================

    pub(crate) fn link_front(&mut self, header: &mut Header, idx: u32) {
        let node = self.node_mut(idx);
        node.prev = u32::NONE;
        node.next = header.first;

        if header.first.is_some() {
            self.node_mut(header.first).prev = idx;
        } else {
            header.last = idx;
        }

        header.first = idx;
        header.count += 1;
    }

    pub(crate) fn link_back(&mut self, header: &mut Header, idx: u32) {
        let node = self.node_mut(idx);
        node.prev = header.last;
        node.next = u32::NONE;

        if header.last.is_some() {
            self.node_mut(header.last).next = idx;
        } else {
            header.first = idx;
        }

        header.last = idx;
        header.count += 1;
    }

    pub(crate) fn link_after(&mut self, header: &mut Header, after: u32, idx: u32) {
        let next = self.node(after).next;
        let node = self.node_mut(idx);
        node.prev = after;
        node.next = next;

        self.node_mut(after).next = idx;

        if next.is_some() {
            self.node_mut(next).prev = idx;
        } else {
            header.last = idx;
        }

        header.count += 1;
    }

    pub(crate) fn link_before(&mut self, header: &mut Header, before: u32, idx: u32) {
        let prev = self.node(before).prev;
        let node = self.node_mut(idx);
        node.next = before;
        node.prev = prev;

        self.node_mut(before).prev = idx;

        if prev.is_some() {
            self.node_mut(prev).next = idx;
        } else {
            header.first = idx;
        }

        header.count += 1;
    }

    /// Unlinks `idx` from the chain and returns its former `(prev, next)`.
    pub(crate) fn unlink(&mut self, header: &mut Header, idx: u32) -> (u32, u32) {
        let node = self.node_mut(idx);
        let prev = node.prev;
        let next = node.next;
        node.prev = u32::NONE;
        node.next = u32::NONE;

        if prev.is_some() {
            self.node_mut(prev).next = next;
        } else {
            header.first = next;
        }

        if next.is_some() {
            self.node_mut(next).prev = prev;
        } else {
            header.last = prev;
        }

        header.count -= 1;
        (prev, next)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("heads", &self.heads)
            .field("nodes", &self.nodes)
            .finish_non_exhaustive()
    }
}

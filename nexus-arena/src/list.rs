//! Cursor-based doubly-linked list over an [`Arena`].
//!
//! A [`List`] is a move-only handle. Every operation takes the arena that
//! created it, so the borrow checker enforces that nobody else touches the
//! arena while a list operation runs.
//!
//! Each list carries a cursor. It either points at a node or sits off the
//! chain on one side, [`Boundary::BeforeStart`] or [`Boundary::AfterEnd`].
//! Navigation, insertion and removal are all relative to that cursor.
//!
//! # Example
//!
//! ```
//! use nexus_arena::{Arena, Boundary, List};
//!
//! let mut arena: Arena<char> = Arena::new();
//! let mut list = List::new(&mut arena).unwrap();
//!
//! list.append(&mut arena, 'a').unwrap();
//! list.append(&mut arena, 'b').unwrap();
//! list.prepend(&mut arena, 'z').unwrap();
//!
//! assert_eq!(list.first(&mut arena), Some(&'z'));
//! assert_eq!(list.next(&mut arena), Some(&'a'));
//! assert_eq!(list.remove(&mut arena), Some('a'));
//! assert_eq!(list.curr(&arena), Some(&'b'));
//!
//! assert_eq!(list.next(&mut arena), None);
//! assert_eq!(list.boundary(&arena), Boundary::AfterEnd);
//!
//! let items: Vec<char> = list.iter(&arena).copied().collect();
//! assert_eq!(items, ['z', 'b']);
//!
//! list.free(&mut arena);
//! ```

use core::fmt;
use core::marker::PhantomData;

use crate::arena::{Arena, Cursor, Header};
use crate::{ArenaError, Full, Index};

/// Where the cursor is relative to the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The cursor points at a node.
    None,
    /// The cursor is before the first node.
    BeforeStart,
    /// The cursor is after the last node.
    AfterEnd,
}

/// Predicate used by [`List::search`].
///
/// Implemented for every `FnMut(&T, &A) -> bool`.
pub trait Matcher<T, A: ?Sized> {
    /// Returns `true` if `item` matches `arg`.
    fn matches(&mut self, item: &T, arg: &A) -> bool;
}

impl<T, A: ?Sized, F> Matcher<T, A> for F
where
    F: FnMut(&T, &A) -> bool,
{
    #[inline]
    fn matches(&mut self, item: &T, arg: &A) -> bool {
        self(item, arg)
    }
}

/// Receives each item when a list is freed with [`List::free_with`].
///
/// Implemented for every `FnMut(T)`.
pub trait Reclaim<T> {
    /// Takes ownership of one released item.
    fn reclaim(&mut self, item: T);
}

impl<T, F> Reclaim<T> for F
where
    F: FnMut(T),
{
    #[inline]
    fn reclaim(&mut self, item: T) {
        self(item)
    }
}

#[derive(Clone, Copy)]
enum Side {
    After,
    Before,
}

/// Handle to one list living in an [`Arena`].
///
/// The handle is not `Clone`: it is consumed by [`free`](Self::free),
/// [`free_with`](Self::free_with), or by being the argument of
/// [`concat`](Self::concat). Dropping a handle without freeing it leaks its
/// header and nodes until the arena itself is dropped.
#[must_use = "a list keeps its header and nodes until freed or concatenated"]
pub struct List<T> {
    header: u32,
    arena: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> List<T> {
    /// Creates an empty list in `arena`.
    ///
    /// The cursor of a new list is [`Boundary::AfterEnd`].
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::HeadsExhausted`] if every header is in use.
    pub fn new(arena: &mut Arena<T>) -> Result<Self, ArenaError> {
        let header = arena
            .heads
            .acquire(Header::EMPTY)
            .map_err(|_| ArenaError::HeadsExhausted {
                capacity: arena.head_capacity(),
            })?;

        Ok(Self {
            header,
            arena: arena.id(),
            _marker: PhantomData,
        })
    }

    #[inline]
    fn load(&self, arena: &Arena<T>) -> Header {
        debug_assert_eq!(self.arena, arena.id(), "list used with a foreign arena");
        arena.header(self.header)
    }

    #[inline]
    fn store(&self, arena: &mut Arena<T>, header: Header) {
        arena.store_header(self.header, header);
    }

    #[inline]
    fn item_at(arena: &Arena<T>, cursor: Cursor) -> Option<&T> {
        match cursor {
            Cursor::At(idx) => Some(&arena.node(idx).item),
            Cursor::BeforeStart | Cursor::AfterEnd => None,
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Returns the number of items in the list.
    #[inline]
    pub fn count(&self, arena: &Arena<T>) -> usize {
        self.load(arena).count
    }

    /// Returns `true` if the list holds no items.
    #[inline]
    pub fn is_empty(&self, arena: &Arena<T>) -> bool {
        self.count(arena) == 0
    }

    /// Returns where the cursor sits relative to the chain.
    #[inline]
    pub fn boundary(&self, arena: &Arena<T>) -> Boundary {
        match self.load(arena).cursor {
            Cursor::At(_) => Boundary::None,
            Cursor::BeforeStart => Boundary::BeforeStart,
            Cursor::AfterEnd => Boundary::AfterEnd,
        }
    }

    /// Returns the item under the cursor, or `None` if the cursor is off the chain.
    #[inline]
    pub fn curr<'a>(&self, arena: &'a Arena<T>) -> Option<&'a T> {
        Self::item_at(arena, self.load(arena).cursor)
    }

    /// Returns a front-to-back iterator. The cursor is not moved.
    pub fn iter<'a>(&self, arena: &'a Arena<T>) -> Iter<'a, T> {
        let header = self.load(arena);
        Iter {
            arena,
            front: header.first,
            back: header.last,
        }
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Moves the cursor to the first item and returns it.
    ///
    /// On an empty list the cursor moves to [`Boundary::BeforeStart`].
    pub fn first<'a>(&mut self, arena: &'a mut Arena<T>) -> Option<&'a T> {
        let mut header = self.load(arena);
        header.cursor = match header.first.get() {
            Some(idx) => Cursor::At(idx),
            None => Cursor::BeforeStart,
        };
        self.store(arena, header);
        Self::item_at(arena, header.cursor)
    }

    /// Moves the cursor to the last item and returns it.
    ///
    /// On an empty list the cursor moves to [`Boundary::AfterEnd`].
    pub fn last<'a>(&mut self, arena: &'a mut Arena<T>) -> Option<&'a T> {
        let mut header = self.load(arena);
        header.cursor = match header.last.get() {
            Some(idx) => Cursor::At(idx),
            None => Cursor::AfterEnd,
        };
        self.store(arena, header);
        Self::item_at(arena, header.cursor)
    }

    /// Advances the cursor and returns the new current item.
    ///
    /// Stepping past the last item, or calling this while the cursor is off
    /// the chain on either side, leaves the cursor at [`Boundary::AfterEnd`].
    pub fn next<'a>(&mut self, arena: &'a mut Arena<T>) -> Option<&'a T> {
        let mut header = self.load(arena);
        header.cursor = match header.cursor {
            Cursor::At(idx) => match arena.node(idx).next.get() {
                Some(next) => Cursor::At(next),
                None => Cursor::AfterEnd,
            },
            Cursor::BeforeStart | Cursor::AfterEnd => Cursor::AfterEnd,
        };
        self.store(arena, header);
        Self::item_at(arena, header.cursor)
    }

    /// Backs the cursor up and returns the new current item.
    ///
    /// Stepping before the first item, or calling this while the cursor is
    /// off the chain on either side, leaves the cursor at
    /// [`Boundary::BeforeStart`].
    pub fn prev<'a>(&mut self, arena: &'a mut Arena<T>) -> Option<&'a T> {
        let mut header = self.load(arena);
        header.cursor = match header.cursor {
            Cursor::At(idx) => match arena.node(idx).prev.get() {
                Some(prev) => Cursor::At(prev),
                None => Cursor::BeforeStart,
            },
            Cursor::BeforeStart | Cursor::AfterEnd => Cursor::BeforeStart,
        };
        self.store(arena, header);
        Self::item_at(arena, header.cursor)
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Adds `item` after the last item and makes it current.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(item))` if the node pool is exhausted. The list is
    /// unchanged.
    pub fn append(&mut self, arena: &mut Arena<T>, item: T) -> Result<(), Full<T>> {
        let idx = arena.alloc_node(item)?;
        let mut header = self.load(arena);
        arena.link_back(&mut header, idx);
        header.cursor = Cursor::At(idx);
        self.store(arena, header);
        Ok(())
    }

    /// Adds `item` before the first item and makes it current.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(item))` if the node pool is exhausted. The list is
    /// unchanged.
    pub fn prepend(&mut self, arena: &mut Arena<T>, item: T) -> Result<(), Full<T>> {
        let idx = arena.alloc_node(item)?;
        let mut header = self.load(arena);
        arena.link_front(&mut header, idx);
        header.cursor = Cursor::At(idx);
        self.store(arena, header);
        Ok(())
    }

    /// Adds `item` directly after the current item and makes it current.
    ///
    /// Before the start this inserts at the head; after the end it inserts at
    /// the tail.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(item))` if the node pool is exhausted. The list is
    /// unchanged.
    pub fn insert_after(&mut self, arena: &mut Arena<T>, item: T) -> Result<(), Full<T>> {
        self.insert(arena, item, Side::After)
    }

    /// Adds `item` directly before the current item and makes it current.
    ///
    /// Before the start this inserts at the head; after the end it inserts at
    /// the tail.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(item))` if the node pool is exhausted. The list is
    /// unchanged.
    pub fn insert_before(&mut self, arena: &mut Arena<T>, item: T) -> Result<(), Full<T>> {
        self.insert(arena, item, Side::Before)
    }

    fn insert(&mut self, arena: &mut Arena<T>, item: T, side: Side) -> Result<(), Full<T>> {
        let idx = arena.alloc_node(item)?;
        let mut header = self.load(arena);
        match (header.cursor, side) {
            (Cursor::At(at), Side::After) => arena.link_after(&mut header, at, idx),
            (Cursor::At(at), Side::Before) => arena.link_before(&mut header, at, idx),
            (Cursor::BeforeStart, _) => arena.link_front(&mut header, idx),
            (Cursor::AfterEnd, _) => arena.link_back(&mut header, idx),
        }
        header.cursor = Cursor::At(idx);
        self.store(arena, header);
        Ok(())
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Removes the current item and returns it.
    ///
    /// The following item becomes current. When the tail is removed the new
    /// tail becomes current; when the list becomes empty the cursor is
    /// [`Boundary::AfterEnd`]. If the cursor is off the chain nothing changes
    /// and `None` is returned.
    pub fn remove(&mut self, arena: &mut Arena<T>) -> Option<T> {
        let mut header = self.load(arena);
        let Cursor::At(idx) = header.cursor else {
            return None;
        };

        let (prev, next) = arena.unlink(&mut header, idx);
        header.cursor = match (next.get(), prev.get()) {
            (Some(next), _) => Cursor::At(next),
            (None, Some(prev)) => Cursor::At(prev),
            (None, None) => Cursor::AfterEnd,
        };
        self.store(arena, header);

        Some(arena.free_node(idx))
    }

    /// Removes the last item and returns it. The new last item becomes current.
    ///
    /// Works regardless of where the cursor is. Returns `None` on an empty list.
    pub fn trim(&mut self, arena: &mut Arena<T>) -> Option<T> {
        let mut header = self.load(arena);
        let idx = header.last.get()?;

        arena.unlink(&mut header, idx);
        header.cursor = match header.last.get() {
            Some(last) => Cursor::At(last),
            None => Cursor::AfterEnd,
        };
        self.store(arena, header);

        Some(arena.free_node(idx))
    }

    // ========================================================================
    // Whole-list operations
    // ========================================================================

    /// Moves every item of `other` to the end of `self`, in order.
    ///
    /// The cursor of `self` is unchanged. The header of `other` is returned
    /// to the arena and may be reused by the next [`List::new`]. O(1).
    pub fn concat(&mut self, arena: &mut Arena<T>, other: List<T>) {
        let mut header = self.load(arena);
        let donor = other.load(arena);

        if donor.count > 0 {
            if header.count == 0 {
                header.first = donor.first;
            } else {
                arena.node_mut(header.last).next = donor.first;
                arena.node_mut(donor.first).prev = header.last;
            }
            header.last = donor.last;
            header.count += donor.count;
            self.store(arena, header);
        }

        arena.heads.release(other.header);
    }

    /// Releases the list and every node it holds, dropping the items.
    pub fn free(self, arena: &mut Arena<T>) {
        self.free_with(arena, drop::<T>);
    }

    /// Releases the list and every node it holds, handing each item to
    /// `reclaim` in front-to-back order.
    pub fn free_with<R: Reclaim<T>>(self, arena: &mut Arena<T>, mut reclaim: R) {
        let header = self.load(arena);

        let mut idx = header.first;
        while let Some(curr) = idx.get() {
            idx = arena.node(curr).next;
            reclaim.reclaim(arena.free_node(curr));
        }

        arena.heads.release(self.header);
    }

    /// Scans from the current item towards the end for the first item where
    /// `matcher` returns `true`, and makes it current.
    ///
    /// The scan starts at the cursor inclusive, or at the head if the cursor
    /// is before the start. It never wraps. Without a match the cursor ends
    /// at [`Boundary::AfterEnd`] and `None` is returned.
    pub fn search<'a, A, M>(
        &mut self,
        arena: &'a mut Arena<T>,
        mut matcher: M,
        arg: &A,
    ) -> Option<&'a T>
    where
        A: ?Sized,
        M: Matcher<T, A>,
    {
        let mut header = self.load(arena);
        let mut idx = match header.cursor {
            Cursor::At(idx) => idx,
            Cursor::BeforeStart => header.first,
            Cursor::AfterEnd => return None,
        };

        while let Some(curr) = idx.get() {
            let node = arena.node(curr);
            let next = node.next;
            if matcher.matches(&node.item, arg) {
                header.cursor = Cursor::At(curr);
                self.store(arena, header);
                return Some(&arena.node(curr).item);
            }
            idx = next;
        }

        header.cursor = Cursor::AfterEnd;
        self.store(arena, header);
        None
    }
}

impl<T> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("header", &self.header)
            .field("arena", &self.arena)
            .finish()
    }
}

// ============================================================================
// Iterator
// ============================================================================

/// Double-ended iterator over the items of a [`List`].
pub struct Iter<'a, T> {
    arena: &'a Arena<T>,
    front: u32,
    back: u32,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.front.get()?;
        let node = self.arena.node(idx);

        if idx == self.back {
            self.front = u32::NONE;
            self.back = u32::NONE;
        } else {
            self.front = node.next;
        }

        Some(&node.item)
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let idx = self.back.get()?;
        let node = self.arena.node(idx);

        if idx == self.front {
            self.front = u32::NONE;
            self.back = u32::NONE;
        } else {
            self.back = node.prev;
        }

        Some(&node.item)
    }
}

impl<T> core::iter::FusedIterator for Iter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn items<T: Copy>(list: &List<T>, arena: &Arena<T>) -> Vec<T> {
        list.iter(arena).copied().collect()
    }

    /// Follows the raw `next` links from the head and the raw `prev` links
    /// from the tail until `NONE`, and checks both chains against `count`.
    fn check_links<T: Copy + PartialEq + fmt::Debug>(list: &List<T>, arena: &Arena<T>) {
        let header = arena.header(list.header);
        let bound = arena.node_capacity();

        let mut forward = Vec::new();
        let mut idx = header.first;
        while idx.is_some() {
            assert!(forward.len() < bound, "next chain does not terminate");
            let node = arena.node(idx);
            forward.push(node.item);
            idx = node.next;
        }

        let mut backward = Vec::new();
        let mut idx = header.last;
        while idx.is_some() {
            assert!(backward.len() < bound, "prev chain does not terminate");
            let node = arena.node(idx);
            backward.push(node.item);
            idx = node.prev;
        }
        backward.reverse();

        assert_eq!(forward.len(), header.count);
        assert_eq!(backward.len(), header.count);
        assert_eq!(forward, backward);
        assert_eq!(forward, items(list, arena));

        match (header.first.get(), header.last.get()) {
            (Some(first), Some(last)) => {
                assert!(arena.node(first).prev.is_none());
                assert!(arena.node(last).next.is_none());
            }
            (None, None) => assert_eq!(header.count, 0),
            ends => panic!("head and tail disagree: {ends:?}"),
        }
    }

    #[test]
    fn check_links_catches_dangling_tail_link() {
        let (mut arena, list) = zab();
        check_links(&list, &arena);

        let header = arena.header(list.header);
        arena.node_mut(header.last).next = header.first;

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            check_links(&list, &arena);
        }));
        assert!(result.is_err());
    }

    fn zab() -> (Arena<char>, List<char>) {
        let mut arena = Arena::new();
        let mut list = List::new(&mut arena).unwrap();
        list.append(&mut arena, 'a').unwrap();
        list.append(&mut arena, 'b').unwrap();
        list.prepend(&mut arena, 'z').unwrap();
        (arena, list)
    }

    // ========================================================================
    // Creation and inspection
    // ========================================================================

    #[test]
    fn new_list_is_empty_after_end() {
        let mut arena: Arena<u64> = Arena::new();
        let list = List::new(&mut arena).unwrap();

        assert_eq!(list.count(&arena), 0);
        assert!(list.is_empty(&arena));
        assert_eq!(list.boundary(&arena), Boundary::AfterEnd);
        assert_eq!(list.curr(&arena), None);
        assert_eq!(arena.live_heads(), 1);

        list.free(&mut arena);
    }

    #[test]
    fn heads_exhaust_at_capacity() {
        let mut arena: Arena<u64> = Arena::with_capacity(2, 4);
        let a = List::new(&mut arena).unwrap();
        let b = List::new(&mut arena).unwrap();

        let err = List::new(&mut arena).unwrap_err();
        assert_eq!(err, ArenaError::HeadsExhausted { capacity: 2 });

        a.free(&mut arena);
        let c = List::new(&mut arena).unwrap();

        b.free(&mut arena);
        c.free(&mut arena);
        assert_eq!(arena.live_heads(), 0);
    }

    #[test]
    fn append_and_prepend_make_item_current() {
        let mut arena: Arena<char> = Arena::new();
        let mut list = List::new(&mut arena).unwrap();

        list.append(&mut arena, 'a').unwrap();
        assert_eq!(list.curr(&arena), Some(&'a'));

        list.append(&mut arena, 'b').unwrap();
        assert_eq!(list.curr(&arena), Some(&'b'));

        list.prepend(&mut arena, 'z').unwrap();
        assert_eq!(list.curr(&arena), Some(&'z'));

        assert_eq!(items(&list, &arena), ['z', 'a', 'b']);
        check_links(&list, &arena);
        list.free(&mut arena);
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    #[test]
    fn first_next_remove_scenario() {
        let (mut arena, mut list) = zab();

        assert_eq!(list.first(&mut arena), Some(&'z'));
        assert_eq!(list.next(&mut arena), Some(&'a'));
        assert_eq!(list.remove(&mut arena), Some('a'));

        assert_eq!(items(&list, &arena), ['z', 'b']);
        assert_eq!(list.curr(&arena), Some(&'b'));
        assert_eq!(list.count(&arena), 2);
        check_links(&list, &arena);
        list.free(&mut arena);
    }

    #[test]
    fn next_walks_off_the_end() {
        let (mut arena, mut list) = zab();

        list.first(&mut arena);
        assert_eq!(list.next(&mut arena), Some(&'a'));
        assert_eq!(list.next(&mut arena), Some(&'b'));
        assert_eq!(list.next(&mut arena), None);
        assert_eq!(list.boundary(&arena), Boundary::AfterEnd);

        // Stays after the end.
        assert_eq!(list.next(&mut arena), None);
        assert_eq!(list.boundary(&arena), Boundary::AfterEnd);
        list.free(&mut arena);
    }

    #[test]
    fn prev_walks_off_the_start() {
        let (mut arena, mut list) = zab();

        list.last(&mut arena);
        assert_eq!(list.prev(&mut arena), Some(&'a'));
        assert_eq!(list.prev(&mut arena), Some(&'z'));
        assert_eq!(list.prev(&mut arena), None);
        assert_eq!(list.boundary(&arena), Boundary::BeforeStart);

        assert_eq!(list.prev(&mut arena), None);
        assert_eq!(list.boundary(&arena), Boundary::BeforeStart);
        list.free(&mut arena);
    }

    #[test]
    fn stepping_from_the_opposite_boundary() {
        let (mut arena, mut list) = zab();

        // Before the start, next moves to after the end.
        list.first(&mut arena);
        list.prev(&mut arena);
        assert_eq!(list.boundary(&arena), Boundary::BeforeStart);
        assert_eq!(list.next(&mut arena), None);
        assert_eq!(list.boundary(&arena), Boundary::AfterEnd);

        // After the end, prev moves to before the start.
        assert_eq!(list.prev(&mut arena), None);
        assert_eq!(list.boundary(&arena), Boundary::BeforeStart);
        list.free(&mut arena);
    }

    #[test]
    fn first_and_last_on_empty_list() {
        let mut arena: Arena<u64> = Arena::new();
        let mut list = List::new(&mut arena).unwrap();

        assert_eq!(list.first(&mut arena), None);
        assert_eq!(list.boundary(&arena), Boundary::BeforeStart);

        assert_eq!(list.last(&mut arena), None);
        assert_eq!(list.boundary(&arena), Boundary::AfterEnd);
        list.free(&mut arena);
    }

    #[test]
    fn first_then_last_make_ends_current() {
        let (mut arena, mut list) = zab();

        assert_eq!(list.last(&mut arena), Some(&'b'));
        assert_eq!(list.curr(&arena), Some(&'b'));
        assert_eq!(list.first(&mut arena), Some(&'z'));
        assert_eq!(list.curr(&arena), Some(&'z'));
        list.free(&mut arena);
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    #[test]
    fn insert_after_and_before_current() {
        let (mut arena, mut list) = zab();

        list.first(&mut arena);
        list.next(&mut arena); // a
        list.insert_after(&mut arena, 'c').unwrap();
        assert_eq!(list.curr(&arena), Some(&'c'));
        assert_eq!(items(&list, &arena), ['z', 'a', 'c', 'b']);

        list.insert_before(&mut arena, 'd').unwrap();
        assert_eq!(list.curr(&arena), Some(&'d'));
        assert_eq!(items(&list, &arena), ['z', 'a', 'd', 'c', 'b']);

        check_links(&list, &arena);
        list.free(&mut arena);
    }

    #[test]
    fn insert_at_ends_updates_first_and_last() {
        let (mut arena, mut list) = zab();

        list.last(&mut arena);
        list.insert_after(&mut arena, 'y').unwrap();
        assert_eq!(list.last(&mut arena), Some(&'y'));

        list.first(&mut arena);
        list.insert_before(&mut arena, 'x').unwrap();
        assert_eq!(list.first(&mut arena), Some(&'x'));

        assert_eq!(items(&list, &arena), ['x', 'z', 'a', 'b', 'y']);
        check_links(&list, &arena);
        list.free(&mut arena);
    }

    #[test]
    fn insert_off_the_chain_goes_to_that_end() {
        let (mut arena, mut list) = zab();

        // before start: both variants insert at the head
        list.first(&mut arena);
        list.prev(&mut arena);
        list.insert_after(&mut arena, '1').unwrap();
        list.prev(&mut arena);
        list.insert_before(&mut arena, '2').unwrap();

        // after end: both variants insert at the tail
        list.last(&mut arena);
        list.next(&mut arena);
        list.insert_before(&mut arena, '3').unwrap();
        list.next(&mut arena);
        list.insert_after(&mut arena, '4').unwrap();

        assert_eq!(items(&list, &arena), ['2', '1', 'z', 'a', 'b', '3', '4']);
        assert_eq!(list.curr(&arena), Some(&'4'));
        check_links(&list, &arena);
        list.free(&mut arena);
    }

    #[test]
    fn insert_into_new_list() {
        let mut arena: Arena<u64> = Arena::new();
        let mut list = List::new(&mut arena).unwrap();

        list.insert_before(&mut arena, 7).unwrap();
        assert_eq!(list.count(&arena), 1);
        assert_eq!(list.curr(&arena), Some(&7));
        assert_eq!(list.first(&mut arena), Some(&7));
        assert_eq!(list.last(&mut arena), Some(&7));
        list.free(&mut arena);
    }

    #[test]
    fn node_exhaustion_returns_item_and_leaves_list_unchanged() {
        let mut arena: Arena<String> = Arena::with_capacity(2, 2);
        let mut a = List::new(&mut arena).unwrap();
        let mut b = List::new(&mut arena).unwrap();

        a.append(&mut arena, "one".into()).unwrap();
        b.append(&mut arena, "two".into()).unwrap();

        let err = a.append(&mut arena, "three".into()).unwrap_err();
        assert_eq!(err.into_inner(), "three");
        assert!(b.prepend(&mut arena, "four".into()).is_err());
        assert!(a.insert_after(&mut arena, "five".into()).is_err());

        assert_eq!(a.count(&arena), 1);
        assert_eq!(a.curr(&arena).map(String::as_str), Some("one"));
        assert_eq!(b.count(&arena), 1);

        // Freeing one list returns its nodes to the shared pool.
        b.free(&mut arena);
        a.append(&mut arena, "six".into()).unwrap();
        assert_eq!(a.count(&arena), 2);
        a.free(&mut arena);
    }

    // ========================================================================
    // Removal
    // ========================================================================

    #[test]
    fn remove_off_the_chain_is_a_noop() {
        let (mut arena, mut list) = zab();

        list.last(&mut arena);
        list.next(&mut arena);
        assert_eq!(list.remove(&mut arena), None);

        list.first(&mut arena);
        list.prev(&mut arena);
        assert_eq!(list.remove(&mut arena), None);

        assert_eq!(list.count(&arena), 3);
        list.free(&mut arena);
    }

    #[test]
    fn remove_tail_makes_new_tail_current() {
        let (mut arena, mut list) = zab();

        list.last(&mut arena);
        assert_eq!(list.remove(&mut arena), Some('b'));
        assert_eq!(list.curr(&arena), Some(&'a'));
        assert_eq!(list.last(&mut arena), Some(&'a'));
        check_links(&list, &arena);
        list.free(&mut arena);
    }

    #[test]
    fn remove_head_makes_next_current() {
        let (mut arena, mut list) = zab();

        list.first(&mut arena);
        assert_eq!(list.remove(&mut arena), Some('z'));
        assert_eq!(list.curr(&arena), Some(&'a'));
        assert_eq!(list.first(&mut arena), Some(&'a'));
        list.free(&mut arena);
    }

    #[test]
    fn remove_sole_item_empties_list() {
        let mut arena: Arena<u64> = Arena::new();
        let mut list = List::new(&mut arena).unwrap();
        list.append(&mut arena, 1).unwrap();

        assert_eq!(list.remove(&mut arena), Some(1));
        assert!(list.is_empty(&arena));
        assert_eq!(list.boundary(&arena), Boundary::AfterEnd);
        assert_eq!(arena.live_nodes(), 0);
        list.free(&mut arena);
    }

    #[test]
    fn trim_removes_tail_regardless_of_cursor() {
        let (mut arena, mut list) = zab();

        list.first(&mut arena);
        list.prev(&mut arena);
        assert_eq!(list.trim(&mut arena), Some('b'));
        assert_eq!(list.curr(&arena), Some(&'a'));
        assert_eq!(items(&list, &arena), ['z', 'a']);

        assert_eq!(list.trim(&mut arena), Some('a'));
        assert_eq!(list.trim(&mut arena), Some('z'));
        assert_eq!(list.boundary(&arena), Boundary::AfterEnd);
        assert_eq!(list.trim(&mut arena), None);
        assert!(list.is_empty(&arena));
        list.free(&mut arena);
    }

    // ========================================================================
    // Whole-list operations
    // ========================================================================

    #[test]
    fn concat_moves_items_and_releases_header() {
        let mut arena: Arena<u64> = Arena::with_capacity(2, 8);
        let mut a = List::new(&mut arena).unwrap();
        let mut b = List::new(&mut arena).unwrap();

        a.append(&mut arena, 1).unwrap();
        a.append(&mut arena, 2).unwrap();
        b.append(&mut arena, 3).unwrap();
        b.append(&mut arena, 4).unwrap();

        a.first(&mut arena);
        a.concat(&mut arena, b);

        assert_eq!(items(&a, &arena), [1, 2, 3, 4]);
        assert_eq!(a.count(&arena), 4);
        assert_eq!(a.curr(&arena), Some(&1));
        assert_eq!(a.last(&mut arena), Some(&4));
        check_links(&a, &arena);

        // The donor header is immediately reusable.
        assert_eq!(arena.live_heads(), 1);
        let c = List::new(&mut arena).unwrap();
        c.free(&mut arena);
        a.free(&mut arena);
    }

    #[test]
    fn concat_with_empty_lists() {
        let mut arena: Arena<u64> = Arena::with_capacity(4, 8);
        let mut a = List::new(&mut arena).unwrap();
        let empty = List::new(&mut arena).unwrap();

        a.append(&mut arena, 1).unwrap();
        a.concat(&mut arena, empty);
        assert_eq!(items(&a, &arena), [1]);

        let mut target = List::new(&mut arena).unwrap();
        target.concat(&mut arena, a);
        assert_eq!(items(&target, &arena), [1]);
        assert_eq!(target.boundary(&arena), Boundary::AfterEnd);
        check_links(&target, &arena);

        assert_eq!(arena.live_heads(), 1);
        target.free(&mut arena);
    }

    #[test]
    fn free_with_reclaims_in_order() {
        let (mut arena, list) = zab();

        let mut seen = Vec::new();
        list.free_with(&mut arena, |item| seen.push(item));

        assert_eq!(seen, ['z', 'a', 'b']);
        assert_eq!(arena.live_nodes(), 0);
        assert_eq!(arena.live_heads(), 0);
    }

    #[test]
    fn free_drops_items() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

        struct DropCounter;
        impl Drop for DropCounter {
            fn drop(&mut self) {
                DROP_COUNT.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROP_COUNT.store(0, Ordering::SeqCst);

        let mut arena: Arena<DropCounter> = Arena::new();
        let mut list = List::new(&mut arena).unwrap();
        for _ in 0..5 {
            let _ = list.append(&mut arena, DropCounter);
        }

        list.free(&mut arena);
        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 5);
    }

    // ========================================================================
    // Search
    // ========================================================================

    #[test]
    fn search_from_before_start_scans_whole_list() {
        let mut arena: Arena<u64> = Arena::new();
        let mut list = List::new(&mut arena).unwrap();
        for i in 1..=5 {
            list.append(&mut arena, i).unwrap();
        }

        list.first(&mut arena);
        list.prev(&mut arena);
        let found = list.search(&mut arena, |item: &u64, arg: &u64| item == arg, &3);
        assert_eq!(found, Some(&3));
        assert_eq!(list.curr(&arena), Some(&3));
        list.free(&mut arena);
    }

    #[test]
    fn search_includes_current_and_never_wraps() {
        let mut arena: Arena<u64> = Arena::new();
        let mut list = List::new(&mut arena).unwrap();
        for i in 1..=5 {
            list.append(&mut arena, i).unwrap();
        }

        list.first(&mut arena);
        list.next(&mut arena);
        list.next(&mut arena); // 3

        let is_odd = |item: &u64, _: &()| item % 2 == 1;
        assert_eq!(list.search(&mut arena, is_odd, &()), Some(&3));

        // 1 is behind the cursor, so it is never found.
        let eq = |item: &u64, arg: &u64| item == arg;
        assert_eq!(list.search(&mut arena, eq, &1), None);
        assert_eq!(list.boundary(&arena), Boundary::AfterEnd);

        // After the end, search finds nothing and stays put.
        assert_eq!(list.search(&mut arena, eq, &5), None);
        assert_eq!(list.boundary(&arena), Boundary::AfterEnd);
        list.free(&mut arena);
    }

    #[test]
    fn search_with_unsized_argument() {
        let mut arena: Arena<String> = Arena::new();
        let mut list = List::new(&mut arena).unwrap();
        list.append(&mut arena, "alpha".into()).unwrap();
        list.append(&mut arena, "beta".into()).unwrap();
        list.first(&mut arena);

        let found = list.search(&mut arena, |item: &String, arg: &str| item == arg, "beta");
        assert_eq!(found.map(String::as_str), Some("beta"));
        list.free(&mut arena);
    }

    #[test]
    fn search_with_stateful_matcher() {
        struct NthMatch {
            remaining: usize,
        }
        impl Matcher<u64, ()> for NthMatch {
            fn matches(&mut self, _: &u64, _: &()) -> bool {
                if self.remaining == 0 {
                    return true;
                }
                self.remaining -= 1;
                false
            }
        }

        let mut arena: Arena<u64> = Arena::new();
        let mut list = List::new(&mut arena).unwrap();
        for i in 10..15 {
            list.append(&mut arena, i).unwrap();
        }
        list.first(&mut arena);

        let found = list.search(&mut arena, NthMatch { remaining: 2 }, &());
        assert_eq!(found, Some(&12));
        list.free(&mut arena);
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    #[test]
    fn iter_is_double_ended_and_leaves_cursor() {
        let (mut arena, mut list) = zab();
        list.first(&mut arena);
        list.next(&mut arena);

        let mut iter = list.iter(&arena);
        assert_eq!(iter.next(), Some(&'z'));
        assert_eq!(iter.next_back(), Some(&'b'));
        assert_eq!(iter.next(), Some(&'a'));
        assert_eq!(iter.next_back(), None);
        assert_eq!(iter.next(), None);

        assert_eq!(list.curr(&arena), Some(&'a'));
        list.free(&mut arena);
    }

    // ========================================================================
    // Stress
    // ========================================================================

    #[test]
    fn mixed_operations_keep_count_and_links_consistent() {
        let mut arena: Arena<u32> = Arena::with_capacity(2, 64);
        let mut list = List::new(&mut arena).unwrap();
        let mut model: Vec<u32> = Vec::new();

        // xorshift; deterministic without pulling in a rng crate
        let mut state = 0x2545_f491_u32;
        let mut rand = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };

        for step in 0..2_000 {
            match rand() % 6 {
                0 => {
                    if list.append(&mut arena, step).is_ok() {
                        model.push(step);
                    }
                }
                1 => {
                    if list.prepend(&mut arena, step).is_ok() {
                        model.insert(0, step);
                    }
                }
                2 => {
                    if let Some(item) = list.trim(&mut arena) {
                        assert_eq!(model.pop(), Some(item));
                    }
                }
                3 => {
                    list.first(&mut arena);
                    if let Some(item) = list.remove(&mut arena) {
                        assert_eq!(model.remove(0), item);
                    }
                }
                4 => {
                    list.last(&mut arena);
                    let _ = list.prev(&mut arena);
                    if list.insert_after(&mut arena, step).is_ok() {
                        let at = model.len().saturating_sub(1);
                        model.insert(at, step);
                    }
                }
                _ => {
                    list.first(&mut arena);
                    let _ = list.next(&mut arena);
                }
            }

            assert_eq!(list.count(&arena), model.len());
            assert_eq!(arena.live_nodes(), model.len());
        }

        assert_eq!(items(&list, &arena), model);
        check_links(&list, &arena);
        list.free(&mut arena);
    }
}

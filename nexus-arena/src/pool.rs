//! Fixed-capacity record pool with an intrusive free-list.
//!
//! All slots are allocated once at construction. Vacant slots are threaded
//! into a singly-linked free-list through their own storage, so acquiring
//! and releasing a record is a pop/push on that list: O(1), no allocation.
//!
//! ```text
//! free_head ─► [3: vacant] ─► [0: vacant] ─► NONE
//!              [1: occupied(r1)]
//!              [2: occupied(r2)]
//! ```

use core::fmt;

use crate::Index;

/// Error returned when the pool has no vacant slot.
///
/// Carries the record that could not be stored so the caller keeps ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that could not be stored.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool is full")
    }
}

impl<T: fmt::Debug> std::error::Error for Full<T> {}

enum Slot<R, Idx> {
    Vacant { next_free: Idx },
    Occupied(R),
}

/// Fixed-capacity pool of records addressed by stable indices.
///
/// Capacity is fixed at construction and never changes. Released slots are
/// reused LIFO.
///
/// # Example
///
/// ```
/// use nexus_arena::Pool;
///
/// let mut pool: Pool<&str> = Pool::with_capacity(2);
///
/// let a = pool.acquire("a").unwrap();
/// let _b = pool.acquire("b").unwrap();
/// assert!(pool.acquire("c").is_err());
///
/// assert_eq!(pool.release(a), Some("a"));
/// assert!(pool.acquire("c").is_ok());
/// ```
pub struct Pool<R, Idx: Index = u32> {
    slots: Box<[Slot<R, Idx>]>,
    free_head: Idx,
    len: usize,
}

impl<R, Idx: Index> Pool<R, Idx> {
    /// Creates a pool with exactly `capacity` slots, all vacant.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0 or does not fit the index type (the
    /// sentinel value is reserved).
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        assert!(
            capacity <= Idx::NONE.as_usize(),
            "capacity exceeds index type maximum"
        );

        let slots = (0..capacity)
            .map(|i| Slot::Vacant {
                next_free: if i + 1 < capacity {
                    Idx::from_usize(i + 1)
                } else {
                    Idx::NONE
                },
            })
            .collect();

        Self {
            slots,
            free_head: Idx::from_usize(0),
            len: 0,
        }
    }

    /// Returns the fixed number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of occupied slots.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slots are occupied.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if every slot is occupied.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.free_head.is_none()
    }

    /// Stores `record` in a vacant slot and returns its index.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(record))` if every slot is occupied.
    #[inline]
    pub fn acquire(&mut self, record: R) -> Result<Idx, Full<R>> {
        let idx = self.free_head;
        if idx.is_none() {
            return Err(Full(record));
        }

        let slot = &mut self.slots[idx.as_usize()];
        self.free_head = match slot {
            Slot::Vacant { next_free } => *next_free,
            Slot::Occupied(_) => unreachable!("free-list links an occupied slot"),
        };
        *slot = Slot::Occupied(record);
        self.len += 1;

        Ok(idx)
    }

    /// Vacates the slot at `idx` and returns its record.
    ///
    /// Returns `None` (and changes nothing) if `idx` is out of range or the
    /// slot is already vacant.
    #[inline]
    pub fn release(&mut self, idx: Idx) -> Option<R> {
        let slot = self.slots.get_mut(idx.as_usize())?;
        if matches!(slot, Slot::Vacant { .. }) {
            return None;
        }

        let old = core::mem::replace(
            slot,
            Slot::Vacant {
                next_free: self.free_head,
            },
        );
        self.free_head = idx;
        self.len -= 1;

        match old {
            Slot::Occupied(record) => Some(record),
            Slot::Vacant { .. } => None,
        }
    }

    /// Returns a reference to the record at `idx`, if occupied.
    #[inline]
    pub fn get(&self, idx: Idx) -> Option<&R> {
        match self.slots.get(idx.as_usize()) {
            Some(Slot::Occupied(record)) => Some(record),
            _ => None,
        }
    }

    /// Returns a mutable reference to the record at `idx`, if occupied.
    #[inline]
    pub fn get_mut(&mut self, idx: Idx) -> Option<&mut R> {
        match self.slots.get_mut(idx.as_usize()) {
            Some(Slot::Occupied(record)) => Some(record),
            _ => None,
        }
    }
}

impl<R, Idx: Index> fmt::Debug for Pool<R, Idx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("capacity", &self.capacity())
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

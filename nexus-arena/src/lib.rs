//! Fixed-capacity record pools and a cursor-based list built on them.
//!
//! Everything a list needs is allocated up front, in one [`Arena`]:
//!
//! ```text
//! Arena
//! ├── head pool  (one record per live List: first, last, cursor, count)
//! └── node pool  (one record per item, shared by every List of the arena)
//! ```
//!
//! List operations never allocate. When a pool runs dry the operation fails
//! and hands the rejected item back ([`Full`]) or reports
//! [`ArenaError::HeadsExhausted`]. Freeing a list returns its records to the
//! pools for immediate reuse.
//!
//! # Quick Start
//!
//! ```
//! use nexus_arena::{Arena, List};
//!
//! let mut arena: Arena<u64> = Arena::with_capacity(4, 64);
//! let mut list = List::new(&mut arena).unwrap();
//!
//! for i in 0..3 {
//!     list.append(&mut arena, i).unwrap();
//! }
//!
//! assert_eq!(list.first(&mut arena), Some(&0));
//! assert_eq!(list.remove(&mut arena), Some(0));
//! assert_eq!(list.count(&arena), 2);
//!
//! list.free(&mut arena);
//! ```
//!
//! # Sharing Across Threads
//!
//! [`SharedArena`] puts the arena behind a mutex so lists living in
//! different threads can draw from the same pools.

#![warn(missing_docs)]

mod arena;
mod error;
mod index;
mod list;
mod pool;
mod shared;

pub use arena::{Arena, DEFAULT_HEADS, DEFAULT_NODES};
pub use error::ArenaError;
pub use index::Index;
pub use list::{Boundary, Iter, List, Matcher, Reclaim};
pub use pool::{Full, Pool};
pub use shared::SharedArena;

//! Error types for arena operations.

use thiserror::Error;

/// Errors raised by arena-level operations that do not carry a payload back.
///
/// Node exhaustion during insertion is reported through [`Full`](crate::Full)
/// instead, so the rejected item is returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ArenaError {
    /// Every list header of the arena is in use.
    #[error("header pool exhausted: all {capacity} list headers are live")]
    HeadsExhausted {
        /// Fixed header capacity of the arena.
        capacity: usize,
    },
}

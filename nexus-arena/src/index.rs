//! Sentinel-based index trait for pool slots and list links.
//!
//! A reserved sentinel value (`MAX`) stands in for "no record", which keeps
//! link fields and free-list heads the size of a bare integer instead of an
//! `Option<Idx>`.

/// A copyable index type with a sentinel "none" value.
///
/// # Example
///
/// ```
/// use nexus_arena::Index;
///
/// let idx: u32 = 5;
/// let none: u32 = u32::NONE;
///
/// assert!(idx.is_some());
/// assert!(none.is_none());
/// ```
pub trait Index: Copy + Eq + core::fmt::Debug {
    /// Sentinel value representing "no index".
    const NONE: Self;

    /// Returns `true` if this is the sentinel value.
    #[inline]
    fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Returns `true` if this is not the sentinel value.
    #[inline]
    fn is_some(self) -> bool {
        !self.is_none()
    }

    /// Converts the index to a slot position.
    fn as_usize(self) -> usize;

    /// Converts a slot position to an index.
    fn from_usize(val: usize) -> Self;

    /// Maps the sentinel to `None`.
    #[inline]
    fn get(self) -> Option<Self> {
        if self.is_none() { None } else { Some(self) }
    }
}

macro_rules! impl_index_for_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Index for $ty {
                const NONE: Self = <$ty>::MAX;

                #[inline]
                fn as_usize(self) -> usize {
                    self as usize
                }

                #[inline]
                fn from_usize(val: usize) -> Self {
                    val as Self
                }
            }
        )*
    };
}

impl_index_for_unsigned!(u8, u16, u32, u64, usize);

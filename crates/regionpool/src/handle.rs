//! Allocation handles.
//!
//! An [`Allocation`] records where a `fill` landed inside the region. It is
//! generation-scoped: resetting the arena advances its generation, so a
//! handle issued before the reset is rejected in O(1) instead of silently
//! aliasing newer data.

use std::fmt;
use std::ops::Range;

/// Location of one allocation within an arena region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Allocation {
    pub(crate) generation: u64,
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

impl Allocation {
    pub(crate) fn new(generation: u64, offset: usize, len: usize) -> Self {
        Self {
            generation,
            offset,
            len,
        }
    }

    /// Arena generation when this allocation was made.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Byte offset from the start of the region (header included).
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes, after alignment padding.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: zero-sized allocations are refused.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn range(&self) -> Option<Range<usize>> {
        Some(self.offset..self.offset.checked_add(self.len)?)
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Allocation(gen={}, off={}, len={})",
            self.generation, self.offset, self.len
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let a = Allocation::new(3, 64, 16);
        assert_eq!(a.generation(), 3);
        assert_eq!(a.offset(), 64);
        assert_eq!(a.len(), 16);
        assert!(!a.is_empty());
        assert_eq!(a.range(), Some(64..80));
    }

    #[test]
    fn range_overflow_is_none() {
        let a = Allocation::new(0, usize::MAX, 8);
        assert!(a.range().is_none());
    }

    #[test]
    fn display_format() {
        let a = Allocation::new(1, 64, 8);
        assert_eq!(a.to_string(), "Allocation(gen=1, off=64, len=8)");
    }
}

//! Error types for arena operations.

use std::fmt;
use std::io;

use crate::arena::Arena;
use crate::observer::ArenaObserver;

/// Errors that can occur during arena operations.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// An arena (or a resize) was requested with zero capacity.
    #[error("capacity must be non-zero")]
    ZeroCapacity,

    /// An allocation of zero bytes was requested.
    #[error("allocation size must be non-zero")]
    ZeroSize,

    /// The arena has been destroyed.
    #[error("arena is no longer active")]
    Inactive,

    /// Not enough room left between the cursor and the end of the region.
    #[error("arena capacity exceeded: requested {requested} bytes, available {available} bytes")]
    OutOfCapacity {
        /// Bytes needed after alignment.
        requested: usize,
        /// Bytes remaining in the arena.
        available: usize,
    },

    /// A shrink would cut into live allocations.
    #[error("cannot shrink to {requested} bytes: cursor is at {cursor}")]
    ShrinkBelowCursor {
        /// Current cursor offset.
        cursor: usize,
        /// Page-rounded capacity that was requested.
        requested: usize,
    },

    /// An allocation handle from before the last reset.
    #[error("stale allocation: generation {handle_generation}, arena is at {current}")]
    StaleAllocation {
        /// Generation recorded in the handle.
        handle_generation: u64,
        /// Current generation of the arena.
        current: u64,
    },

    /// An allocation handle that does not fit inside this arena's region.
    #[error("allocation at offset {offset} with length {len} exceeds capacity {capacity}")]
    OutOfBounds {
        /// Offset recorded in the handle.
        offset: usize,
        /// Length recorded in the handle.
        len: usize,
        /// Capacity of the region.
        capacity: usize,
    },

    /// A configured page size that is not a usable power of two.
    #[error("invalid page size: {0}")]
    InvalidPageSize(usize),

    /// The arena has run out of generations to invalidate handles with.
    #[error("arena generation counter exhausted")]
    GenerationExhausted,

    /// Size arithmetic overflowed `usize`.
    #[error("requested size overflows the address space")]
    CapacityOverflow,

    /// The operating system refused to map the region.
    #[error("failed to map region")]
    Map(#[source] io::Error),

    /// The operating system refused to remap the region.
    #[error("failed to remap region")]
    Remap(#[source] io::Error),
}

/// Result alias for arena operations.
pub type Result<T> = std::result::Result<T, ArenaError>;

/// A failed [`Arena::resize`].
///
/// Resizing consumes the arena, so the error hands the untouched original
/// back through [`ResizeError::into_arena`].
#[derive(thiserror::Error)]
#[error("resize failed")]
pub struct ResizeError<O: ArenaObserver> {
    arena: Arena<O>,
    #[source]
    kind: ArenaError,
}

impl<O: ArenaObserver> ResizeError<O> {
    pub(crate) fn new(arena: Arena<O>, kind: ArenaError) -> Self {
        Self { arena, kind }
    }

    /// The reason the resize was refused.
    pub fn kind(&self) -> &ArenaError {
        &self.kind
    }

    /// Recover the original arena, unchanged.
    pub fn into_arena(self) -> Arena<O> {
        self.arena
    }

    /// Split into the original arena and the reason.
    pub fn into_parts(self) -> (Arena<O>, ArenaError) {
        (self.arena, self.kind)
    }
}

impl<O: ArenaObserver> fmt::Debug for ResizeError<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeError")
            .field("kind", &self.kind)
            .field("capacity", &self.arena.capacity())
            .finish_non_exhaustive()
    }
}

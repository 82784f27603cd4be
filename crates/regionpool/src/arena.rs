//! The region arena: one mapping, one cursor.
//!
//! An [`Arena`] reserves a page-rounded block of virtual memory up front and
//! carves allocations off it by advancing a cursor. There is no per-object
//! free: [`Arena::reset`] rewinds the cursor and invalidates everything at
//! once, [`Arena::destroy`] hands the memory back to the OS.

use std::fmt;
use std::ops::Range;
use std::panic::Location;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, trace, warn};

use crate::align::{align_allocation, round_up_to_page};
use crate::config::ArenaConfig;
use crate::diagnostics::{Diagnostics, DiagnosticsReport};
use crate::error::{ArenaError, ResizeError, Result};
use crate::handle::Allocation;
use crate::header::{RegionHeader, HEADER_SIZE};
use crate::observer::{ArenaObserver, NoOpObserver};
use crate::region::Region;

/// A bump allocator over a single virtual memory region.
///
/// The first [`HEADER_SIZE`] bytes of the region hold a [`RegionHeader`];
/// the cursor starts right after it and satisfies
/// `HEADER_SIZE <= cursor <= capacity` for the arena's whole life.
///
/// The arena is `Send` when its observer is, but never `Sync`: give each
/// unit of work its own arena.
pub struct Arena<O: ArenaObserver = NoOpObserver> {
    /// `None` once destroyed.
    pub(crate) region: Option<Region>,
    pub(crate) cursor: usize,
    pub(crate) page_size: usize,
    pub(crate) generation: u64,
    pub(crate) observer: O,
}

impl Arena {
    /// Construct an uninstrumented arena with at least `capacity` usable bytes.
    #[track_caller]
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(ArenaConfig::new(capacity))
    }

    /// Construct an uninstrumented arena from a config.
    #[track_caller]
    pub fn with_config(config: ArenaConfig) -> Result<Self> {
        Self::with_observer(config, NoOpObserver)
    }
}

impl Arena<Diagnostics> {
    /// Construct an arena that records [`Diagnostics`].
    ///
    /// The caller's location is recorded as the arena's provenance.
    #[track_caller]
    pub fn with_diagnostics(capacity: usize) -> Result<Self> {
        Self::with_observer(ArenaConfig::new(capacity), Diagnostics::new())
    }

    /// The recorded statistics.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.observer
    }

    /// Human-readable summary of usage so far.
    pub fn report(&self) -> DiagnosticsReport {
        self.observer.report(self.capacity(), self.cursor)
    }

    /// Share of consumed bytes lost to alignment padding, in percent.
    pub fn fragmentation(&self) -> f64 {
        self.observer.fragmentation()
    }

    /// Highest number of bytes ever in use at once.
    pub fn peak_usage(&self) -> usize {
        self.observer.peak_usage()
    }
}

impl<O: ArenaObserver> Arena<O> {
    /// Construct an arena that reports to `observer`.
    ///
    /// Maps `round_up_to_page(HEADER_SIZE + config.capacity)` bytes in one
    /// request, so the usable capacity is at least what was asked for.
    #[track_caller]
    pub fn with_observer(config: ArenaConfig, mut observer: O) -> Result<Self> {
        config.validate()?;
        let page_size = config.resolved_page_size();
        let total = HEADER_SIZE
            .checked_add(config.capacity)
            .and_then(|len| round_up_to_page(len, page_size))
            .ok_or(ArenaError::CapacityOverflow)?;

        let mut region = Region::map(total).map_err(|err| {
            warn!(capacity = total, error = %err, "Failed to map arena region");
            ArenaError::Map(err)
        })?;

        let created_at = SystemTime::now();
        RegionHeader::new(page_size, total, unix_seconds(created_at))
            .write_to(region.as_mut_slice());
        observer.on_create(total, HEADER_SIZE, created_at, Location::caller());

        debug!(
            requested = config.capacity,
            capacity = total,
            page_size,
            "Arena constructed"
        );

        Ok(Self {
            region: Some(region),
            cursor: HEADER_SIZE,
            page_size,
            generation: 0,
            observer,
        })
    }

    /// Whether the arena can still be used.
    pub fn is_active(&self) -> bool {
        self.region.is_some()
    }

    /// Total region length in bytes, header included. Zero once destroyed.
    pub fn capacity(&self) -> usize {
        self.region.as_ref().map_or(0, Region::len)
    }

    /// Offset of the next free byte.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes currently allocated.
    pub fn used(&self) -> usize {
        if self.is_active() {
            self.cursor - HEADER_SIZE
        } else {
            0
        }
    }

    /// Page size captured at construction.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Current generation; advances whenever issued allocations become invalid.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The observer attached to this arena.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// The descriptor stored at the start of the region.
    pub fn header(&self) -> Option<RegionHeader> {
        RegionHeader::read_from(self.region.as_ref()?.as_slice())
    }

    /// Bytes left before exhaustion, ignoring alignment of a future request.
    ///
    /// Zero once destroyed.
    pub fn measure(&self) -> usize {
        self.region
            .as_ref()
            .map_or(0, |region| region.len() - self.cursor)
    }

    /// Allocate `size` bytes, rounded up to the allocation alignment.
    ///
    /// On failure the cursor is left where it was. The returned bytes are
    /// not cleared: after a reset they may hold earlier contents.
    pub fn fill(&mut self, size: usize) -> Result<Allocation> {
        let outcome = self.bump(size);
        match &outcome {
            Ok(alloc) => self.observer.on_fill(size, alloc.len(), self.cursor),
            Err(_) => self.observer.on_fill_failed(size),
        }
        outcome
    }

    fn bump(&mut self, size: usize) -> Result<Allocation> {
        let capacity = self.region.as_ref().ok_or(ArenaError::Inactive)?.len();
        if size == 0 {
            return Err(ArenaError::ZeroSize);
        }
        let aligned = align_allocation(size).ok_or(ArenaError::CapacityOverflow)?;
        let available = capacity - self.cursor;
        if aligned > available {
            trace!(requested = aligned, available, "Fill refused");
            return Err(ArenaError::OutOfCapacity {
                requested: aligned,
                available,
            });
        }
        let alloc = Allocation::new(self.generation, self.cursor, aligned);
        self.cursor += aligned;
        Ok(alloc)
    }

    /// Allocate room for `data` and copy it in.
    pub fn fill_copy(&mut self, data: &[u8]) -> Result<Allocation> {
        let alloc = self.fill(data.len())?;
        self.bytes_mut(&alloc)?[..data.len()].copy_from_slice(data);
        Ok(alloc)
    }

    /// Resolve an allocation to its bytes.
    pub fn bytes(&self, alloc: &Allocation) -> Result<&[u8]> {
        let range = self.checked_range(alloc)?;
        let region = self.region.as_ref().ok_or(ArenaError::Inactive)?;
        Ok(&region.as_slice()[range])
    }

    /// Resolve an allocation to its bytes, mutably.
    pub fn bytes_mut(&mut self, alloc: &Allocation) -> Result<&mut [u8]> {
        let range = self.checked_range(alloc)?;
        let region = self.region.as_mut().ok_or(ArenaError::Inactive)?;
        Ok(&mut region.as_mut_slice()[range])
    }

    fn checked_range(&self, alloc: &Allocation) -> Result<Range<usize>> {
        let capacity = self.region.as_ref().ok_or(ArenaError::Inactive)?.len();
        if alloc.generation() != self.generation {
            return Err(ArenaError::StaleAllocation {
                handle_generation: alloc.generation(),
                current: self.generation,
            });
        }
        alloc
            .range()
            .filter(|range| range.start >= HEADER_SIZE && range.end <= self.cursor)
            .ok_or(ArenaError::OutOfBounds {
                offset: alloc.offset(),
                len: alloc.len(),
                capacity,
            })
    }

    /// Every allocated byte, from the end of the header to the cursor.
    pub fn live_bytes(&self) -> &[u8] {
        match &self.region {
            Some(region) => &region.as_slice()[HEADER_SIZE..self.cursor],
            None => &[],
        }
    }

    /// Rewind the cursor, logically freeing every allocation at once.
    ///
    /// The region is kept and its bytes are not cleared. All previously
    /// issued [`Allocation`]s become stale. No-op once destroyed.
    pub fn reset(&mut self) {
        if !self.is_active() {
            return;
        }
        trace!(released = self.cursor - HEADER_SIZE, "Arena reset");
        self.cursor = HEADER_SIZE;
        self.advance_generation();
        self.observer.on_reset();
    }

    /// Release the region back to the OS and mark the arena unusable.
    ///
    /// A second call is a no-op. Dropping an arena releases its region too;
    /// this only makes the release explicit and early.
    pub fn destroy(&mut self) {
        if let Some(region) = self.region.take() {
            let capacity = region.len();
            drop(region);
            self.cursor = HEADER_SIZE;
            self.advance_generation();
            debug!(capacity, "Arena destroyed");
        }
    }

    /// Invalidate every issued allocation.
    ///
    /// The counter never wraps: once it is exhausted the region is released
    /// and the arena becomes inactive, so no old handle can resolve again.
    pub(crate) fn advance_generation(&mut self) {
        if let Some(next) = self.generation.checked_add(1) {
            self.generation = next;
        } else if let Some(region) = self.region.take() {
            warn!(
                capacity = region.len(),
                "Arena generation exhausted, releasing region"
            );
            self.cursor = HEADER_SIZE;
        }
    }

    /// Move the arena to a region of `round_up_to_page(new_capacity)` bytes.
    ///
    /// The arena is consumed and a (possibly relocated) arena is returned in
    /// its place, so no stale reference to the old region can survive. The
    /// cursor, generation and contents are carried over; handles issued
    /// before the resize stay valid.
    ///
    /// Refuses, handing the untouched arena back inside the error, when the
    /// arena is destroyed, `new_capacity` is zero, the shrink would cut below
    /// the cursor, or the OS cannot remap. An unchanged page-rounded capacity
    /// returns the arena as is.
    pub fn resize(mut self, new_capacity: usize) -> std::result::Result<Self, ResizeError<O>> {
        if !self.is_active() {
            return Err(ResizeError::new(self, ArenaError::Inactive));
        }
        if new_capacity == 0 {
            return Err(ResizeError::new(self, ArenaError::ZeroCapacity));
        }
        let Some(new_len) = round_up_to_page(new_capacity, self.page_size) else {
            return Err(ResizeError::new(self, ArenaError::CapacityOverflow));
        };
        let old_len = self.capacity();
        if new_len == old_len {
            return Ok(self);
        }
        if new_len < self.cursor {
            let cursor = self.cursor;
            return Err(ResizeError::new(
                self,
                ArenaError::ShrinkBelowCursor {
                    cursor,
                    requested: new_len,
                },
            ));
        }
        let Some(region) = self.region.take() else {
            return Err(ResizeError::new(self, ArenaError::Inactive));
        };

        match region.remap(new_len) {
            Ok(mut region) => {
                restamp_capacity(&mut region, self.page_size);
                self.region = Some(region);
                self.observer.on_resize(old_len, new_len);
                debug!(
                    old_capacity = old_len,
                    new_capacity = new_len,
                    cursor = self.cursor,
                    "Arena resized"
                );
                Ok(self)
            }
            Err((region, err)) => {
                self.region = Some(region);
                warn!(
                    old_capacity = old_len,
                    new_capacity = new_len,
                    error = %err,
                    "Failed to remap arena region"
                );
                Err(ResizeError::new(self, ArenaError::Remap(err)))
            }
        }
    }
}

/// Rewrite the in-region descriptor after a relocation, keeping its creation time.
fn restamp_capacity(region: &mut Region, page_size: usize) {
    let created_at = RegionHeader::read_from(region.as_slice())
        .map_or_else(|| unix_seconds(SystemTime::now()), |header| header.created_at);
    RegionHeader::new(page_size, region.len(), created_at).write_to(region.as_mut_slice());
}

fn unix_seconds(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl<O: ArenaObserver> fmt::Debug for Arena<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("active", &self.is_active())
            .field("capacity", &self.capacity())
            .field("cursor", &self.cursor)
            .field("page_size", &self.page_size)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

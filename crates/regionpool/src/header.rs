//! Descriptor stored in the first bytes of every arena region.
//!
//! The descriptor lives inside the memory it describes, so when a resize
//! relocates the region the descriptor moves with the data. The arena stamps
//! it at construction and again after every successful resize.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐ offset 0
//! │ magic (u64) | version (u32) | flags (u32)    │
//! │ page_size (u64) | capacity (u64)             │
//! │ created_at (u64) | reserved (24 bytes)       │
//! ├──────────────────────────────────────────────┤ HEADER_SIZE
//! │ allocations (cursor grows this way →)        │
//! └──────────────────────────────────────────────┘ capacity
//! ```

/// Magic number identifying an arena region ("REGIONPL").
pub const REGION_MAGIC: u64 = 0x5245_4749_4F4E_504C;

/// Current descriptor layout version.
pub const REGION_VERSION: u32 = 1;

/// Fixed size of the in-region descriptor in bytes.
///
/// A multiple of the allocation alignment, so the first allocation is aligned.
pub const HEADER_SIZE: usize = 64;

/// Descriptor written at offset 0 of an arena region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionHeader {
    /// Magic number for identification.
    pub magic: u64,
    /// Layout version.
    pub version: u32,
    /// Flags (reserved, always zero).
    pub flags: u32,
    /// Page size the arena rounds its capacity to.
    pub page_size: u64,
    /// Total region length, header included.
    pub capacity: u64,
    /// Creation timestamp (Unix epoch seconds).
    pub created_at: u64,
}

impl RegionHeader {
    /// Create a descriptor for a region of `capacity` bytes.
    pub fn new(page_size: usize, capacity: usize, created_at: u64) -> Self {
        Self {
            magic: REGION_MAGIC,
            version: REGION_VERSION,
            flags: 0,
            page_size: page_size as u64,
            capacity: capacity as u64,
            created_at,
        }
    }

    /// Check the descriptor for consistency.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.magic != REGION_MAGIC {
            return Err("Invalid magic number");
        }
        if self.version != REGION_VERSION {
            return Err("Unsupported descriptor version");
        }
        if self.page_size == 0 || !self.page_size.is_power_of_two() {
            return Err("Page size is not a power of two");
        }
        if self.capacity % self.page_size != 0 {
            return Err("Capacity is not page aligned");
        }
        Ok(())
    }

    /// Encode into the first [`HEADER_SIZE`] bytes of `buf`.
    pub fn write_to(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_SIZE);
        let out = &mut buf[..HEADER_SIZE];
        out[0..8].copy_from_slice(&self.magic.to_le_bytes());
        out[8..12].copy_from_slice(&self.version.to_le_bytes());
        out[12..16].copy_from_slice(&self.flags.to_le_bytes());
        out[16..24].copy_from_slice(&self.page_size.to_le_bytes());
        out[24..32].copy_from_slice(&self.capacity.to_le_bytes());
        out[32..40].copy_from_slice(&self.created_at.to_le_bytes());
        out[40..].fill(0);
    }

    /// Decode from the first [`HEADER_SIZE`] bytes of `buf`.
    ///
    /// Returns `None` if `buf` is too short. The result is not validated.
    pub fn read_from(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            magic: read_u64(buf, 0)?,
            version: read_u32(buf, 8)?,
            flags: read_u32(buf, 12)?,
            page_size: read_u64(buf, 16)?,
            capacity: read_u64(buf, 24)?,
            created_at: read_u64(buf, 32)?,
        })
    }
}

fn read_u64(buf: &[u8], at: usize) -> Option<u64> {
    buf.get(at..at + 8)?.try_into().ok().map(u64::from_le_bytes)
}

fn read_u32(buf: &[u8], at: usize) -> Option<u32> {
    buf.get(at..at + 4)?.try_into().ok().map(u32::from_le_bytes)
}

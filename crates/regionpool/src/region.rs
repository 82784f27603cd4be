//! Owned anonymous memory mappings.
//!
//! This is the only module that talks to the operating system's virtual
//! memory API, and the only one allowed to contain `unsafe` code. Everything
//! above it works on the safe slices exposed by [`Region`].

#![allow(unsafe_code)]

use std::cell::Cell;
use std::io;
use std::marker::PhantomData;

use memmap2::MmapMut;
#[cfg(target_os = "linux")]
use memmap2::RemapOptions;

/// Page size assumed when the host refuses to report one.
const FALLBACK_PAGE_SIZE: usize = 4096;

/// Query the host's virtual memory page size.
pub(crate) fn host_page_size() -> usize {
    // SAFETY: `sysconf` has no preconditions and only reads system configuration.
    let reported = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(reported)
        .ok()
        .filter(|size| size.is_power_of_two())
        .unwrap_or(FALLBACK_PAGE_SIZE)
}

/// A private, anonymous, read/write mapping owned by exactly one value.
///
/// The mapping is released when the `Region` is dropped. A region can move
/// to another thread but is never shared between threads.
pub(crate) struct Region {
    map: MmapMut,
    _not_sync: PhantomData<Cell<()>>,
}

impl Region {
    /// Map `len` bytes of fresh, zero-filled memory.
    pub(crate) fn map(len: usize) -> io::Result<Self> {
        debug_assert!(len > 0);
        let map = MmapMut::map_anon(len)?;
        Ok(Self {
            map,
            _not_sync: PhantomData,
        })
    }

    /// Grow or shrink the mapping, moving it if the kernel cannot resize in place.
    ///
    /// On failure the original mapping is returned untouched.
    #[cfg(target_os = "linux")]
    pub(crate) fn remap(mut self, new_len: usize) -> Result<Self, (Self, io::Error)> {
        debug_assert!(new_len > 0);
        // SAFETY: `self` is owned, so no slice into the mapping is alive
        // while it moves. On failure `mremap` leaves the old mapping as it was.
        let remapped = unsafe {
            self.map
                .remap(new_len, RemapOptions::new().may_move(true))
        };
        match remapped {
            Ok(()) => Ok(self),
            Err(err) => Err((self, err)),
        }
    }

    /// Grow or shrink the mapping by mapping a new one and copying into it.
    ///
    /// On failure the original mapping is returned untouched.
    #[cfg(not(target_os = "linux"))]
    pub(crate) fn remap(self, new_len: usize) -> Result<Self, (Self, io::Error)> {
        let mut fresh = match Self::map(new_len) {
            Ok(region) => region,
            Err(err) => return Err((self, err)),
        };
        let keep = self.len().min(new_len);
        fresh.as_mut_slice()[..keep].copy_from_slice(&self.as_slice()[..keep]);
        Ok(fresh)
    }

    /// Length of the mapping in bytes.
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    /// The whole mapping as bytes.
    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.map
    }

    /// The whole mapping as mutable bytes.
    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.map
    }
}

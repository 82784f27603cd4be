//! Alignment arithmetic shared by allocation and region sizing.

/// Alignment of every allocation handed out by an arena, in bytes.
pub const ALIGNMENT: usize = 8;

/// Round `size` up to the next multiple of `align`.
///
/// `align` must be a power of two. Returns `None` on overflow.
#[inline]
#[must_use]
pub fn align_up(size: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    let mask = align - 1;
    size.checked_add(mask).map(|padded| padded & !mask)
}

/// Round an allocation request up to [`ALIGNMENT`].
#[inline]
#[must_use]
pub fn align_allocation(size: usize) -> Option<usize> {
    align_up(size, ALIGNMENT)
}

/// Round a region length up to a whole number of pages.
#[inline]
#[must_use]
pub fn round_up_to_page(len: usize, page_size: usize) -> Option<usize> {
    align_up(len, page_size)
}

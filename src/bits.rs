//! Bit-scan helpers over channel masks.
//!
//! Masks are always carried as `u32`, so the container width reported for an
//! empty mask is 32. A zero mask marks a channel the layout does not have and
//! must never be used as a real bit position.

/// Width of the container every mask is stored in.
pub const MASK_CONTAINER_BITS: u32 = u32::BITS;

/// Index of the lowest set bit, counted from the LSB.
///
/// Returns [`MASK_CONTAINER_BITS`] for `mask == 0`.
#[inline(always)]
pub const fn first_bit(mask: u32) -> u32 {
    if mask == 0 {
        MASK_CONTAINER_BITS
    } else {
        mask.trailing_zeros()
    }
}

#[inline(always)]
pub const fn popcount(mask: u32) -> u32 {
    mask.count_ones()
}

/// Largest value a field of `bits` bits can hold.
#[inline(always)]
pub(crate) const fn max_for_bits(bits: u32) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

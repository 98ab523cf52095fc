/// Round to the nearest integer, halves away from zero for positive input.
#[inline]
pub fn iround(v: f32) -> i64 {
    (v + 0.5) as i64
}

#[inline]
pub fn iround_usize(v: f32) -> usize {
    iround(v).max(0) as usize
}

/// Round up to the next multiple of two.
#[inline]
pub fn round_to_even(v: usize) -> usize {
    (v + 1) / 2 * 2
}

/// Align `v` up to the next multiple of `to` (power of two).
#[inline]
pub fn align_up(v: usize, to: usize) -> usize {
    debug_assert!(to.is_power_of_two());
    (v + to - 1) & !(to - 1)
}

/// true -> +1.0, false -> -1.0
#[inline]
pub fn sgn(v: bool) -> f32 {
    if v {
        1.0
    } else {
        -1.0
    }
}

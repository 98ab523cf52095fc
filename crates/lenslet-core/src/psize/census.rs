use ndarray::Array2;

use crate::geometry::Point;

/// The census window is 5x5; the 24 neighbor comparisons pack into
/// three bytes per pixel.
pub const CENSUS_WINDOW: i64 = 5;
pub const CENSUS_BYTES: usize = 3;

/// Filled circle mask marking the valid pixels of a micro-image crop.
pub fn circle_mask(side: usize) -> Array2<u8> {
    let mut mask = Array2::zeros((side, side));
    let radius = (side as f32 / 2.0).round() as i64;
    for ((row, col), px) in mask.indexed_iter_mut() {
        let dy = row as i64 - radius;
        let dx = col as i64 - radius;
        if dy * dy + dx * dx <= radius * radius {
            *px = 0xff;
        }
    }
    mask
}

/// 5x5 census transform over a `side` x `side` grayscale crop.
///
/// For each pixel, every one of the 24 neighbors in the window produces one
/// bit: the map bit is set when the neighbor is brighter than the center,
/// the mask bit is set when the neighbor lies inside both the crop and the
/// circular validity mask. `map` and `mask` hold three bytes per pixel.
pub fn census_transform_5x5(src: &[u8], side: usize, circle: &Array2<u8>, map: &mut [u8], mask: &mut [u8]) {
    debug_assert_eq!(src.len(), side * side);
    debug_assert_eq!(map.len(), side * side * CENSUS_BYTES);
    debug_assert_eq!(mask.len(), side * side * CENSUS_BYTES);

    map.fill(0);
    mask.fill(0);

    const HALF: i64 = CENSUS_WINDOW / 2;
    let iside = side as i64;

    for row in 0..iside {
        for col in 0..iside {
            let center = src[(row * iside + col) as usize];
            let out = ((row * iside + col) as usize) * CENSUS_BYTES;
            let mut bit = 0usize;

            for win_row in -HALF..=HALF {
                for win_col in -HALF..=HALF {
                    if win_row == 0 && win_col == 0 {
                        continue;
                    }
                    let nb_row = row + win_row;
                    let nb_col = col + win_col;
                    let in_range =
                        nb_row >= 0 && nb_row < iside && nb_col >= 0 && nb_col < iside;
                    if in_range {
                        let nb_idx = (nb_row * iside + nb_col) as usize;
                        if circle[[nb_row as usize, nb_col as usize]] != 0 {
                            mask[out + bit / 8] |= 1 << (bit % 8);
                            if src[nb_idx] > center {
                                map[out + bit / 8] |= 1 << (bit % 8);
                            }
                        }
                    }
                    bit += 1;
                }
            }
        }
    }
}

/// Row/col ranges of the overlap between two equally sized windows when
/// the first is shifted by `-offset` and the second by `+offset`.
/// Returns `None` when the shift leaves no overlap.
pub(crate) fn overlap_ranges(
    side: usize,
    offset: (i64, i64),
) -> Option<(OverlapWindow, OverlapWindow)> {
    let apply = |side: i64, off: i64| {
        let start = off.max(0);
        let end = side + off.min(0);
        (start, end)
    };

    let iside = side as i64;
    let (off_x, off_y) = offset;

    let (l_row_start, l_row_end) = apply(iside, -off_y);
    let (l_col_start, l_col_end) = apply(iside, -off_x);
    let (r_row_start, r_row_end) = apply(iside, off_y);
    let (r_col_start, r_col_end) = apply(iside, off_x);

    if l_row_start >= l_row_end || l_col_start >= l_col_end {
        return None;
    }

    let lhs = OverlapWindow {
        row_start: l_row_start as usize,
        col_start: l_col_start as usize,
        rows: (l_row_end - l_row_start) as usize,
        cols: (l_col_end - l_col_start) as usize,
    };
    let rhs = OverlapWindow {
        row_start: r_row_start as usize,
        col_start: r_col_start as usize,
        rows: (r_row_end - r_row_start) as usize,
        cols: (r_col_end - r_col_start) as usize,
    };
    Some((lhs, rhs))
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct OverlapWindow {
    pub row_start: usize,
    pub col_start: usize,
    pub rows: usize,
    pub cols: usize,
}

/// Masked Hamming distance ratio between two census-transformed MIs, the
/// second one registered against the first by `shift` (in pixels).
///
/// Returns `diff_bits / mask_bits` over the overlap; 0.0 means a perfect
/// match, 1.0 the worst (or no overlap at all).
pub fn compare_census(
    lhs_map: &[u8],
    lhs_mask: &[u8],
    rhs_map: &[u8],
    rhs_mask: &[u8],
    side: usize,
    shift: Point,
) -> f32 {
    let offset = (shift.x.round() as i64, shift.y.round() as i64);
    let Some((lhs, rhs)) = overlap_ranges(side, offset) else {
        return 1.0;
    };

    let mut mask_bits: u64 = 0;
    let mut diff_bits: u64 = 0;

    for row in 0..lhs.rows {
        let l_start = ((lhs.row_start + row) * side + lhs.col_start) * CENSUS_BYTES;
        let r_start = ((rhs.row_start + row) * side + rhs.col_start) * CENSUS_BYTES;
        let len = lhs.cols * CENSUS_BYTES;

        let l_map = &lhs_map[l_start..l_start + len];
        let l_mask = &lhs_mask[l_start..l_start + len];
        let r_map = &rhs_map[r_start..r_start + len];
        let r_mask = &rhs_mask[r_start..r_start + len];

        for i in 0..len {
            let mask = l_mask[i] & r_mask[i];
            let diff = l_map[i] ^ r_map[i];
            mask_bits += mask.count_ones() as u64;
            diff_bits += (mask & diff).count_ones() as u64;
        }
    }

    if mask_bits == 0 {
        return 1.0;
    }
    diff_bits as f32 / mask_bits as f32
}

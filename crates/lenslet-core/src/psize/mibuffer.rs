use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::consts::{CENSUS_SAFE_RATIO, PARALLEL_MI_THRESHOLD, SIMD_ALIGN};
use crate::error::Result;
use crate::geometry::Arrange;
use crate::render::resize::resize_bilinear_u8;
use crate::util::{align_up, iround_usize};

use super::census::{census_transform_5x5, circle_mask, CENSUS_BYTES};

const SQRT2: f32 = std::f32::consts::SQRT_2;

/// Slab layout of the per-MI workspace.
#[derive(Clone, Copy, Debug)]
pub struct MiBufferParams {
    /// Side of the square working crop, `round(diameter * CENSUS_SAFE_RATIO)`.
    pub side: usize,
    /// Aligned byte size of the grayscale crop.
    patch_size: usize,
    /// Aligned byte size of one 3-byte-per-pixel census matrix.
    mat_size_c3: usize,
    /// Total aligned bytes per MI.
    mi_size: usize,
    pub mi_max_cols: usize,
    pub mi_num: usize,
}

impl MiBufferParams {
    fn new(arrange: &Arrange) -> Self {
        let side = iround_usize(arrange.diameter() * CENSUS_SAFE_RATIO);
        let patch_size = align_up(side * side, SIMD_ALIGN);
        let mat_size_c3 = align_up(side * side * CENSUS_BYTES, SIMD_ALIGN);
        let mi_size = patch_size + 2 * mat_size_c3;
        let mi_max_cols = arrange.mi_max_cols();
        let mi_num = mi_max_cols * arrange.mi_rows();
        Self {
            side,
            patch_size,
            mat_size_c3,
            mi_size,
            mi_max_cols,
            mi_num,
        }
    }
}

/// Scalar features of one MI, computed on its central crop.
#[derive(Clone, Copy, Debug, Default)]
pub struct MiMeta {
    /// L1 Sobel gradient magnitude per pixel.
    pub grads: f32,
    /// 16-bit difference hash of the central thumbnail.
    pub dhash: u16,
}

/// Borrowed view of one MI's workspace.
#[derive(Clone, Copy)]
pub struct MiView<'a> {
    pub patch: &'a [u8],
    pub census_map: &'a [u8],
    pub census_mask: &'a [u8],
    pub side: usize,
    pub grads: f32,
    pub dhash: u16,
}

/// Per-MI workspaces for a whole frame, backed by a single slab that is
/// allocated once and refreshed in place every frame.
pub struct MiBuffers {
    arrange: Arrange,
    params: MiBufferParams,
    meta: Vec<MiMeta>,
    slab: Vec<u8>,
    circle: Array2<u8>,
}

impl MiBuffers {
    pub fn create(arrange: &Arrange) -> Result<Self> {
        let params = MiBufferParams::new(arrange);

        let total = params.mi_num * params.mi_size;
        let mut slab = Vec::new();
        slab.try_reserve_exact(total)?;
        slab.resize(total, 0);

        let mut meta = Vec::new();
        meta.try_reserve_exact(params.mi_num)?;
        meta.resize(params.mi_num, MiMeta::default());

        Ok(Self {
            arrange: arrange.clone(),
            params,
            meta,
            slab,
            circle: circle_mask(params.side),
        })
    }

    pub fn params(&self) -> &MiBufferParams {
        &self.params
    }

    /// Refresh every MI workspace from the working Y plane.
    pub fn update(&mut self, src: ArrayView2<'_, u8>) -> Result<()> {
        let params = self.params;
        let arrange = &self.arrange;
        let circle = &self.circle;

        let row_step = params.mi_max_cols * params.mi_size;
        let process_row = |mi_row: usize, slab_row: &mut [u8], meta_row: &mut [MiMeta]| {
            for mi_col in 0..arrange.mi_cols(mi_row) {
                let cell = &mut slab_row[mi_col * params.mi_size..(mi_col + 1) * params.mi_size];
                let (patch, rest) = cell.split_at_mut(params.patch_size);
                let (map, mask) = rest.split_at_mut(params.mat_size_c3);

                let center = arrange.mi_center(mi_row, mi_col);
                extract_patch(src, center, params.side, patch);

                census_transform_5x5(
                    &patch[..params.side * params.side],
                    params.side,
                    circle,
                    &mut map[..params.side * params.side * CENSUS_BYTES],
                    &mut mask[..params.side * params.side * CENSUS_BYTES],
                );

                let central = central_crop(&patch[..params.side * params.side], params.side);
                meta_row[mi_col] = MiMeta {
                    grads: compute_grads(central.view()),
                    dhash: dhash(central.view()),
                };
            }
        };

        if params.mi_num >= PARALLEL_MI_THRESHOLD {
            self.slab
                .par_chunks_mut(row_step)
                .zip(self.meta.par_chunks_mut(params.mi_max_cols))
                .enumerate()
                .for_each(|(mi_row, (slab_row, meta_row))| {
                    process_row(mi_row, slab_row, meta_row)
                });
        } else {
            for (mi_row, (slab_row, meta_row)) in self
                .slab
                .chunks_mut(row_step)
                .zip(self.meta.chunks_mut(params.mi_max_cols))
                .enumerate()
            {
                process_row(mi_row, slab_row, meta_row);
            }
        }

        Ok(())
    }

    pub fn get(&self, offset: usize) -> MiView<'_> {
        let params = &self.params;
        let base = offset * params.mi_size;
        let cell = &self.slab[base..base + params.mi_size];
        let meta = self.meta[offset];
        MiView {
            patch: &cell[..params.side * params.side],
            census_map: &cell[params.patch_size..params.patch_size + params.side * params.side * CENSUS_BYTES],
            census_mask: &cell[params.patch_size + params.mat_size_c3
                ..params.patch_size + params.mat_size_c3 + params.side * params.side * CENSUS_BYTES],
            side: params.side,
            grads: meta.grads,
            dhash: meta.dhash,
        }
    }

    pub fn get_at(&self, row: usize, col: usize) -> MiView<'_> {
        self.get(row * self.params.mi_max_cols + col)
    }
}

/// Copy the `side` x `side` crop centered on `center` out of the working
/// plane, clamping the rectangle to the image.
fn extract_patch(src: ArrayView2<'_, u8>, center: crate::geometry::Point, side: usize, patch: &mut [u8]) {
    let (img_h, img_w) = src.dim();
    let half = side as f32 / 2.0;
    let start_x = ((center.x - half).round() as i64).clamp(0, (img_w - side) as i64) as usize;
    let start_y = ((center.y - half).round() as i64).clamp(0, (img_h - side) as i64) as usize;

    for row in 0..side {
        let src_row = src.row(start_y + row);
        let src_slice = src_row.to_slice().expect("plane rows are contiguous");
        patch[row * side..(row + 1) * side]
            .copy_from_slice(&src_slice[start_x..start_x + side]);
    }
}

/// The sqrt(2)-inscribed central square of the crop, used for the dhash
/// and the gradient score.
pub(crate) fn central_crop(patch: &[u8], side: usize) -> Array2<u8> {
    let center = side as f32 / 2.0;
    let width = side as f32 / SQRT2;
    let start = ((center - width / 2.0).round() as i64).max(0) as usize;
    let len = iround_usize(width).min(side - start);

    let mut out = Array2::zeros((len, len));
    for row in 0..len {
        for col in 0..len {
            out[[row, col]] = patch[(start + row) * side + start + col];
        }
    }
    out
}

/// Mean L1 Sobel response over the crop. Higher means more texture.
pub fn compute_grads(src: ArrayView2<'_, u8>) -> f32 {
    let (h, w) = src.dim();
    if h < 3 || w < 3 {
        return 0.0;
    }

    let mut sum: i64 = 0;
    for row in 1..h - 1 {
        for col in 1..w - 1 {
            let px = |r: usize, c: usize| src[[r, c]] as i64;
            let gx = -px(row - 1, col - 1) + px(row - 1, col + 1) - 2 * px(row, col - 1)
                + 2 * px(row, col + 1)
                - px(row + 1, col - 1)
                + px(row + 1, col + 1);
            let gy = -px(row - 1, col - 1) - 2 * px(row - 1, col) - px(row - 1, col + 1)
                + px(row + 1, col - 1)
                + 2 * px(row + 1, col)
                + px(row + 1, col + 1);
            sum += gx.abs() + gy.abs();
        }
    }

    sum as f32 / (h * w) as f32
}

/// 16-bit difference hash: downsample to a 4x5 thumbnail, one bit per
/// horizontal neighbor comparison.
pub fn dhash(src: ArrayView2<'_, u8>) -> u16 {
    const THUMB_ROWS: usize = 4;
    const THUMB_COLS: usize = THUMB_ROWS + 1;

    let thumb = resize_bilinear_u8(src, THUMB_ROWS, THUMB_COLS);

    let mut hash: u16 = 0;
    let mut bit: u16 = 1;
    for row in 0..THUMB_ROWS {
        for col in 0..THUMB_ROWS {
            if thumb[[row, col + 1]] > thumb[[row, col]] {
                hash |= bit;
            }
            bit = bit.wrapping_shl(1);
        }
    }
    hash
}

use ndarray::Array2;

use crate::consts::{GRADIENT_BLENDING_BEGIN, GRADIENT_BLENDING_END};
use crate::geometry::Arrange;
use crate::util::iround_usize;

use super::params::MvParams;

/// Radial fade-out mask: 1.0 inside `fade_begin * radius`, tapering
/// linearly to 0.0 at `fade_end * radius`.
pub fn circle_with_fadeout_border(diameter: usize, fade_begin: f32, fade_end: f32) -> Array2<f32> {
    let mut mask = Array2::zeros((diameter, diameter));
    let radius = diameter as f32 / 2.0;

    for ((row, col), px) in mask.indexed_iter_mut() {
        let y_dist = radius - row as f32;
        let x_dist = radius - col as f32;
        let ratio = (x_dist * x_dist + y_dist * y_dist).sqrt() / radius;

        *px = if ratio <= fade_begin {
            1.0
        } else if ratio >= fade_end {
            0.0
        } else {
            1.0 - (ratio - fade_begin) / (fade_end - fade_begin)
        };
    }

    mask
}

/// Scratch buffers reused across every rendered view. Steady-state
/// rendering allocates nothing.
pub struct MvCache {
    /// Patch blending mask, `resized_patch_width` square.
    pub grad_blending_weight: Array2<f32>,
    pub render_canvas: Array2<f32>,
    pub weight_canvas: Array2<f32>,
    /// Working-resolution f32 copy of the channel being rendered.
    pub f32_chan: Array2<f32>,
    /// Extracted patch before resizing; sized for the largest possible
    /// patch, used as a sub-view.
    pub patch_scratch: Array2<f32>,
    pub resized: Array2<f32>,
    /// Cropped, normalized 8-bit canvas.
    pub normed: Array2<u8>,
    /// Per-channel render targets (pre-transpose orientation).
    pub chan_out: [Array2<u8>; 3],
}

impl MvCache {
    pub fn new(arrange: &Arrange, params: &MvParams) -> Self {
        let grad_blending_weight = circle_with_fadeout_border(
            params.resized_patch_width,
            GRADIENT_BLENDING_BEGIN,
            GRADIENT_BLENDING_END,
        );
        let rpw = params.resized_patch_width;
        let crop_h = params.crop_rows.len();
        let crop_w = params.crop_cols.len();
        // An inflated patch never exceeds the MI diameter.
        let max_patch_side = iround_usize(arrange.diameter()) + 2;

        let (out_h, out_w) = (params.output_height, params.output_width);
        let chan_out = [
            Array2::zeros((out_h, out_w)),
            Array2::zeros((out_h >> 1, out_w >> 1)),
            Array2::zeros((out_h >> 1, out_w >> 1)),
        ];

        Self {
            grad_blending_weight,
            render_canvas: Array2::zeros((params.canvas_height, params.canvas_width)),
            weight_canvas: Array2::zeros((params.canvas_height, params.canvas_width)),
            f32_chan: Array2::zeros((arrange.img_height(), arrange.img_width())),
            patch_scratch: Array2::zeros((max_patch_side, max_patch_side)),
            resized: Array2::zeros((rpw, rpw)),
            normed: Array2::zeros((crop_h, crop_w)),
            chan_out,
        }
    }
}

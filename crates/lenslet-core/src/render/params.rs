use std::ops::Range;

use crate::config::ConvertConfig;
use crate::consts::{CONTENT_SAFE_RATIO, PATCH_X_SHIFT_RATIO};
use crate::error::{LensletError, Result};
use crate::geometry::Arrange;
use crate::util::{iround_usize, round_to_even};

const SQRT3: f32 = 1.732_050_8;

/// Render parameters derived once from the lattice geometry and the
/// conversion config.
#[derive(Clone, Debug)]
pub struct MvParams {
    pub views: usize,
    pub psize_inflate: f32,
    /// Horizontal patch pitch on the canvas, in pixels.
    pub patch_x_shift: f32,
    /// Vertical patch pitch (hex row pitch) on the canvas.
    pub patch_y_shift: f32,
    /// Side of every pasted patch after resizing.
    pub resized_patch_width: usize,
    /// Shift between adjacent views, in working pixels.
    pub view_interval: f32,
    pub canvas_width: usize,
    pub canvas_height: usize,
    /// Canvas region kept after accumulation.
    pub crop_rows: Range<usize>,
    pub crop_cols: Range<usize>,
    /// Final per-view output size, before the direction transpose.
    pub output_width: usize,
    pub output_height: usize,
}

impl MvParams {
    pub fn new(arrange: &Arrange, cfg: &ConvertConfig) -> Result<Self> {
        if cfg.views == 0 {
            return Err(LensletError::InvalidParam("views must be at least 1".into()));
        }

        let safe_diameter = arrange.diameter() * CONTENT_SAFE_RATIO;
        let patch_x_shift = PATCH_X_SHIFT_RATIO * arrange.diameter();
        let patch_y_shift = patch_x_shift * SQRT3 / 2.0;
        let resized_patch_width = iround_usize(patch_x_shift * cfg.psize_inflate);

        let view_shift_range = safe_diameter * cfg.view_shift_range;
        let view_interval = if cfg.views > 1 {
            view_shift_range / (cfg.views - 1) as f32
        } else {
            0.0
        };

        let canvas_width =
            iround_usize(arrange.mi_max_cols() as f32 * patch_x_shift + resized_patch_width as f32);
        let canvas_height =
            iround_usize(arrange.mi_rows() as f32 * patch_y_shift + resized_patch_width as f32);

        let crop_start = (patch_x_shift * 1.5).ceil() as usize;
        let crop_col_end =
            (canvas_width as f32 - resized_patch_width as f32 - patch_x_shift / 2.0) as usize;
        let crop_row_end =
            (canvas_height as f32 - resized_patch_width as f32 - patch_x_shift / 2.0) as usize;
        if crop_col_end <= crop_start || crop_row_end <= crop_start {
            return Err(LensletError::InvalidParam(format!(
                "canvas {canvas_width}x{canvas_height} too small for the crop margins"
            )));
        }

        let upsample = arrange.upsample_factor() as f32;
        let output_width = round_to_even(iround_usize((crop_col_end - crop_start) as f32 / upsample));
        let output_height = round_to_even(iround_usize((crop_row_end - crop_start) as f32 / upsample));

        Ok(Self {
            views: cfg.views,
            psize_inflate: cfg.psize_inflate,
            patch_x_shift,
            patch_y_shift,
            resized_patch_width,
            view_interval,
            canvas_width,
            canvas_height,
            crop_rows: crop_start..crop_row_end,
            crop_cols: crop_start..crop_col_end,
            output_width,
            output_height,
        })
    }

    /// View shift applied to every patch center for view index `v`
    /// along one axis.
    pub fn view_shift(&self, v: usize) -> f32 {
        (v as f32 - (self.views / 2) as f32) * self.view_interval
    }
}

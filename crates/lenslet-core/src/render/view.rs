use ndarray::s;

use crate::cache::CommonCache;
use crate::config::ConvertConfig;
use crate::error::{LensletError, Result};
use crate::geometry::Arrange;
use crate::io::yuv::{YuvPlanarFrame, PLANES};
use crate::psize::bridge::PatchMergeBridge;

use super::cache::MvCache;
use super::params::MvParams;
use super::resize::{resize_bilinear_f32_into, resize_bilinear_u8_into};

/// Renders one multi-view image per requested view coordinate by tiling
/// per-MI patches onto a weighted canvas.
pub struct MvRenderer {
    arrange: Arrange,
    params: MvParams,
    cache: MvCache,
}

impl MvRenderer {
    pub fn new(arrange: Arrange, cfg: &ConvertConfig) -> Result<Self> {
        let params = MvParams::new(&arrange, cfg)?;
        let cache = MvCache::new(&arrange, &params);
        Ok(Self {
            arrange,
            params,
            cache,
        })
    }

    pub fn params(&self) -> &MvParams {
        &self.params
    }

    /// Per-view output size `(width, height)` in the destination frame
    /// orientation (transposed back when the lattice is transposed).
    pub fn output_size(&self) -> (usize, usize) {
        if self.arrange.direction() {
            (self.params.output_height, self.params.output_width)
        } else {
            (self.params.output_width, self.params.output_height)
        }
    }

    /// Render view `(view_row, view_col)` into `dst`.
    pub fn render_view(
        &mut self,
        common: &CommonCache,
        bridge: &PatchMergeBridge,
        dst: &mut YuvPlanarFrame,
        view_row: usize,
        view_col: usize,
    ) -> Result<()> {
        if view_row >= self.params.views || view_col >= self.params.views {
            return Err(LensletError::InvalidParam(format!(
                "view ({view_row}, {view_col}) outside the {0}x{0} grid",
                self.params.views
            )));
        }
        if dst.extent().depth() != 1 {
            return Err(LensletError::InvalidParam(
                "render target must be an 8-bit frame".into(),
            ));
        }
        for (chan, plane) in PLANES.into_iter().enumerate() {
            let (dst_h, dst_w) = dst.extent().plane_size(plane);
            let expected = if self.arrange.direction() {
                (dst_w, dst_h)
            } else {
                (dst_h, dst_w)
            };
            if self.cache.chan_out[chan].dim() != expected {
                return Err(LensletError::InvalidParam(format!(
                    "render target plane {plane:?} is {dst_w}x{dst_h}, expected output size {:?}",
                    self.output_size()
                )));
            }
        }

        for chan in 0..PLANES.len() {
            self.render_chan(common, bridge, chan, view_row, view_col);
        }

        for (chan, plane) in PLANES.into_iter().enumerate() {
            let rendered = &self.cache.chan_out[chan];
            if self.arrange.direction() {
                dst.plane_mut(plane).assign(&rendered.t());
            } else {
                dst.plane_mut(plane).assign(rendered);
            }
        }

        Ok(())
    }

    fn render_chan(
        &mut self,
        common: &CommonCache,
        bridge: &PatchMergeBridge,
        chan: usize,
        view_row: usize,
        view_col: usize,
    ) {
        let arrange = &self.arrange;
        let params = &self.params;
        let cache = &mut self.cache;
        let src = &common.srcs[chan];
        let rpw = params.resized_patch_width;
        let (img_h, img_w) = cache.f32_chan.dim();

        cache.render_canvas.fill(0.0);
        cache.weight_canvas.fill(0.0);
        cache.f32_chan.zip_mut_with(src, |d, &s| *d = s as f32);

        let view_shift_x = params.view_shift(view_col);
        let view_shift_y = params.view_shift(view_row);
        let max_side = cache.patch_scratch.nrows();

        for row in 0..arrange.mi_rows() {
            let dst_row = (row as f32 * params.patch_y_shift) as usize;
            let right_shift =
                (((row & 1) ^ arrange.is_out_shift() as usize) as f32) * (params.patch_x_shift / 2.0);

            for col in 0..arrange.mi_cols(row) {
                let center = arrange.mi_center(row, col);
                let psize = params.psize_inflate * bridge.patchsize(row, col);
                let side = (psize.round() as usize).clamp(2, max_side);

                let patch_cx = center.x + view_shift_x;
                let patch_cy = center.y + view_shift_y;
                let start_x = ((patch_cx - psize / 2.0).round() as i64)
                    .clamp(0, (img_w - side) as i64) as usize;
                let start_y = ((patch_cy - psize / 2.0).round() as i64)
                    .clamp(0, (img_h - side) as i64) as usize;

                // Kepler optics flip every micro-image, so the patch is
                // rotated 180 degrees while extracting.
                {
                    let mut patch = cache.patch_scratch.slice_mut(s![..side, ..side]);
                    if arrange.is_kepler() {
                        for r in 0..side {
                            for c in 0..side {
                                patch[[r, c]] = cache.f32_chan
                                    [[start_y + side - 1 - r, start_x + side - 1 - c]];
                            }
                        }
                    } else {
                        patch.assign(&cache.f32_chan.slice(s![
                            start_y..start_y + side,
                            start_x..start_x + side
                        ]));
                    }
                }

                resize_bilinear_f32_into(
                    cache.patch_scratch.slice(s![..side, ..side]),
                    cache.resized.view_mut(),
                );

                let dst_col = (col as f32 * params.patch_x_shift + right_shift) as usize;
                let weight = if arrange.is_multi_focus() {
                    bridge.weight(row, col)
                } else {
                    1.0
                };

                let mut render_roi = cache
                    .render_canvas
                    .slice_mut(s![dst_row..dst_row + rpw, dst_col..dst_col + rpw]);
                ndarray::azip!((acc in &mut render_roi, &px in &cache.resized, &g in &cache.grad_blending_weight) {
                    *acc += px * g * weight;
                });

                let mut weight_roi = cache
                    .weight_canvas
                    .slice_mut(s![dst_row..dst_row + rpw, dst_col..dst_col + rpw]);
                ndarray::azip!((acc in &mut weight_roi, &g in &cache.grad_blending_weight) {
                    *acc += g * weight;
                });
            }
        }

        // Normalize the cropped canvas; the epsilon guard keeps uncovered
        // pixels at zero instead of NaN.
        let cropped_render = cache
            .render_canvas
            .slice(s![params.crop_rows.clone(), params.crop_cols.clone()]);
        let cropped_weight = cache
            .weight_canvas
            .slice(s![params.crop_rows.clone(), params.crop_cols.clone()]);
        ndarray::azip!((out in &mut cache.normed, &num in &cropped_render, &den in &cropped_weight) {
            let val = num / den.max(f32::MIN_POSITIVE);
            *out = val.round().clamp(0.0, 255.0) as u8;
        });

        resize_bilinear_u8_into(cache.normed.view(), cache.chan_out[chan].view_mut());
    }
}

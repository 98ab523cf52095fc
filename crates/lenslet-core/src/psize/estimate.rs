use std::cmp::Ordering;

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;
use tracing::debug;

use crate::config::{ConvertConfig, MatchMetric};
use crate::consts::{
    CONTENT_SAFE_RATIO, LEN_TYPE_NUM, PARALLEL_MI_THRESHOLD, SSIM_SHORTCUT_THRESHOLD,
};
use crate::error::{LensletError, Result};
use crate::geometry::{Arrange, MiTypes, Point};
use crate::util::{iround_usize, sgn};

use super::bridge::{PatchInfo, PatchMergeBridge, INVALID_PSIZE};
use super::census::{compare_census, overlap_ranges, OverlapWindow};
use super::mibuffer::{central_crop, MiBuffers, MiView};
use super::neighbors::{FarNeighbors, NearNeighbors};
use super::ssim::ssim;

/// Patchsize search bounds, in working pixels.
#[derive(Clone, Copy, Debug)]
pub struct PsizeParams {
    pub min_psize: usize,
    pub max_psize: usize,
    /// Maximum dhash Hamming distance for the temporal shortcut.
    pub shortcut_threshold: u32,
}

impl PsizeParams {
    pub fn new(arrange: &Arrange, cfg: &ConvertConfig) -> Result<Self> {
        let safe_diameter = arrange.diameter() * CONTENT_SAFE_RATIO;
        let max_psize_ratio = (1.0 - cfg.view_shift_range) * CONTENT_SAFE_RATIO / cfg.psize_inflate;
        let min_psize = iround_usize(cfg.min_psize * arrange.diameter()).max(1);
        let max_psize = iround_usize(max_psize_ratio * safe_diameter);

        if min_psize >= max_psize {
            return Err(LensletError::InvalidParam(format!(
                "empty patchsize range [{min_psize}, {max_psize})"
            )));
        }

        Ok(Self {
            min_psize,
            max_psize,
            shortcut_threshold: cfg.psize_shortcut_threshold,
        })
    }
}

/// Assigns each MI the patchsize that best registers it with its hex
/// neighbors, with a one-frame temporal cache keyed by the MI dhash.
pub struct PsizeEstimator {
    arrange: Arrange,
    mitypes: MiTypes,
    mis: MiBuffers,
    prev_mis: MiBuffers,
    prev_infos: Vec<PatchInfo>,
    params: PsizeParams,
    metric: MatchMetric,
}

impl PsizeEstimator {
    pub fn new(arrange: &Arrange, cfg: &ConvertConfig) -> Result<Self> {
        let params = PsizeParams::new(arrange, cfg)?;
        let mis = MiBuffers::create(arrange)?;
        let prev_mis = MiBuffers::create(arrange)?;
        let prev_infos = vec![PatchInfo::default(); arrange.mi_rows() * arrange.mi_max_cols()];

        Ok(Self {
            arrange: arrange.clone(),
            mitypes: MiTypes::new(arrange.is_out_shift()),
            mis,
            prev_mis,
            prev_infos,
            params,
            metric: cfg.metric,
        })
    }

    pub fn params(&self) -> &PsizeParams {
        &self.params
    }

    /// Refresh the MI workspaces from the new Y plane and fill the bridge
    /// with this frame's patchsizes. Swaps the bridge's info vector with
    /// the kept previous-frame vector first, so the estimation reads
    /// frame N-1 and writes frame N.
    pub fn update_bridge(
        &mut self,
        src: ArrayView2<'_, u8>,
        bridge: &mut PatchMergeBridge,
    ) -> Result<()> {
        std::mem::swap(&mut self.mis, &mut self.prev_mis);
        bridge.swap_infos(&mut self.prev_infos);

        self.mis.update(src)?;

        let mi_num = self.arrange.mi_rows() * self.arrange.mi_max_cols();
        let infos = bridge.infos_mut();
        let this = &*self;
        if mi_num >= PARALLEL_MI_THRESHOLD {
            infos
                .par_iter_mut()
                .enumerate()
                .for_each(|(idx, info)| *info = this.estimate_slot(idx));
        } else {
            for (idx, info) in infos.iter_mut().enumerate() {
                *info = this.estimate_slot(idx);
            }
        }

        let inherited = infos.iter().filter(|i| i.inherited).count();
        debug!(inherited, total = mi_num, "patchsize pass done");

        if self.arrange.is_multi_focus() {
            self.adjust_multi_focus(bridge);
        }

        Ok(())
    }

    fn estimate_slot(&self, offset: usize) -> PatchInfo {
        let max_cols = self.arrange.mi_max_cols();
        let row = offset / max_cols;
        let col = offset % max_cols;
        if col >= self.arrange.mi_cols(row) {
            return PatchInfo::default();
        }

        let anchor = self.mis.get(offset);
        let prev = self.prev_infos[offset];

        if prev.psize != INVALID_PSIZE && self.shortcut_hit(offset, &anchor) {
            return PatchInfo {
                psize: prev.psize,
                inherited: true,
            };
        }

        let mi_type = self.mitypes.mi_type(row, col);
        let estimated = if self.arrange.is_multi_focus()
            && mi_type == self.arrange.near_focal_len_type()
        {
            // Near-focal MIs only share the far focal plane with the MIs
            // one further ring out.
            let neighbors = FarNeighbors::new(&self.arrange, row, col);
            self.estimate_over(
                &anchor,
                neighbors
                    .iter()
                    .map(|(dir, (r, c))| (r * max_cols + c, dir.unit_shift())),
            )
        } else {
            let neighbors = NearNeighbors::new(&self.arrange, row, col);
            self.estimate_over(
                &anchor,
                neighbors
                    .iter()
                    .map(|(dir, (r, c))| (r * max_cols + c, dir.unit_shift())),
            )
        };

        let psize = estimated.unwrap_or(if prev.psize != INVALID_PSIZE {
            prev.psize
        } else {
            self.params.min_psize as f32
        });

        PatchInfo {
            psize,
            inherited: false,
        }
    }

    fn shortcut_hit(&self, offset: usize, anchor: &MiView<'_>) -> bool {
        let prev_mi = self.prev_mis.get(offset);
        match self.metric {
            MatchMetric::Census => {
                let dhash_diff = (prev_mi.dhash ^ anchor.dhash).count_ones();
                dhash_diff <= self.params.shortcut_threshold
            }
            MatchMetric::Ssim => {
                let prev = to_f32(&central_crop(prev_mi.patch, prev_mi.side));
                let curr = to_f32(&central_crop(anchor.patch, anchor.side));
                ssim(&prev, &curr) >= SSIM_SHORTCUT_THRESHOLD
            }
        }
    }

    /// Best patchsize per valid direction, averaged over the set. Boundary
    /// MIs simply have fewer directions in the average.
    fn estimate_over(
        &self,
        anchor: &MiView<'_>,
        neighbors: impl Iterator<Item = (usize, Point)>,
    ) -> Option<f32> {
        let match_sign = -sgn(self.arrange.is_kepler());
        let mut sum_psize = 0.0f32;
        let mut count = 0usize;

        for (nb_offset, unit) in neighbors {
            let neighbor = self.mis.get(nb_offset);
            let step = unit * match_sign;
            sum_psize += self.search_best(anchor, &neighbor, step) as f32;
            count += 1;
        }

        (count > 0).then(|| sum_psize / count as f32)
    }

    fn search_best(&self, anchor: &MiView<'_>, neighbor: &MiView<'_>, step: Point) -> usize {
        match self.metric {
            MatchMetric::Census => {
                let mut best = self.params.min_psize;
                let mut best_ratio = f32::MAX;
                for psize in self.params.min_psize..self.params.max_psize {
                    let shift = step * psize as f32;
                    let ratio = compare_census(
                        anchor.census_map,
                        anchor.census_mask,
                        neighbor.census_map,
                        neighbor.census_mask,
                        anchor.side,
                        shift,
                    );
                    if ratio < best_ratio {
                        best_ratio = ratio;
                        best = psize;
                    }
                }
                best
            }
            MatchMetric::Ssim => {
                let mut best = self.params.min_psize;
                let mut best_ssim = f32::MIN;
                for psize in self.params.min_psize..self.params.max_psize {
                    let shift = step * psize as f32;
                    let offset = (shift.x.round() as i64, shift.y.round() as i64);
                    let Some((lhs, rhs)) = overlap_ranges(anchor.side, offset) else {
                        continue;
                    };
                    let lhs_win = window_f32(anchor.patch, anchor.side, lhs);
                    let rhs_win = window_f32(neighbor.patch, neighbor.side, rhs);
                    let metric = ssim(&lhs_win, &rhs_win);
                    if metric > best_ssim {
                        best_ssim = metric;
                        best = psize;
                    }
                }
                best
            }
        }
    }

    /// Multi-focus post-adjust: clip every type's patchsizes to the
    /// statistics of its most textured MIs, then smooth outliers from
    /// their neighbors. Render weights follow the gradient score.
    fn adjust_multi_focus(&self, bridge: &mut PatchMergeBridge) {
        let arrange = &self.arrange;
        let max_cols = arrange.mi_max_cols();
        let sample_size = ((arrange.mi_rows() * max_cols) / LEN_TYPE_NUM / 32).max(1);

        let mut samples: [Vec<(f32, f32)>; LEN_TYPE_NUM] = std::array::from_fn(|_| Vec::new());
        for row in 0..arrange.mi_rows() {
            for col in 0..arrange.mi_cols(row) {
                let mi = self.mis.get_at(row, col);
                bridge.set_weight(row, col, mi.grads + 0.01);
                let mi_type = self.mitypes.mi_type(row, col);
                samples[mi_type].push((mi.grads, bridge.patchsize(row, col)));
            }
        }

        let mut stats = [PsizeStats::default(); LEN_TYPE_NUM];
        for (mi_type, sample) in samples.iter_mut().enumerate() {
            sample.sort_unstable_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
            let mut acc = MeanStddev::default();
            for &(_, psize) in sample.iter().take(sample_size) {
                acc.update(psize);
            }
            stats[mi_type] = PsizeStats {
                mean: acc.mean(),
                stddev: acc.stddev(),
            };
        }

        for row in 0..arrange.mi_rows() {
            for col in 0..arrange.mi_cols(row) {
                let st = stats[self.mitypes.mi_type(row, col)];
                let psize = bridge.patchsize(row, col);
                if psize > st.max_psize() {
                    bridge.set_patchsize(row, col, st.max_psize());
                } else if psize < st.min_psize() {
                    bridge.set_patchsize(row, col, st.min_psize());
                }
            }
        }

        let near_type = arrange.near_focal_len_type();
        let near_stats = stats[near_type];
        let far_stats = stats[(near_type + 2) % LEN_TYPE_NUM];

        // Near-focal MIs surrounded by clearly larger patchsizes are blur
        // victims; pull them to the neighbor average.
        let raw: Vec<PatchInfo> = bridge.infos().to_vec();
        let threshold = near_stats.mean + 1.5 * near_stats.stddev;
        for row in 0..arrange.mi_rows() {
            for col in 0..arrange.mi_cols(row) {
                if self.mitypes.mi_type(row, col) != near_type {
                    continue;
                }
                let neighbors = NearNeighbors::new(arrange, row, col);
                let mut sum = 0.0f32;
                let mut count = 0usize;
                let mut satisfied = 0usize;
                for (_, (r, c)) in neighbors.iter() {
                    let nb_psize = raw[r * max_cols + c].psize;
                    if nb_psize > threshold {
                        satisfied += 1;
                    }
                    sum += nb_psize;
                    count += 1;
                }
                if count > 0 && satisfied >= 5 {
                    bridge.set_patchsize(row, col, sum / count as f32);
                }
            }
        }

        // Symmetric rule for the other types, judged against their
        // near-focal neighbors.
        let raw: Vec<PatchInfo> = bridge.infos().to_vec();
        let threshold = far_stats.mean - far_stats.stddev;
        for row in 0..arrange.mi_rows() {
            for col in 0..arrange.mi_cols(row) {
                if self.mitypes.mi_type(row, col) == near_type {
                    continue;
                }
                let neighbors = NearNeighbors::new(arrange, row, col);
                let mut sum = 0.0f32;
                let mut count = 0usize;
                let mut satisfied = 0usize;
                for (_, (r, c)) in neighbors.iter() {
                    if self.mitypes.mi_type(r, c) != near_type {
                        continue;
                    }
                    let nb_psize = raw[r * max_cols + c].psize;
                    if nb_psize < threshold {
                        satisfied += 1;
                    }
                    sum += nb_psize;
                    count += 1;
                }
                if count > 0 && satisfied >= 2 {
                    bridge.set_patchsize(row, col, sum / count as f32);
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct PsizeStats {
    mean: f32,
    stddev: f32,
}

impl PsizeStats {
    fn min_psize(self) -> f32 {
        self.mean - 2.0 * self.stddev
    }

    fn max_psize(self) -> f32 {
        self.mean + 2.0 * self.stddev
    }
}

/// Welford running mean and standard deviation.
#[derive(Clone, Copy, Debug, Default)]
struct MeanStddev {
    mean: f32,
    var_sum: f32,
    count: usize,
}

impl MeanStddev {
    fn update(&mut self, val: f32) {
        self.count += 1;
        let prev_mean = self.mean;
        self.mean += (val - prev_mean) / self.count as f32;
        self.var_sum += (val - self.mean) * (val - prev_mean);
    }

    fn mean(&self) -> f32 {
        self.mean
    }

    fn stddev(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        (self.var_sum / self.count as f32).sqrt()
    }
}

fn window_f32(patch: &[u8], side: usize, win: OverlapWindow) -> Array2<f32> {
    let mut out = Array2::zeros((win.rows, win.cols));
    for row in 0..win.rows {
        for col in 0..win.cols {
            out[[row, col]] = patch[(win.row_start + row) * side + win.col_start + col] as f32;
        }
    }
    out
}

fn to_f32(src: &Array2<u8>) -> Array2<f32> {
    src.mapv(|v| v as f32)
}

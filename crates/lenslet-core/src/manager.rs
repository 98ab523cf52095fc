use tracing::debug;

use crate::cache::CommonCache;
use crate::config::ConvertConfig;
use crate::error::Result;
use crate::geometry::Arrange;
use crate::io::yuv::{YuvPlanarExtent, YuvPlanarFrame};
use crate::psize::{PatchMergeBridge, PsizeEstimator};
use crate::render::MvRenderer;

/// Owns the whole per-frame pipeline: common cache, patchsize estimator,
/// patch-merge bridge and multi-view renderer. All working buffers are
/// allocated here once; steady-state frames reuse them.
pub struct Manager {
    arrange: Arrange,
    cache: CommonCache,
    estimator: PsizeEstimator,
    bridge: PatchMergeBridge,
    renderer: MvRenderer,
}

impl Manager {
    /// `arrange` must already be upsampled to the working resolution.
    pub fn new(arrange: Arrange, cfg: &ConvertConfig) -> Result<Self> {
        let src_extent = Self::src_extent_of(&arrange)?;
        let cache = CommonCache::new(&arrange, src_extent)?;
        let estimator = PsizeEstimator::new(&arrange, cfg)?;
        let bridge = PatchMergeBridge::new(&arrange);
        let renderer = MvRenderer::new(arrange.clone(), cfg)?;

        Ok(Self {
            arrange,
            cache,
            estimator,
            bridge,
            renderer,
        })
    }

    /// The extent expected from the input reader (raw orientation).
    pub fn src_extent(&self) -> Result<YuvPlanarExtent> {
        Self::src_extent_of(&self.arrange)
    }

    fn src_extent_of(arrange: &Arrange) -> Result<YuvPlanarExtent> {
        let upsample = arrange.upsample_factor();
        let (mut w, mut h) = (
            arrange.img_width() / upsample,
            arrange.img_height() / upsample,
        );
        if arrange.direction() {
            std::mem::swap(&mut w, &mut h);
        }
        YuvPlanarExtent::yuv420p_8bit(w, h)
    }

    /// Per-view output size `(width, height)` in output-file orientation.
    pub fn output_size(&self) -> (usize, usize) {
        self.renderer.output_size()
    }

    pub fn output_extent(&self) -> Result<YuvPlanarExtent> {
        let (w, h) = self.output_size();
        YuvPlanarExtent::yuv420p_8bit(w, h)
    }

    /// Ingest one source frame: refresh the plane cache, then re-estimate
    /// every MI patchsize (with the one-frame temporal cache).
    pub fn update(&mut self, src: &YuvPlanarFrame) -> Result<()> {
        self.cache.update(src)?;
        debug!("common cache refreshed");
        self.estimator
            .update_bridge(self.cache.working_y(), &mut self.bridge)
    }

    /// Render view `(view_row, view_col)` of the current frame into `dst`.
    pub fn render_into(
        &mut self,
        dst: &mut YuvPlanarFrame,
        view_row: usize,
        view_col: usize,
    ) -> Result<()> {
        self.renderer
            .render_view(&self.cache, &self.bridge, dst, view_row, view_col)
    }

    pub fn arrange(&self) -> &Arrange {
        &self.arrange
    }

    pub fn bridge(&self) -> &PatchMergeBridge {
        &self.bridge
    }
}

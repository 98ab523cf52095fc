use ndarray::{Array2, ArrayView2};

use crate::error::{LensletError, Result};
use crate::geometry::Arrange;
use crate::io::yuv::{YuvPlanarExtent, YuvPlanarFrame, PLANES};
use crate::render::resize::resize_bilinear_u8_into;

/// Per-frame plane cache: ingests the raw YUV planes, transposes them when
/// the lattice is transposed, and upsamples every channel to the working
/// resolution. All buffers are allocated once and refreshed in place.
pub struct CommonCache {
    direction: bool,
    src_extent: YuvPlanarExtent,
    /// Per-channel upsample factors to reach working resolution.
    factors: [usize; 3],
    /// Raw planes after the optional transpose.
    raw: [Array2<u8>; 3],
    /// Working-resolution planes, all at the full working size.
    pub srcs: [Array2<u8>; 3],
}

impl CommonCache {
    pub fn new(arrange: &Arrange, src_extent: YuvPlanarExtent) -> Result<Self> {
        if src_extent.depth() != 1 {
            return Err(LensletError::InvalidParam(format!(
                "the engine expects 8-bit input, got depth {}",
                src_extent.depth()
            )));
        }

        let upsample = arrange.upsample_factor();
        let working = (arrange.img_height(), arrange.img_width());
        let expected_raw = {
            let (h, w) = (working.0 / upsample, working.1 / upsample);
            if arrange.direction() {
                (w, h)
            } else {
                (h, w)
            }
        };
        if expected_raw != src_extent.plane_size(crate::io::Plane::Y) {
            let (h, w) = src_extent.plane_size(crate::io::Plane::Y);
            return Err(LensletError::InvalidParam(format!(
                "input Y plane is {w}x{h}, calibration expects {}x{}",
                expected_raw.1, expected_raw.0
            )));
        }

        let factors = [
            upsample,
            upsample << src_extent.u_shift(),
            upsample << src_extent.v_shift(),
        ];

        let mut raw = Vec::with_capacity(3);
        for plane in PLANES {
            let (h, w) = src_extent.plane_size(plane);
            let shape = if arrange.direction() { (w, h) } else { (h, w) };
            raw.push(Array2::zeros(shape));
        }

        Ok(Self {
            direction: arrange.direction(),
            src_extent,
            factors,
            raw: raw.try_into().expect("three planes"),
            srcs: [
                Array2::zeros(working),
                Array2::zeros(working),
                Array2::zeros(working),
            ],
        })
    }

    pub fn update(&mut self, src: &YuvPlanarFrame) -> Result<()> {
        if *src.extent() != self.src_extent {
            return Err(LensletError::InvalidParam(
                "frame extent does not match the cache".into(),
            ));
        }

        for (chan, plane) in PLANES.into_iter().enumerate() {
            let plane_view = src.plane(plane);
            if self.direction {
                self.raw[chan].assign(&plane_view.t());
            } else {
                self.raw[chan].assign(&plane_view);
            }

            if self.factors[chan] == 1 {
                self.srcs[chan].assign(&self.raw[chan]);
            } else {
                resize_bilinear_u8_into(self.raw[chan].view(), self.srcs[chan].view_mut());
            }
        }

        Ok(())
    }

    /// The upsampled Y plane at working resolution.
    pub fn working_y(&self) -> ArrayView2<'_, u8> {
        self.srcs[0].view()
    }
}

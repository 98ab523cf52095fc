use byteorder::{ByteOrder, LittleEndian};
use ndarray::{Array2, ArrayView2, ArrayViewMut2};

use crate::consts::SIMD_ALIGN;
use crate::error::{LensletError, Result};
use crate::util::align_up;

/// The three planes of a planar YUV frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plane {
    Y,
    U,
    V,
}

pub const PLANES: [Plane; 3] = [Plane::Y, Plane::U, Plane::V];

/// Shape of a planar YUV frame: Y plane dimensions, bytes per sample
/// (1 = 8 bit, 2 = 16 bit little-endian) and the chroma subsampling
/// shifts. `yuv420p_8bit` is the common case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YuvPlanarExtent {
    y_width: usize,
    y_height: usize,
    depth: usize,
    u_shift: usize,
    v_shift: usize,
}

impl YuvPlanarExtent {
    pub fn create(
        y_width: usize,
        y_height: usize,
        depth: usize,
        u_shift: usize,
        v_shift: usize,
    ) -> Result<Self> {
        if depth != 1 && depth != 2 {
            return Err(LensletError::InvalidParam(format!(
                "expect depth 1 (8 bit) or 2 (16 bit), got {depth}"
            )));
        }
        for (name, shift) in [("u", u_shift), ("v", v_shift)] {
            let divisor = 1usize << shift;
            if y_width % divisor != 0 || y_height % divisor != 0 {
                return Err(LensletError::InvalidParam(format!(
                    "Y size {y_width}x{y_height} must be divisible by the {name} divisor {divisor}"
                )));
            }
        }
        Ok(Self {
            y_width,
            y_height,
            depth,
            u_shift,
            v_shift,
        })
    }

    pub fn yuv420p_8bit(y_width: usize, y_height: usize) -> Result<Self> {
        Self::create(y_width, y_height, 1, 1, 1)
    }

    pub fn y_width(&self) -> usize {
        self.y_width
    }

    pub fn y_height(&self) -> usize {
        self.y_height
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn u_shift(&self) -> usize {
        self.u_shift
    }

    pub fn v_shift(&self) -> usize {
        self.v_shift
    }

    pub fn plane_size(&self, plane: Plane) -> (usize, usize) {
        match plane {
            Plane::Y => (self.y_height, self.y_width),
            Plane::U => (self.y_height >> self.u_shift, self.y_width >> self.u_shift),
            Plane::V => (self.y_height >> self.v_shift, self.y_width >> self.v_shift),
        }
    }

    pub fn plane_byte_size(&self, plane: Plane) -> usize {
        let (h, w) = self.plane_size(plane);
        h * w * self.depth
    }

    /// Bytes of one frame on disk (planes stored back to back).
    pub fn total_byte_size(&self) -> usize {
        PLANES.iter().map(|&p| self.plane_byte_size(p)).sum()
    }
}

/// One owned YUV frame. All three planes live in a single buffer with
/// plane offsets aligned for SIMD loads.
#[derive(Clone, Debug)]
pub struct YuvPlanarFrame {
    extent: YuvPlanarExtent,
    buf: Vec<u8>,
    offsets: [usize; 3],
}

impl YuvPlanarFrame {
    pub fn create(extent: YuvPlanarExtent) -> Result<Self> {
        let y_size = align_up(extent.plane_byte_size(Plane::Y), SIMD_ALIGN);
        let u_size = align_up(extent.plane_byte_size(Plane::U), SIMD_ALIGN);
        let v_size = align_up(extent.plane_byte_size(Plane::V), SIMD_ALIGN);
        let total = y_size + u_size + v_size;

        let mut buf = Vec::new();
        buf.try_reserve_exact(total)?;
        buf.resize(total, 0);

        Ok(Self {
            extent,
            buf,
            offsets: [0, y_size, y_size + u_size],
        })
    }

    pub fn extent(&self) -> &YuvPlanarExtent {
        &self.extent
    }

    fn plane_range(&self, plane: Plane) -> std::ops::Range<usize> {
        let idx = plane as usize;
        let start = self.offsets[idx];
        start..start + self.extent.plane_byte_size(plane)
    }

    pub fn plane_bytes(&self, plane: Plane) -> &[u8] {
        &self.buf[self.plane_range(plane)]
    }

    pub fn plane_bytes_mut(&mut self, plane: Plane) -> &mut [u8] {
        let range = self.plane_range(plane);
        &mut self.buf[range]
    }

    /// 2-D view of an 8-bit plane. Only meaningful for `depth == 1`.
    pub fn plane(&self, plane: Plane) -> ArrayView2<'_, u8> {
        debug_assert_eq!(self.extent.depth, 1);
        let shape = self.extent.plane_size(plane);
        ArrayView2::from_shape(shape, self.plane_bytes(plane)).expect("plane shape matches buffer")
    }

    pub fn plane_mut(&mut self, plane: Plane) -> ArrayViewMut2<'_, u8> {
        debug_assert_eq!(self.extent.depth, 1);
        let shape = self.extent.plane_size(plane);
        let range = self.plane_range(plane);
        ArrayViewMut2::from_shape(shape, &mut self.buf[range]).expect("plane shape matches buffer")
    }

    /// Decode a 16-bit little-endian plane. Only meaningful for
    /// `depth == 2`.
    pub fn plane_u16(&self, plane: Plane) -> Result<Array2<u16>> {
        if self.extent.depth != 2 {
            return Err(LensletError::InvalidParam(format!(
                "16-bit decode requires depth 2, got {}",
                self.extent.depth
            )));
        }
        let (h, w) = self.extent.plane_size(plane);
        let mut samples = vec![0u16; h * w];
        LittleEndian::read_u16_into(self.plane_bytes(plane), &mut samples);
        Ok(Array2::from_shape_vec((h, w), samples).expect("plane shape matches buffer"))
    }
}

use crate::config::ConfigMap;
use crate::error::{LensletError, Result};
use crate::util::sgn;

use super::Point;

const SQRT3: f32 = 1.732_050_8;

/// Variant-specific stride data of the MI lattice.
#[derive(Clone, Debug)]
enum Lattice {
    /// Derived from the four corner MI centers. Row strides are
    /// interpolated between the left and right image edges.
    Corners {
        left_top: Point,
        right_top: Point,
        left_y_unit_shift: Point,
        right_y_unit_shift: Point,
    },
    /// Derived from the central-MI offset and a uniform hex diameter.
    Offset {
        left_top: Point,
        x_unit_shift: f32,
        y_unit_shift: f32,
    },
}

/// Geometry descriptor of the micro-image lattice.
///
/// All coordinates are in working-image pixels; after `upsample(f)` every
/// length and position is scaled by `f`. When `direction` is set the
/// descriptor is stored in transposed axes, so `mi_center` already returns
/// transposed coordinates.
#[derive(Clone, Debug)]
pub struct Arrange {
    img_width: usize,
    img_height: usize,
    diameter: f32,
    radius: f32,
    direction: bool,
    upsample: usize,
    is_out_shift: bool,
    is_kepler: bool,
    is_multi_focus: bool,
    near_focal_len_type: usize,
    mi_rows: usize,
    mi_cols: [usize; 2],
    lattice: Lattice,
}

impl Arrange {
    /// Build from a parsed calibration map, selecting the lattice variant
    /// by key presence: `CentralMIOffsetX` marks an offset rig, the four
    /// corner keys a corners rig.
    pub fn from_cfg_map(map: &ConfigMap) -> Result<Self> {
        if map.contains("CentralMIOffsetX") {
            Self::offset_from_cfg_map(map)
        } else {
            Self::corners_from_cfg_map(map)
        }
    }

    pub fn corners_from_cfg_map(map: &ConfigMap) -> Result<Self> {
        let width = map.get::<usize>("LensletWidth")?;
        let height = map.get::<usize>("LensletHeight")?;
        let diameter = map.get::<f32>("MIDiameter")?;
        let direction = map.get_or::<u8>("MLADirection", 0)? != 0;
        let left_top = Point::new(
            map.get::<f32>("LeftTopMICenterX")?,
            map.get::<f32>("LeftTopMICenterY")?,
        );
        let right_top = Point::new(
            map.get::<f32>("RightTopMICenterX")?,
            map.get::<f32>("RightTopMICenterY")?,
        );
        let left_bottom = Point::new(
            map.get::<f32>("LeftBottomMICenterX")?,
            map.get::<f32>("LeftBottomMICenterY")?,
        );
        let right_bottom = Point::new(
            map.get::<f32>("RightBottomMICenterX")?,
            map.get::<f32>("RightBottomMICenterY")?,
        );
        let flags = PipelineFlags::from_cfg_map(map)?;

        Self::with_corners(
            (width, height),
            diameter,
            direction,
            left_top,
            right_top,
            left_bottom,
            right_bottom,
            flags,
        )
    }

    pub fn offset_from_cfg_map(map: &ConfigMap) -> Result<Self> {
        let width = map.get::<usize>("LensletWidth")?;
        let height = map.get::<usize>("LensletHeight")?;
        let diameter = map.get::<f32>("MIDiameter")?;
        let direction = map.get_or::<u8>("MLADirection", 0)? != 0;
        let offset = Point::new(
            map.get::<f32>("CentralMIOffsetX")?,
            map.get::<f32>("CentralMIOffsetY")?,
        );
        let flags = PipelineFlags::from_cfg_map(map)?;

        Self::with_offset((width, height), diameter, direction, offset, flags)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_corners(
        img_size: (usize, usize),
        diameter: f32,
        direction: bool,
        left_top: Point,
        mut right_top: Point,
        mut left_bottom: Point,
        right_bottom: Point,
        flags: PipelineFlags,
    ) -> Result<Self> {
        if diameter <= 0.0 {
            return Err(LensletError::InvalidParam(format!(
                "MI diameter must be positive, got {diameter}"
            )));
        }

        let (width, height) = img_size;
        if direction {
            // The calibration labels corners in the transposed (final)
            // orientation: the raw sensor's right-top corner is the
            // transposed lattice's left-bottom.
            std::mem::swap(&mut right_top, &mut left_bottom);
        }
        let top_x_shift = right_top - left_top;
        let top_cols = (top_x_shift.len() / diameter) as usize + 1;
        if top_cols < 2 {
            return Err(LensletError::InvalidParam(
                "corner calibration spans less than two MI columns".into(),
            ));
        }
        let top_x_unit_shift = top_x_shift * (1.0 / (top_cols - 1) as f32);

        let is_out_shift = left_top.x >= top_x_unit_shift.x;

        let mut mi_cols = [top_cols, top_cols];
        if is_out_shift {
            // The second row fits one more intact MI than the first.
            let mi_1_0_x = left_top.x - top_x_unit_shift.x / 2.0;
            if (mi_1_0_x + top_x_unit_shift.x * top_cols as f32) < width as f32 {
                mi_cols[1] += 1;
            }
        } else {
            // The second row fits one less intact MI than the first.
            let mi_1_0_x = left_top.x + top_x_unit_shift.x / 2.0;
            if (mi_1_0_x + top_x_unit_shift.x * top_cols as f32) >= width as f32 {
                mi_cols[1] -= 1;
            }
        }

        let left_y_shift = left_bottom - left_top;
        let approx_y_unit_shift = diameter * SQRT3 / 2.0;
        let left_y_rows = (left_y_shift.len() / approx_y_unit_shift) as usize + 1;
        if left_y_rows < 2 {
            return Err(LensletError::InvalidParam(
                "corner calibration spans less than two MI rows".into(),
            ));
        }
        let left_y_unit_shift = left_y_shift * (1.0 / (left_y_rows - 1) as f32);
        let mi_rows =
            ((height as f32 - diameter / 2.0 - left_top.y) / left_y_unit_shift.y) as usize + 1;

        let right_y_shift = right_bottom - right_top;
        let right_y_unit_shift = right_y_shift * (1.0 / (left_y_rows - 1) as f32);

        Ok(Self {
            img_width: width,
            img_height: height,
            diameter,
            radius: diameter / 2.0,
            direction,
            upsample: 1,
            is_out_shift,
            is_kepler: flags.is_kepler,
            is_multi_focus: flags.is_multi_focus,
            near_focal_len_type: flags.near_focal_len_type,
            mi_rows,
            mi_cols,
            lattice: Lattice::Corners {
                left_top,
                right_top,
                left_y_unit_shift,
                right_y_unit_shift,
            },
        })
    }

    pub fn with_offset(
        img_size: (usize, usize),
        diameter: f32,
        direction: bool,
        offset: Point,
        flags: PipelineFlags,
    ) -> Result<Self> {
        if diameter <= 0.0 {
            return Err(LensletError::InvalidParam(format!(
                "MI diameter must be positive, got {diameter}"
            )));
        }

        let radius = diameter / 2.0;
        let (mut width, mut height) = img_size;
        // The calibration offset is measured from the image center,
        // y pointing up.
        let mut center_mi = Point::new(
            width as f32 / 2.0 + offset.x,
            height as f32 / 2.0 - offset.y,
        );
        if direction {
            std::mem::swap(&mut width, &mut height);
            center_mi = center_mi.swapped();
        }

        let x_unit_shift = diameter;
        let y_unit_shift = diameter * SQRT3 / 2.0;
        let center_mi_x_idx = ((center_mi.x - radius) / x_unit_shift) as usize;
        let center_mi_y_idx = ((center_mi.y - radius) / y_unit_shift) as usize;

        let left_x = center_mi.x - x_unit_shift * center_mi_x_idx as f32;
        let (left_top_x, is_out_shift) = if center_mi_y_idx % 2 == 0 {
            (left_x, left_x > diameter)
        } else if left_x > diameter {
            (left_x - radius, false)
        } else {
            (left_x + radius, true)
        };
        let left_top_y =
            center_mi.y - ((center_mi.y - y_unit_shift / 2.0) / y_unit_shift).floor() * y_unit_shift;
        let left_top = Point::new(left_top_x, left_top_y);

        let mi_1_0_x = left_top.x - x_unit_shift / 2.0 * sgn(is_out_shift);
        let mi_cols = [
            ((width as f32 - left_top.x - x_unit_shift / 2.0) / x_unit_shift) as usize + 1,
            ((width as f32 - mi_1_0_x - x_unit_shift / 2.0) / x_unit_shift) as usize + 1,
        ];
        let mi_rows = ((height as f32 - left_top.y - y_unit_shift / 2.0) / y_unit_shift) as usize + 1;

        Ok(Self {
            img_width: width,
            img_height: height,
            diameter,
            radius,
            direction,
            upsample: 1,
            is_out_shift,
            is_kepler: flags.is_kepler,
            is_multi_focus: flags.is_multi_focus,
            near_focal_len_type: flags.near_focal_len_type,
            mi_rows,
            mi_cols,
            lattice: Lattice::Offset {
                left_top,
                x_unit_shift,
                y_unit_shift,
            },
        })
    }

    /// Scale the whole geometry by an integer factor.
    pub fn upsample(&mut self, factor: usize) {
        let f = factor as f32;
        self.img_width *= factor;
        self.img_height *= factor;
        self.diameter *= f;
        self.radius *= f;
        self.upsample = factor;
        match &mut self.lattice {
            Lattice::Corners {
                left_top,
                right_top,
                left_y_unit_shift,
                right_y_unit_shift,
            } => {
                *left_top = *left_top * f;
                *right_top = *right_top * f;
                *left_y_unit_shift = *left_y_unit_shift * f;
                *right_y_unit_shift = *right_y_unit_shift * f;
            }
            Lattice::Offset {
                left_top,
                x_unit_shift,
                y_unit_shift,
            } => {
                *left_top = *left_top * f;
                *x_unit_shift *= f;
                *y_unit_shift *= f;
            }
        }
    }

    /// Image-space center of the MI at `(row, col)`.
    pub fn mi_center(&self, row: usize, col: usize) -> Point {
        match &self.lattice {
            Lattice::Corners {
                left_top,
                right_top,
                left_y_unit_shift,
                right_y_unit_shift,
            } => {
                let left = *left_top + *left_y_unit_shift * row as f32;
                let right = *right_top + *right_y_unit_shift * row as f32;
                let x_unit_shift = (right - left) * (1.0 / (self.mi_cols[0] - 1) as f32);
                let mut center = left + x_unit_shift * col as f32;
                if row % 2 == 1 {
                    center = center - x_unit_shift * (0.5 * sgn(self.is_out_shift));
                }
                center
            }
            Lattice::Offset {
                left_top,
                x_unit_shift,
                y_unit_shift,
            } => {
                let mut x = left_top.x + x_unit_shift * col as f32;
                let y = left_top.y + y_unit_shift * row as f32;
                if row % 2 == 1 {
                    x -= x_unit_shift / 2.0 * sgn(self.is_out_shift);
                }
                Point::new(x, y)
            }
        }
    }

    pub fn img_width(&self) -> usize {
        self.img_width
    }

    pub fn img_height(&self) -> usize {
        self.img_height
    }

    pub fn diameter(&self) -> f32 {
        self.diameter
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn direction(&self) -> bool {
        self.direction
    }

    pub fn upsample_factor(&self) -> usize {
        self.upsample
    }

    pub fn mi_rows(&self) -> usize {
        self.mi_rows
    }

    pub fn mi_cols(&self, row: usize) -> usize {
        self.mi_cols[row % 2]
    }

    pub fn mi_max_cols(&self) -> usize {
        self.mi_cols[0].max(self.mi_cols[1])
    }

    pub fn mi_min_cols(&self) -> usize {
        self.mi_cols[0].min(self.mi_cols[1])
    }

    pub fn is_out_shift(&self) -> bool {
        self.is_out_shift
    }

    pub fn is_kepler(&self) -> bool {
        self.is_kepler
    }

    pub fn is_multi_focus(&self) -> bool {
        self.is_multi_focus
    }

    pub fn near_focal_len_type(&self) -> usize {
        self.near_focal_len_type
    }
}

/// Pipeline flags carried by the calibration file next to the lattice keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineFlags {
    pub is_kepler: bool,
    pub is_multi_focus: bool,
    pub near_focal_len_type: usize,
}

impl PipelineFlags {
    pub fn from_cfg_map(map: &ConfigMap) -> Result<Self> {
        let near_focal_len_type = map.get_or::<usize>("NearFocalLenType", 0)?;
        if near_focal_len_type >= crate::consts::LEN_TYPE_NUM {
            return Err(LensletError::InvalidParam(format!(
                "NearFocalLenType must be in 0..{}, got {near_focal_len_type}",
                crate::consts::LEN_TYPE_NUM
            )));
        }
        Ok(Self {
            is_kepler: map.get_or::<u8>("IsKepler", 0)? != 0,
            is_multi_focus: map.get_or::<u8>("IsMultiFocus", 0)? != 0,
            near_focal_len_type,
        })
    }
}

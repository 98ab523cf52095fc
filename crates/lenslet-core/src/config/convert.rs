use std::fmt;

use serde::{Deserialize, Serialize};

/// Matching metric used by the patchsize estimator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MatchMetric {
    /// 24-bit census transform + masked Hamming distance.
    #[default]
    Census,
    /// Gaussian-windowed SSIM on the grayscale crops.
    Ssim,
}

impl fmt::Display for MatchMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMetric::Census => write!(f, "Census"),
            MatchMetric::Ssim => write!(f, "SSIM"),
        }
    }
}

/// Conversion parameters shared by the patchsize estimator and the
/// multi-view renderer. Defaults match the CLI defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// V in the V x V output view grid.
    pub views: usize,
    /// Integer scale applied to the raw input before any processing.
    pub upsample: usize,
    /// Scale applied to the estimated patchsize during extraction.
    pub psize_inflate: f32,
    /// Fraction of the MI diameter reserved for view shifting.
    pub view_shift_range: f32,
    /// Lower bound on the patchsize, as a fraction of the MI diameter.
    pub min_psize: f32,
    /// Maximum dhash Hamming distance for the temporal shortcut.
    pub psize_shortcut_threshold: u32,
    #[serde(default)]
    pub metric: MatchMetric,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            views: 1,
            upsample: 1,
            psize_inflate: 2.15,
            view_shift_range: 0.1,
            min_psize: 0.2,
            psize_shortcut_threshold: 4,
            metric: MatchMetric::default(),
        }
    }
}

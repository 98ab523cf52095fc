/// Fraction of the MI diameter that the census/matching window may cover.
/// Keeps the 5x5 transform window inside the micro-image circle.
pub const CENSUS_SAFE_RATIO: f32 = 0.9;

/// Fraction of the MI diameter holding usable image content.
pub const CONTENT_SAFE_RATIO: f32 = 0.9;

/// Radial fade-out of the patch blending mask starts at r/R = begin
/// and reaches zero at r/R = end.
pub const GRADIENT_BLENDING_BEGIN: f32 = 0.25;
pub const GRADIENT_BLENDING_END: f32 = 1.0;

/// Horizontal patch pitch on the render canvas, as a fraction of the
/// MI diameter.
pub const PATCH_X_SHIFT_RATIO: f32 = 0.37;

/// SSIM floor for the temporal shortcut when matching with SSIM.
pub const SSIM_SHORTCUT_THRESHOLD: f32 = 0.85;

/// Number of interleaved lens types in a multi-focus MLA.
pub const LEN_TYPE_NUM: usize = 3;

/// Alignment of per-plane and per-MI buffer strides, in bytes.
pub const SIMD_ALIGN: usize = 16;

/// Minimum MI count to use MI-level Rayon parallelism.
pub const PARALLEL_MI_THRESHOLD: usize = 64;

pub mod census;
pub mod ssim;
pub mod mibuffer;
pub mod neighbors;
pub mod bridge;
pub mod estimate;

pub use bridge::{PatchInfo, PatchMergeBridge};
pub use estimate::{PsizeEstimator, PsizeParams};
pub use mibuffer::MiBuffers;

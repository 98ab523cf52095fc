#![allow(dead_code)]

use ndarray::Array2;

use lenslet_core::geometry::arrange::PipelineFlags;
use lenslet_core::geometry::{Arrange, Point};

/// Working image size of the synthetic offset rig.
pub const IMG_W: usize = 320;
pub const IMG_H: usize = 208;
pub const DIAMETER: f32 = 20.0;

/// A small offset-lattice rig: 11 MI rows, 15 MI columns.
pub fn small_offset_arrange(flags: PipelineFlags) -> Arrange {
    Arrange::with_offset(
        (IMG_W, IMG_H),
        DIAMETER,
        false,
        Point::new(0.0, 0.0),
        flags,
    )
    .unwrap()
}

/// Deterministic noise plane with strong local contrast.
pub fn noise_plane(seed: u32) -> Array2<u8> {
    let mut state = seed;
    Array2::from_shape_fn((IMG_H, IMG_W), |_| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (state >> 24) as u8
    })
}

/// Noise on the left half, flat gray on the right half.
pub fn half_textured_plane(seed: u32) -> Array2<u8> {
    let noise = noise_plane(seed);
    Array2::from_shape_fn((IMG_H, IMG_W), |(row, col)| {
        if col < IMG_W / 2 {
            noise[[row, col]]
        } else {
            128
        }
    })
}

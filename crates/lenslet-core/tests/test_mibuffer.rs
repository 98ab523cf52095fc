mod common;

use lenslet_core::geometry::arrange::PipelineFlags;
use lenslet_core::psize::mibuffer::{compute_grads, dhash};
use lenslet_core::psize::MiBuffers;
use ndarray::Array2;

use common::{half_textured_plane, noise_plane, small_offset_arrange};

#[test]
fn test_update_fills_every_mi() {
    let arrange = small_offset_arrange(PipelineFlags::default());
    let mut mis = MiBuffers::create(&arrange).unwrap();
    mis.update(noise_plane(1).view()).unwrap();

    for row in 0..arrange.mi_rows() {
        for col in 0..arrange.mi_cols(row) {
            let mi = mis.get_at(row, col);
            assert!(mi.side > 0);
            assert!(mi.grads > 0.0, "noise must have gradient at ({row}, {col})");
            let map_bits: u32 = mi.census_map.iter().map(|b| b.count_ones()).sum();
            assert!(map_bits > 0, "noise census map cannot be empty");
        }
    }
}

#[test]
fn test_working_side_is_safe_fraction_of_diameter() {
    let arrange = small_offset_arrange(PipelineFlags::default());
    let mis = MiBuffers::create(&arrange).unwrap();
    // 0.9 * 20 px
    assert_eq!(mis.params().side, 18);
}

#[test]
fn test_dhash_is_16_bits() {
    let textured = noise_plane(7);
    let hash = dhash(textured.view());
    assert!(hash.count_ones() <= 16);

    let flat = Array2::<u8>::from_elem((20, 20), 90);
    assert_eq!(dhash(flat.view()), 0, "flat content has no rising edges");
}

#[test]
fn test_dhash_stable_across_identical_frames() {
    let arrange = small_offset_arrange(PipelineFlags::default());
    let plane = noise_plane(3);

    let mut a = MiBuffers::create(&arrange).unwrap();
    let mut b = MiBuffers::create(&arrange).unwrap();
    a.update(plane.view()).unwrap();
    b.update(plane.view()).unwrap();

    for row in 0..arrange.mi_rows() {
        for col in 0..arrange.mi_cols(row) {
            assert_eq!(a.get_at(row, col).dhash, b.get_at(row, col).dhash);
        }
    }
}

#[test]
fn test_grads_orders_texture_above_flat() {
    let flat = Array2::<u8>::from_elem((16, 16), 100);
    let mut step = Array2::<u8>::zeros((16, 16));
    for ((_, col), px) in step.indexed_iter_mut() {
        *px = if col < 8 { 0 } else { 255 };
    }

    assert_eq!(compute_grads(flat.view()), 0.0);
    assert!(compute_grads(step.view()) > 50.0);
}

#[test]
fn test_grads_reflect_scene_texture() {
    let arrange = small_offset_arrange(PipelineFlags::default());
    let mut mis = MiBuffers::create(&arrange).unwrap();
    mis.update(half_textured_plane(5).view()).unwrap();

    // Leftmost column is noisy, rightmost is flat gray.
    let left = mis.get_at(5, 0).grads;
    let right = mis.get_at(5, arrange.mi_cols(5) - 1).grads;
    assert!(
        left > right,
        "textured MI ({left}) must out-score flat MI ({right})"
    );
}

mod common;

use lenslet_core::config::ConvertConfig;
use lenslet_core::geometry::arrange::PipelineFlags;
use lenslet_core::io::{Plane, YuvPlanarFrame};
use lenslet_core::manager::Manager;
use lenslet_core::render::cache::circle_with_fadeout_border;
use lenslet_core::render::MvParams;

use common::{noise_plane, small_offset_arrange, IMG_H, IMG_W};

fn noise_frame(manager: &Manager, seed: u32) -> YuvPlanarFrame {
    let extent = manager.src_extent().unwrap();
    let mut frame = YuvPlanarFrame::create(extent).unwrap();
    let y = noise_plane(seed);
    frame
        .plane_bytes_mut(Plane::Y)
        .copy_from_slice(y.as_slice().unwrap());
    frame.plane_bytes_mut(Plane::U).fill(128);
    frame.plane_bytes_mut(Plane::V).fill(128);
    frame
}

#[test]
fn test_fadeout_mask_shape() {
    let mask = circle_with_fadeout_border(16, 0.25, 1.0);

    assert_eq!(mask[[8, 8]], 1.0, "mask center is fully opaque");
    assert_eq!(mask[[0, 0]], 0.0, "mask corner is fully transparent");

    // Monotone non-increasing along the radius.
    let mut prev = f32::MAX;
    for col in 8..16 {
        let val = mask[[8, col]];
        assert!(val <= prev, "fade must not increase outward");
        prev = val;
    }

    for &v in mask.iter() {
        assert!((0.0..=1.0).contains(&v));
    }
}

#[test]
fn test_mv_params_derivation() {
    let arrange = small_offset_arrange(PipelineFlags::default());
    let cfg = ConvertConfig::default();
    let params = MvParams::new(&arrange, &cfg).unwrap();

    // patch pitch: 0.37 * diameter, hex vertical pitch sqrt(3)/2 of that.
    approx::assert_abs_diff_eq!(params.patch_x_shift, 7.4, epsilon = 1e-3);
    approx::assert_abs_diff_eq!(params.patch_y_shift, 7.4 * 0.866_025_4, epsilon = 1e-3);
    assert_eq!(params.resized_patch_width, 16);

    assert_eq!(params.output_width % 2, 0);
    assert_eq!(params.output_height % 2, 0);
    assert!(params.crop_cols.end <= params.canvas_width);
    assert!(params.crop_rows.end <= params.canvas_height);

    // Single view renders with zero view shift.
    assert_eq!(params.view_interval, 0.0);
    assert_eq!(params.view_shift(0), 0.0);
}

#[test]
fn test_view_grid_center_has_zero_shift() {
    let arrange = small_offset_arrange(PipelineFlags::default());
    let cfg = ConvertConfig {
        views: 3,
        ..ConvertConfig::default()
    };
    let params = MvParams::new(&arrange, &cfg).unwrap();

    assert!(params.view_interval > 0.0);
    assert_eq!(params.view_shift(1), 0.0, "center view must not shift");
    assert_eq!(params.view_shift(0), -params.view_interval);
    assert_eq!(params.view_shift(2), params.view_interval);
}

#[test]
fn test_render_is_deterministic() {
    let arrange = small_offset_arrange(PipelineFlags::default());
    let cfg = ConvertConfig::default();
    let mut manager = Manager::new(arrange, &cfg).unwrap();

    let src = noise_frame(&manager, 11);
    manager.update(&src).unwrap();

    let extent = manager.output_extent().unwrap();
    let mut first = YuvPlanarFrame::create(extent).unwrap();
    let mut second = YuvPlanarFrame::create(extent).unwrap();
    manager.render_into(&mut first, 0, 0).unwrap();
    manager.render_into(&mut second, 0, 0).unwrap();

    for plane in [Plane::Y, Plane::U, Plane::V] {
        assert_eq!(
            first.plane_bytes(plane),
            second.plane_bytes(plane),
            "repeated render of the same view must be bit identical"
        );
    }
}

#[test]
fn test_single_view_output_size() {
    let arrange = small_offset_arrange(PipelineFlags::default());
    let cfg = ConvertConfig::default();
    let mut manager = Manager::new(arrange, &cfg).unwrap();

    let src = noise_frame(&manager, 12);
    manager.update(&src).unwrap();

    let (out_w, out_h) = manager.output_size();
    assert!(out_w > 0 && out_h > 0);
    assert!(out_w < IMG_W && out_h < IMG_H);

    let mut dst = YuvPlanarFrame::create(manager.output_extent().unwrap()).unwrap();
    manager.render_into(&mut dst, 0, 0).unwrap();

    // A noise source with mid-gray chroma renders mid-gray chroma.
    let u = dst.plane(Plane::U);
    for &v in u.iter() {
        assert!((v as i32 - 128).abs() <= 2, "chroma drifted to {v}");
    }
}

#[test]
fn test_out_of_grid_view_is_rejected() {
    let arrange = small_offset_arrange(PipelineFlags::default());
    let cfg = ConvertConfig::default();
    let mut manager = Manager::new(arrange, &cfg).unwrap();

    let src = noise_frame(&manager, 13);
    manager.update(&src).unwrap();

    let mut dst = YuvPlanarFrame::create(manager.output_extent().unwrap()).unwrap();
    assert!(manager.render_into(&mut dst, 0, 1).is_err());
}

#[test]
fn test_view_grid_renders_every_view() {
    let arrange = small_offset_arrange(PipelineFlags::default());
    let cfg = ConvertConfig {
        views: 3,
        ..ConvertConfig::default()
    };
    let mut manager = Manager::new(arrange, &cfg).unwrap();

    let src = noise_frame(&manager, 14);
    manager.update(&src).unwrap();

    let extent = manager.output_extent().unwrap();
    let mut dst = YuvPlanarFrame::create(extent).unwrap();
    for view_row in 0..3 {
        for view_col in 0..3 {
            manager.render_into(&mut dst, view_row, view_col).unwrap();
        }
    }
}

use lenslet_core::config::ConfigMap;
use lenslet_core::geometry::Arrange;

const TSPC_CFG: &str = "\
# TSPC rig, transposed lattice
IsKepler: 1
LensletWidth: 3068
LensletHeight: 4080
MIDiameter: 70
MLADirection: 1
LeftTopMICenterX: 38.25
LeftTopMICenterY: 37.5
RightTopMICenterX: 38.25
RightTopMICenterY: 4017.5
LeftBottomMICenterX: 3030.75
LeftBottomMICenterY: 37.5
RightBottomMICenterX: 3030.75
RightBottomMICenterY: 4017.5
";

const RAYTRIX_CFG: &str = "\
IsMultiFocus: 1
LensletWidth: 6464
LensletHeight: 4852
MIDiameter: 37.154060363770
MLADirection: 0
CentralMIOffsetX: 11.64
CentralMIOffsetY: 8.72
";

fn assert_near(actual: f32, expected: f32, eps: f32, what: &str) {
    assert!(
        (actual - expected).abs() <= eps,
        "{what}: expected {expected} +- {eps}, got {actual}"
    );
}

#[test]
fn test_corners_arrange_geometry() {
    let map = ConfigMap::from_reader(TSPC_CFG.as_bytes()).unwrap();
    let arrange = Arrange::from_cfg_map(&map).unwrap();

    assert!((arrange.diameter() - 70.0).abs() < 0.01);
    assert!((arrange.radius() - 35.0).abs() < 0.01);
    assert!(arrange.direction());
    assert!(arrange.is_kepler());
    assert!(!arrange.is_multi_focus());

    // Discrete lattice counts are exact.
    assert_eq!(arrange.mi_rows(), 66);
    assert_eq!(arrange.mi_min_cols(), 42);

    // Centers land on the expected lattice sites (70 px pitch).
    let c00 = arrange.mi_center(0, 0);
    assert_near(c00.x, 37.5, 2.0, "center(0,0).x");
    assert_near(c00.y, 38.25, 2.0, "center(0,0).y");
    let c10 = arrange.mi_center(1, 0);
    assert_near(c10.x, 73.3, 2.0, "center(1,0).x");
    assert_near(c10.y, 99.2, 2.0, "center(1,0).y");
    let c01 = arrange.mi_center(0, 1);
    assert_near(c01.x, 108.0, 2.0, "center(0,1).x");
    assert_near(c01.y, 38.2, 2.0, "center(0,1).y");
}

#[test]
fn test_offset_arrange_geometry() {
    let map = ConfigMap::from_reader(RAYTRIX_CFG.as_bytes()).unwrap();
    let arrange = Arrange::from_cfg_map(&map).unwrap();

    assert_eq!(arrange.img_width(), 6464);
    assert_eq!(arrange.img_height(), 4852);
    assert!(!arrange.direction());
    assert!(arrange.is_multi_focus());
    assert!(arrange.is_out_shift());

    assert_eq!(arrange.mi_rows(), 150);
    assert_eq!(arrange.mi_min_cols(), 173);

    let c00 = arrange.mi_center(0, 0);
    assert_near(c00.x, 48.4, 0.1, "center(0,0).x");
    assert_near(c00.y, 36.3, 0.1, "center(0,0).y");
    let c10 = arrange.mi_center(1, 0);
    assert_near(c10.x, 29.8, 0.1, "center(1,0).x");
    assert_near(c10.y, 68.4, 0.1, "center(1,0).y");
    let c01 = arrange.mi_center(0, 1);
    assert_near(c01.x, 85.5, 0.1, "center(0,1).x");
    assert_near(c01.y, 36.3, 0.1, "center(0,1).y");
}

#[test]
fn test_upsample_identity() {
    let map = ConfigMap::from_reader(RAYTRIX_CFG.as_bytes()).unwrap();
    let reference = Arrange::from_cfg_map(&map).unwrap();
    let mut arrange = Arrange::from_cfg_map(&map).unwrap();
    arrange.upsample(1);

    assert_eq!(arrange.img_width(), reference.img_width());
    assert_eq!(arrange.img_height(), reference.img_height());
    assert_eq!(arrange.mi_rows(), reference.mi_rows());
    for row in [0usize, 1] {
        for col in [0usize, 1, 7] {
            let a = arrange.mi_center(row, col);
            let b = reference.mi_center(row, col);
            assert_eq!(a, b, "upsample(1) must not move center ({row}, {col})");
        }
    }
}

#[test]
fn test_upsample_scales_geometry() {
    let map = ConfigMap::from_reader(RAYTRIX_CFG.as_bytes()).unwrap();
    let reference = Arrange::from_cfg_map(&map).unwrap();
    let mut arrange = Arrange::from_cfg_map(&map).unwrap();
    arrange.upsample(2);

    assert_eq!(arrange.img_width(), reference.img_width() * 2);
    assert_eq!(arrange.upsample_factor(), 2);
    assert!((arrange.diameter() - reference.diameter() * 2.0).abs() < 1e-3);

    let a = arrange.mi_center(3, 5);
    let b = reference.mi_center(3, 5);
    assert_near(a.x, b.x * 2.0, 1e-2, "scaled center x");
    assert_near(a.y, b.y * 2.0, 1e-2, "scaled center y");
}

#[test]
fn test_centers_inside_image() {
    for cfg in [TSPC_CFG, RAYTRIX_CFG] {
        let map = ConfigMap::from_reader(cfg.as_bytes()).unwrap();
        let arrange = Arrange::from_cfg_map(&map).unwrap();
        let (w, h) = (arrange.img_width() as f32, arrange.img_height() as f32);

        for row in 0..arrange.mi_rows() {
            for col in 0..arrange.mi_cols(row) {
                let c = arrange.mi_center(row, col);
                assert!(
                    c.x > 0.0 && c.x < w && c.y > 0.0 && c.y < h,
                    "center ({row}, {col}) = ({}, {}) outside {w}x{h}",
                    c.x,
                    c.y
                );
            }
        }
    }
}

#[test]
fn test_hex_row_col_counts_differ_by_at_most_one() {
    for cfg in [TSPC_CFG, RAYTRIX_CFG] {
        let map = ConfigMap::from_reader(cfg.as_bytes()).unwrap();
        let arrange = Arrange::from_cfg_map(&map).unwrap();
        let diff = arrange.mi_max_cols() as i64 - arrange.mi_min_cols() as i64;
        assert!(diff <= 1, "column counts differ by {diff}");
    }
}

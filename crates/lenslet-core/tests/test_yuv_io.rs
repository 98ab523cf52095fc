use lenslet_core::error::LensletError;
use lenslet_core::io::{Plane, YuvPlanarExtent, YuvPlanarFrame, YuvReader, YuvWriter};

fn fill_pattern(frame: &mut YuvPlanarFrame, seed: u8) {
    for plane in [Plane::Y, Plane::U, Plane::V] {
        for (i, byte) in frame.plane_bytes_mut(plane).iter_mut().enumerate() {
            *byte = seed.wrapping_add(i as u8);
        }
    }
}

#[test]
fn test_extent_validates_subsampling() {
    assert!(YuvPlanarExtent::yuv420p_8bit(64, 48).is_ok());
    assert!(matches!(
        YuvPlanarExtent::yuv420p_8bit(65, 48),
        Err(LensletError::InvalidParam(_))
    ));
    assert!(matches!(
        YuvPlanarExtent::yuv420p_8bit(64, 47),
        Err(LensletError::InvalidParam(_))
    ));
    assert!(matches!(
        YuvPlanarExtent::create(64, 48, 3, 1, 1),
        Err(LensletError::InvalidParam(_))
    ));
}

#[test]
fn test_extent_plane_sizes() {
    let extent = YuvPlanarExtent::yuv420p_8bit(64, 48).unwrap();
    assert_eq!(extent.plane_size(Plane::Y), (48, 64));
    assert_eq!(extent.plane_size(Plane::U), (24, 32));
    assert_eq!(extent.plane_size(Plane::V), (24, 32));
    assert_eq!(extent.total_byte_size(), 64 * 48 * 3 / 2);
}

#[test]
fn test_write_read_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.yuv");
    let extent = YuvPlanarExtent::yuv420p_8bit(32, 16).unwrap();

    let mut writer = YuvWriter::create(&path).unwrap();
    let mut frames = Vec::new();
    for seed in [1u8, 2, 3] {
        let mut frame = YuvPlanarFrame::create(extent).unwrap();
        fill_pattern(&mut frame, seed);
        writer.write(&frame).unwrap();
        frames.push(frame);
    }
    writer.finalize().unwrap();

    let mut reader = YuvReader::open(&path, extent).unwrap();
    assert_eq!(reader.frame_count(), 3);

    let mut read = YuvPlanarFrame::create(extent).unwrap();
    for expected in &frames {
        reader.read_into(&mut read).unwrap();
        for plane in [Plane::Y, Plane::U, Plane::V] {
            assert_eq!(read.plane_bytes(plane), expected.plane_bytes(plane));
        }
    }
}

#[test]
fn test_reader_skip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.yuv");
    let extent = YuvPlanarExtent::yuv420p_8bit(32, 16).unwrap();

    let mut writer = YuvWriter::create(&path).unwrap();
    for seed in [10u8, 20, 30] {
        let mut frame = YuvPlanarFrame::create(extent).unwrap();
        fill_pattern(&mut frame, seed);
        writer.write(&frame).unwrap();
    }
    writer.finalize().unwrap();

    let mut reader = YuvReader::open(&path, extent).unwrap();
    reader.skip(2);

    let mut frame = YuvPlanarFrame::create(extent).unwrap();
    reader.read_into(&mut frame).unwrap();
    assert_eq!(frame.plane_bytes(Plane::Y)[0], 30);

    // Past the last frame the reader reports a file system error.
    assert!(matches!(
        reader.read_into(&mut frame),
        Err(LensletError::FileSys(_))
    ));
}

#[test]
fn test_reader_rejects_truncated_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.yuv");
    std::fs::write(&path, vec![0u8; 100]).unwrap();

    let extent = YuvPlanarExtent::yuv420p_8bit(32, 16).unwrap();
    assert!(YuvReader::open(&path, extent).is_err());
}

#[test]
fn test_reader_rejects_mismatched_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.yuv");
    let extent = YuvPlanarExtent::yuv420p_8bit(32, 16).unwrap();

    let mut writer = YuvWriter::create(&path).unwrap();
    let frame = YuvPlanarFrame::create(extent).unwrap();
    writer.write(&frame).unwrap();
    writer.finalize().unwrap();

    let other = YuvPlanarExtent::yuv420p_8bit(16, 8).unwrap();
    let mut wrong = YuvPlanarFrame::create(other).unwrap();
    let mut reader = YuvReader::open(&path, extent).unwrap();
    assert!(matches!(
        reader.read_into(&mut wrong),
        Err(LensletError::InvalidParam(_))
    ));
}

#[test]
fn test_16bit_plane_decode() {
    let extent = YuvPlanarExtent::create(4, 2, 2, 1, 1).unwrap();
    let mut frame = YuvPlanarFrame::create(extent).unwrap();

    let samples: [u16; 8] = [0, 1, 256, 1023, 4095, 65535, 7, 512];
    for (i, s) in samples.iter().enumerate() {
        let bytes = s.to_le_bytes();
        frame.plane_bytes_mut(Plane::Y)[i * 2] = bytes[0];
        frame.plane_bytes_mut(Plane::Y)[i * 2 + 1] = bytes[1];
    }

    let decoded = frame.plane_u16(Plane::Y).unwrap();
    assert_eq!(decoded.dim(), (2, 4));
    assert_eq!(decoded[[0, 3]], 1023);
    assert_eq!(decoded[[1, 1]], 65535);

    // 8-bit frames refuse the 16-bit decode path.
    let frame8 = YuvPlanarFrame::create(YuvPlanarExtent::yuv420p_8bit(4, 2).unwrap()).unwrap();
    assert!(frame8.plane_u16(Plane::Y).is_err());
}

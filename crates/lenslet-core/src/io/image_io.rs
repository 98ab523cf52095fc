use std::path::Path;

use image::{GrayImage, ImageFormat, Luma};
use ndarray::ArrayView2;

use crate::error::Result;

/// Save an 8-bit plane as grayscale PNG (view preview export).
pub fn save_gray_png(plane: ArrayView2<'_, u8>, path: &Path) -> Result<()> {
    let (h, w) = plane.dim();
    let mut img = GrayImage::new(w as u32, h as u32);
    for ((row, col), &val) in plane.indexed_iter() {
        img.put_pixel(col as u32, row as u32, Luma([val]));
    }
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
